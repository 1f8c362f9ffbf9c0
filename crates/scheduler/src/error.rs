use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("invalid watch spec: {0}")]
    InvalidSpec(String),
}

