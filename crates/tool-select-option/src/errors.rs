use host_dom::DomError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectError {
    #[error("tool disabled by policy")]
    Disabled,
    #[error("no select control in field group")]
    ControlMissing,
    #[error("field disabled")]
    DisabledField,
    #[error("option not found for target")]
    OptionMissing,
    #[error("invalid selection target: {0}")]
    InvalidTarget(String),
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}

