//! Error types for field location

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// No strategy produced a group for the pattern.
    #[error("no field group labelled /{0}/")]
    NotFound(String),

    /// The group was found but holds no control of the expected shape.
    #[error("field group for /{pattern}/ has no {control}")]
    ControlMissing { pattern: String, control: String },

    #[error("strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },
}

impl LocatorError {
    /// Missing DOM may still render later; strategy failures will not fix
    /// themselves.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LocatorError::NotFound(_) | LocatorError::ControlMissing { .. }
        )
    }

    /// 0 = expected miss, 1 = worth a look, 2 = broken.
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::NotFound(_) => 0,
            LocatorError::ControlMissing { .. } => 1,
            LocatorError::StrategyFailed { .. } => 2,
        }
    }
}

