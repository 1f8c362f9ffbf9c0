use host_dom::DomError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChoiceError {
    #[error("tool disabled by policy")]
    Disabled,
    #[error("no choices in field group")]
    ControlMissing,
    #[error("no choice label matches '{0}'")]
    NoMatch(String),
    #[error("invalid pattern: {0}")]
    Pattern(String),
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}

