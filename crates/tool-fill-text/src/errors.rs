use thiserror::Error;

use host_dom::DomError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TextFillError {
    #[error("tool disabled by policy")]
    Disabled,
    #[error("no text-entry control in field group")]
    ControlMissing,
    #[error("text exceeds max length ({0})")]
    TextTooLong(usize),
    #[error("field is readonly")]
    ReadOnly,
    #[error("field disabled")]
    DisabledField,
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}

