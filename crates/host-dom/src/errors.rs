//! Error types for the host document

use thiserror::Error;

/// Selector parse failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// Syntax the engine deliberately does not implement (pseudo-classes,
    /// sibling combinators, ...).
    #[error("unsupported selector syntax '{fragment}' in '{selector}'")]
    Unsupported { selector: String, fragment: String },

    #[error("malformed selector '{0}'")]
    Malformed(String),

    #[error("empty selector")]
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0} does not exist")]
    UnknownNode(usize),

    #[error("node {0} is not an element")]
    NotAnElement(usize),

    #[error("node {0} is detached from the document")]
    Detached(usize),

    #[error("cannot insert node {child} into its own subtree")]
    Cycle { child: usize },

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

