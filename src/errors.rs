//! Error types for the autofill engine
//!
//! Field-level problems (not found, undecidable, collision) never surface
//! here; they are reported through `FillResult`. What remains are failures
//! that abort a whole command.

use std::path::PathBuf;

use autofill_scheduler::SchedulerError;
use host_dom::DomError;
use thiserror::Error;

/// Failure of an external collaborator (text extraction or parsing).
///
/// Fatal to the fill attempt that triggered it; never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("could not extract text from the file: {0}")]
    Extraction(String),

    #[error("parsing service unreachable: {0}")]
    Network(String),

    #[error("parsing service rejected the credential: {0}")]
    Authentication(String),

    #[error("no API credential configured ({0})")]
    MissingCredential(String),

    #[error("parsing service returned an unusable response: {0}")]
    MalformedResponse(String),
}

impl CollaboratorError {
    /// Which boundary failed: `extraction` or `parsing`.
    pub fn category(&self) -> &'static str {
        match self {
            CollaboratorError::Extraction(_) => "extraction",
            _ => "parsing",
        }
    }

    /// The one human-readable line shown for this failure category.
    pub fn user_message(&self) -> &'static str {
        match self {
            CollaboratorError::Extraction(_) => {
                "The receipt could not be read. Make sure it is a text-based PDF."
            }
            CollaboratorError::Authentication(_) | CollaboratorError::MissingCredential(_) => {
                "The parsing service rejected the API key. Check your settings."
            }
            CollaboratorError::Network(_) | CollaboratorError::MalformedResponse(_) => {
                "The receipt could not be parsed. Try again later."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no configuration directory on this platform")]
    NoConfigDir,
}

/// Errors returned by the orchestration boundary.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("document error: {0}")]
    Dom(#[from] DomError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("page is closed")]
    PageClosed,
}
