//! Receipt autofill library
//!
//! Fills a host reimbursement form from a parsed receipt without ever
//! overwriting what the user or the host put there, flags uncertain values
//! for review, follows the host through its multi-page flow and hands the
//! original file to the host's upload control.

pub mod agent;
pub mod annotator;
pub mod attachment;
pub mod collaborators;
pub mod command;
pub mod config;
pub mod errors;
pub mod fields;
pub mod lifecycle;
pub mod orchestrator;
pub mod pipeline;
pub mod policy;
pub mod session;

// Re-export commonly used types for external use
pub use agent::AutofillAgent;
pub use attachment::{AttachmentAgent, AttachmentOutcome};
pub use autofill_core_types::{
    FieldName, FillOutcome, FillResult, FillSummary, ParsedRecord, PendingAttachment,
};
pub use command::{Command, FillCommand, FilePayload, Response};
pub use config::{load_config, Config, LoadedConfig};
pub use errors::{AgentError, CollaboratorError, ConfigError};
pub use lifecycle::{LifecycleEvent, LifecycleWatcher, NavigationTrigger, SkipReason, WatcherHandle};
pub use orchestrator::FormFiller;
pub use pipeline::ReceiptPipeline;
pub use session::{SessionContext, Settings};
