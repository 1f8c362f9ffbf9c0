//! Shared primitives for the receipt autofill engine.
//!
//! Every crate in the workspace speaks in these types: the semantic field
//! vocabulary, the confidence-scored record produced by the parsing
//! collaborator, per-field fill results and the pass summary handed back to
//! the UI layer.

use std::fmt;

use uuid::Uuid;

mod fill;
mod record;

pub use fill::{
    Decision, ExistingContent, FillOutcome, FillResult, FillSummary, PendingAttachment, WriterKind,
};
pub use record::{FieldEstimate, FieldName, ParsedRecord, RecordValue};

/// Attribute stamped on every control this system writes.
///
/// The attribute value is the exact text that was written, so a later edit
/// by the user is distinguishable from our own write.
pub const PROVENANCE_ATTR: &str = "data-autofill-filled";

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PageId(pub String);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page:{}", self.0)
    }
}
