//! Single-select field writer.
//!
//! Matches a target value against option labels (exact, then containment
//! in either direction), skipping "no selection" sentinels, and selects the
//! winner with `input`/`change` notifications. No match is reported as
//! [`SelectError::OptionMissing`] for the caller to annotate.

pub mod api;
pub mod errors;
pub mod model;
pub mod policy;

mod precheck;
mod runner;

pub use api::{SelectWriter, SelectWriterBuilder};
pub use errors::SelectError;
pub use model::{MatchKind, OptionEntry, OptionMatch, SelectControl, SelectionState};
pub use policy::SelectPolicyView;
