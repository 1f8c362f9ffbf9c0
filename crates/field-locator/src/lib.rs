//! Field locator - label-driven field group resolution
//!
//! Given a label pattern, finds the field group (the container pairing a
//! label with its control) in a host document whose markup this system does
//! not control:
//! - known label-container selectors, walking up to the nearest group
//! - fallback scan of every group's own label text
//!
//! Selectors the host engine rejects are skipped, never fatal.

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
