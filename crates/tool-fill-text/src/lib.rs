//! Text-entry field writer.
//!
//! Resolves the text control inside a located field group, classifies what
//! it already holds, and on request writes a value followed by the
//! `input`, `change`, `keyup`, `blur` sequence host validation listens for.

pub mod api;
pub mod errors;
pub mod format;
pub mod model;
pub mod policy;

mod precheck;
mod runner;

pub use api::{TextWriter, TextWriterBuilder};
pub use errors::TextFillError;
pub use model::{TextControl, TextWriteReport};
pub use policy::TextPolicyView;
