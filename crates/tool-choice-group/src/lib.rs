//! Choice-group (radio) field writer.
//!
//! Canonical values such as `out_of_pocket` or `food` map to label
//! phrasings through a fixed table; anything else is matched literally.
//! The first choice whose rendered label matches is checked and the host
//! sees `change` then `click`.

pub mod api;
pub mod errors;
pub mod model;
pub mod policy;
pub mod table;

mod precheck;
mod runner;

pub use api::{ChoiceWriter, ChoiceWriterBuilder};
pub use errors::ChoiceError;
pub use model::{Choice, ChoiceControl, ChoiceMatch};
pub use policy::ChoicePolicyView;
pub use precheck::choice_label;
