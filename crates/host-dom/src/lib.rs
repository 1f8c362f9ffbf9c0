//! In-memory host document the autofill engine operates on.
//!
//! The engine never owns the page it fills: markup, listeners and scripts
//! belong to the host. This crate models just enough of a browser document
//! for that relationship to be explicit and testable: an arena DOM, a CSS
//! subset, an event journal with capture/bubble listeners and default
//! actions, host scripts, and a shared [`HostPage`] handle with its own
//! event bus and lifetime token.

pub mod document;
pub mod errors;
pub mod events;
pub mod node;
pub mod page;
pub mod script;
pub mod selector;
pub mod snapshot;

pub use document::Document;
pub use errors::{DomError, SelectorError};
pub use events::{
    DispatchOutcome, DomEvent, DomEventKind, ListenerAction, ListenerId, PageEvent, Phase,
    Visibility,
};
pub use node::{AttachedFile, ElementData, NodeId};
pub use page::HostPage;
pub use script::HostScript;
pub use selector::SelectorList;
pub use snapshot::{el, NodeSnapshot, PageSnapshot};
