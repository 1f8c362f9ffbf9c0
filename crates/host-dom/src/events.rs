use serde::{Deserialize, Serialize};

use crate::node::NodeId;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomEventKind {
    Input,
    Change,
    KeyDown,
    KeyUp,
    Focus,
    Blur,
    Click,
    /// Default action of activating a file input: the native chooser popped.
    FileChooserOpened,
}

impl DomEventKind {
    /// Kinds that count as user activity when trusted.
    pub fn is_interaction(self) -> bool {
        matches!(
            self,
            DomEventKind::Input
                | DomEventKind::Change
                | DomEventKind::KeyDown
                | DomEventKind::KeyUp
                | DomEventKind::Focus
                | DomEventKind::Click
        )
    }
}

/// One entry in the document's event journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: DomEventKind,
    /// `true` only for events originating from the (simulated) user.
    pub trusted: bool,
    pub seq: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Capture,
    Bubble,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerAction {
    PreventDefault,
    /// Suppress the default action, stop propagation (host handlers never
    /// see the event) and report `PageEvent::Intercepted { tag }`.
    Intercept { tag: String },
    /// Detach the closest ancestor of the listening node matching the
    /// selector (dismiss buttons).
    RemoveClosest(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(pub(crate) u64);

#[derive(Clone, Debug)]
pub struct Listener {
    pub id: ListenerId,
    pub node: NodeId,
    pub kind: DomEventKind,
    pub phase: Phase,
    pub action: ListenerAction,
}

/// Result of a dispatch, as seen by the caller.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub intercepted: bool,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Page-level notifications published on the page bus once the document
/// lock is released.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// DOM changed; `structural` is set when nodes were added or removed.
    Mutated { structural: bool },
    /// A trusted event from the user.
    UserActivity { kind: DomEventKind, target: NodeId },
    Clicked { target: NodeId, trusted: bool },
    Intercepted { target: NodeId, tag: String },
    /// Back/forward navigation.
    HistoryPopped { url: String },
    VisibilityChanged { state: Visibility },
    Closed,
}
