use crate::document::Document;
use crate::events::DomEvent;

/// Behaviour the host page ships with.
///
/// Scripts run after listeners (unless a listener stopped propagation) and
/// before the default action, with full mutable access to the document.
pub trait HostScript: Send + Sync {
    fn name(&self) -> &str;

    fn on_event(&self, doc: &mut Document, event: &DomEvent);
}
