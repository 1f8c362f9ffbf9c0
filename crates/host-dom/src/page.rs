use std::sync::Arc;

use autofill_core_types::PageId;
use autofill_event_bus::{EventBus, InMemoryBus};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::document::Document;
use crate::errors::DomError;
use crate::events::{DispatchOutcome, DomEventKind, PageEvent, Visibility};
use crate::node::NodeId;
use crate::snapshot::{NodeSnapshot, PageSnapshot};

const PAGE_BUS_CAPACITY: usize = 256;

/// Shared handle to one loaded host page.
///
/// All document access goes through [`HostPage::with_document`] /
/// [`HostPage::read`]; the lock is never held across an await. Events the
/// document queued while locked are published after the lock is dropped.
pub struct HostPage {
    id: PageId,
    document: Mutex<Document>,
    bus: Arc<InMemoryBus<PageEvent>>,
    lifetime: CancellationToken,
}

impl HostPage {
    pub fn new(document: Document) -> Arc<Self> {
        Arc::new(Self {
            id: PageId::new(),
            document: Mutex::new(document),
            bus: InMemoryBus::new(PAGE_BUS_CAPACITY),
            lifetime: CancellationToken::new(),
        })
    }

    pub fn from_snapshot(snapshot: &PageSnapshot) -> Result<Arc<Self>, DomError> {
        Ok(Self::new(Document::from_snapshot(snapshot)?))
    }

    pub fn id(&self) -> &PageId {
        &self.id
    }

    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let (result, events) = {
            let mut doc = self.document.lock();
            let result = f(&mut *doc);
            (result, doc.take_outbox())
        };
        for event in events {
            self.bus.publish(event);
        }
        result
    }

    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        let doc = self.document.lock();
        f(&*doc)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.bus.subscribe()
    }

    pub fn url(&self) -> String {
        self.read(|doc| doc.url().to_string())
    }

    pub fn visibility(&self) -> Visibility {
        self.read(Document::visibility)
    }

    /// Token cancelled when the page is torn down.
    pub fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    pub fn close(&self) {
        if !self.lifetime.is_cancelled() {
            info!(page = %self.id, "page closed");
            self.lifetime.cancel();
            self.bus.publish(PageEvent::Closed);
        }
    }

    pub fn snapshot(&self) -> PageSnapshot {
        self.read(Document::to_page_snapshot)
    }

    // ---- simulated user ----------------------------------------------

    pub fn user_focus(&self, node: NodeId) -> Result<(), DomError> {
        self.with_document(|doc| doc.focus(node, true))
    }

    /// Types `text` into `node` one key at a time, appending to its value.
    pub fn user_type(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.with_document(|doc| {
            doc.focus(node, true)?;
            let mut value = doc.value(node).unwrap_or("").to_string();
            for ch in text.chars() {
                doc.dispatch(node, DomEventKind::KeyDown, true)?;
                value.push(ch);
                doc.set_value(node, &value)?;
                doc.dispatch(node, DomEventKind::Input, true)?;
                doc.dispatch(node, DomEventKind::KeyUp, true)?;
            }
            doc.dispatch(node, DomEventKind::Change, true)?;
            Ok(())
        })
    }

    pub fn user_click(&self, node: NodeId) -> Result<DispatchOutcome, DomError> {
        self.with_document(|doc| doc.dispatch(node, DomEventKind::Click, true))
    }

    // ---- navigation --------------------------------------------------

    /// Client-side navigation: the URL changes silently and the body is
    /// replaced. Only URL polling can notice this.
    pub fn navigate_spa(&self, url: &str, body: &NodeSnapshot) -> Result<(), DomError> {
        debug!(page = %self.id, url, "spa navigation");
        self.with_document(|doc| {
            doc.set_url(url);
            doc.reset_body()?;
            let root = doc.body();
            doc.load_into(root, body)?;
            Ok(())
        })
    }

    /// Back button. Optionally swaps in the restored page's body.
    pub fn history_back(&self, body: Option<&NodeSnapshot>) -> Result<Option<String>, DomError> {
        self.with_document(|doc| {
            let restored = doc.history_back();
            if let (Some(_), Some(body)) = (&restored, body) {
                doc.reset_body()?;
                let root = doc.body();
                doc.load_into(root, body)?;
            }
            Ok(restored)
        })
    }

    pub fn set_visibility(&self, state: Visibility) {
        self.with_document(|doc| doc.set_visibility(state));
    }
}

impl Drop for HostPage {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

impl std::fmt::Debug for HostPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostPage").field("id", &self.id).finish()
    }
}
