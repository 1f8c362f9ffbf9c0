//! Session-scoped state shared by the agent, the lifecycle watcher and the
//! attachment agent.
//!
//! Single writer per slot: only the orchestration boundary stores records,
//! attachments and settings. Everything else reads, or consumes the
//! attachment once.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use autofill_core_types::{ParsedRecord, PendingAttachment, SessionId};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::config::ProfileSettings;

/// Settings supplied by the settings command. Only the collaborators read
/// them; the fill engine never does.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub profile: ProfileSettings,
}

/// Per-page counters, reset on every detected navigation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageCounters {
    /// Non-forced refills run on this page.
    pub refill_count: u32,
    pub last_form_fields_count: usize,
    pub last_user_interaction: Option<Instant>,
}

/// Clears its flag when dropped.
#[derive(Debug)]
pub struct FlagGuard {
    flag: Arc<AtomicBool>,
}

impl FlagGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct SessionContext {
    id: SessionId,
    record: RwLock<Option<Arc<ParsedRecord>>>,
    attachment: Mutex<Option<PendingAttachment>>,
    counters: Mutex<PageCounters>,
    settings: RwLock<Settings>,
    refilling: Arc<AtomicBool>,
    attaching: Arc<AtomicBool>,
    passes: AtomicU64,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            id: SessionId::new(),
            record: RwLock::new(None),
            attachment: Mutex::new(None),
            counters: Mutex::new(PageCounters::default()),
            settings: RwLock::new(Settings::default()),
            refilling: Arc::new(AtomicBool::new(false)),
            attaching: Arc::new(AtomicBool::new(false)),
            passes: AtomicU64::new(0),
        }
    }
}

impl SessionContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    // ---- record ------------------------------------------------------

    pub fn set_record(&self, record: ParsedRecord) {
        *self.record.write() = Some(Arc::new(record));
    }

    /// The pending record; safe to re-apply any number of times.
    pub fn record(&self) -> Option<Arc<ParsedRecord>> {
        self.record.read().clone()
    }

    // ---- attachment --------------------------------------------------

    /// Stores `attachment`, replacing any earlier one.
    pub fn set_attachment(&self, attachment: PendingAttachment) {
        debug!(file = %attachment.file_name, size = attachment.size(), "attachment pending");
        *self.attachment.lock() = Some(attachment);
    }

    pub fn pending_attachment(&self) -> Option<PendingAttachment> {
        self.attachment.lock().clone()
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.lock().is_some()
    }

    /// Consumes the attachment. Returns `None` if it was already taken.
    pub fn take_attachment(&self) -> Option<PendingAttachment> {
        self.attachment.lock().take()
    }

    // ---- page counters -----------------------------------------------

    pub fn counters(&self) -> PageCounters {
        self.counters.lock().clone()
    }

    pub fn reset_page_counters(&self, form_fields: usize) {
        *self.counters.lock() = PageCounters {
            last_form_fields_count: form_fields,
            ..PageCounters::default()
        };
    }

    pub fn note_user_interaction(&self, at: Instant) {
        self.counters.lock().last_user_interaction = Some(at);
    }

    /// Whether the user was active within `cooldown` of `now`.
    pub fn user_active_within(&self, cooldown: Duration, now: Instant) -> bool {
        self.counters
            .lock()
            .last_user_interaction
            .is_some_and(|at| now.saturating_duration_since(at) < cooldown)
    }

    /// Records a new field-group count; `true` when it changed.
    pub fn update_form_fields(&self, count: usize) -> bool {
        let mut counters = self.counters.lock();
        let changed = counters.last_form_fields_count != count;
        counters.last_form_fields_count = count;
        changed
    }

    pub fn refill_count(&self) -> u32 {
        self.counters.lock().refill_count
    }

    pub fn record_refill(&self) {
        self.counters.lock().refill_count += 1;
    }

    // ---- guards ------------------------------------------------------

    /// `None` while another refill is running.
    pub fn try_begin_refill(&self) -> Option<FlagGuard> {
        FlagGuard::acquire(&self.refilling)
    }

    /// `None` while another attachment attempt is running.
    pub fn try_begin_attach(&self) -> Option<FlagGuard> {
        FlagGuard::acquire(&self.attaching)
    }

    // ---- settings / stats --------------------------------------------

    pub fn set_settings(&self, settings: Settings) {
        *self.settings.write() = settings;
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Counts a fill pass; returns the new total.
    pub fn note_pass(&self) -> u64 {
        self.passes.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use autofill_core_types::FieldName;

    use super::*;

    #[test]
    fn attachment_is_consumed_once() {
        let session = SessionContext::new();
        session.set_attachment(PendingAttachment::new(vec![1, 2], "a.pdf", "application/pdf"));
        session.set_attachment(PendingAttachment::new(vec![3], "b.pdf", "application/pdf"));
        assert_eq!(session.pending_attachment().unwrap().file_name, "b.pdf");
        assert!(session.take_attachment().is_some());
        assert!(session.take_attachment().is_none());
        assert!(!session.has_attachment());
    }

    #[test]
    fn record_is_reread_not_consumed() {
        let session = SessionContext::new();
        session.set_record(ParsedRecord::new().with(FieldName::VendorName, "Acme", 0.9));
        assert!(session.record().is_some());
        assert!(session.record().is_some());
    }

    #[test]
    fn guards_are_exclusive_and_released_on_drop() {
        let session = SessionContext::new();
        let guard = session.try_begin_refill().unwrap();
        assert!(session.try_begin_refill().is_none());
        assert!(session.try_begin_attach().is_some());
        drop(guard);
        assert!(session.try_begin_refill().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn counters_reset_on_navigation() {
        let session = SessionContext::new();
        session.record_refill();
        session.note_user_interaction(Instant::now());
        assert!(session.user_active_within(Duration::from_secs(3), Instant::now()));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(!session.user_active_within(Duration::from_secs(3), Instant::now()));

        session.reset_page_counters(6);
        let counters = session.counters();
        assert_eq!(counters.refill_count, 0);
        assert_eq!(counters.last_form_fields_count, 6);
        assert!(counters.last_user_interaction.is_none());
        assert!(!session.update_form_fields(6));
        assert!(session.update_form_fields(7));
    }
}
