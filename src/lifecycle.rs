//! Page lifecycle watcher.
//!
//! Decides when to re-run the fill pass and the attachment agent as the
//! host moves through its multi-page flow. Navigation is detected three
//! ways: URL polling (client-side navigation is silent), history pops and
//! trusted clicks on "Next"-like controls. Navigation resets the per-page
//! counters and schedules a forced refill after a settle delay; a
//! structural mutation that changes the number of field groups schedules a
//! debounced, non-forced one.
//!
//! Every refill is gated on page visibility, the per-page budget (non-forced
//! only), the user-interaction cooldown and a minimum number of empty
//! fields. The watcher task is tied to the page lifetime.

use std::sync::Arc;

use autofill_core_types::FillSummary;
use autofill_event_bus::{recv_lossy, EventBus, InMemoryBus};
use autofill_scheduler::{watch, WatchOutcome, WatchSpec};
use host_dom::{Document, HostPage, NodeId, PageEvent, Visibility};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::attachment::{AttachmentAgent, AttachmentOutcome, UPLOAD_TRIGGER_TAG};
use crate::config::LifecycleConfig;
use crate::orchestrator::FormFiller;
use crate::session::SessionContext;

const LIFECYCLE_BUS_CAPACITY: usize = 64;

static NEXT_TEXT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(next|continue|save\s+and\s+continue|proceed)\b").ok()
});

const CLICKABLE_SELECTOR: &str = "button, a, input, [role=\"button\"]";
const NON_TEXT_TYPES: &[&str] = &[
    "hidden", "file", "radio", "checkbox", "submit", "button", "reset", "image",
];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WatcherState {
    #[default]
    Idle,
    Watching,
    Navigated,
    RefillPending,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NavigationTrigger {
    UrlChanged { url: String },
    HistoryPopped { url: String },
    NextClicked { target: NodeId },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    NoRecord,
    InProgress,
    Hidden,
    BudgetExhausted,
    UserActive,
    TooFewEmptyFields { empty: usize, required: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleEvent {
    Navigated(NavigationTrigger),
    Refilled { forced: bool, summary: FillSummary },
    Skipped { forced: bool, reason: SkipReason },
    Attachment(AttachmentOutcome),
}

#[derive(Clone, Copy, Debug)]
struct PendingRefill {
    deadline: Instant,
    forced: bool,
}

/// Watches one page on behalf of one session.
#[derive(Clone)]
pub struct LifecycleWatcher {
    page: Arc<HostPage>,
    session: Arc<SessionContext>,
    filler: Arc<FormFiller>,
    attachments: Arc<AttachmentAgent>,
    config: LifecycleConfig,
    events: Arc<InMemoryBus<LifecycleEvent>>,
    state: Arc<Mutex<WatcherState>>,
}

/// Running watcher. Dropping the handle does not stop the task; the page
/// closing or [`WatcherHandle::stop`] does.
pub struct WatcherHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    events: Arc<InMemoryBus<LifecycleEvent>>,
    state: Arc<Mutex<WatcherState>>,
}

impl WatcherHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> WatcherState {
        *self.state.lock()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the watcher and waits for its task to end.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            warn!(error = %err, "lifecycle watcher task failed");
        }
    }
}

impl LifecycleWatcher {
    pub fn new(
        page: Arc<HostPage>,
        session: Arc<SessionContext>,
        filler: Arc<FormFiller>,
        attachments: Arc<AttachmentAgent>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            page,
            session,
            filler,
            attachments,
            config,
            events: InMemoryBus::new(LIFECYCLE_BUS_CAPACITY),
            state: Arc::new(Mutex::new(WatcherState::Idle)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Starts watching. The task ends when the page closes.
    pub fn spawn(self) -> WatcherHandle {
        let cancel = self.page.lifetime().child_token();
        let events = self.events.clone();
        let state = self.state.clone();
        // Subscribe before spawning so nothing published in between is lost.
        let page_events = self.page.subscribe();
        let task = tokio::spawn(self.run(page_events, cancel.clone()));
        WatcherHandle {
            cancel,
            task,
            events,
            state,
        }
    }

    fn set_state(&self, next: WatcherState) {
        let mut state = self.state.lock();
        if *state != next {
            trace!(from = ?*state, to = ?next, "watcher state");
            *state = next;
        }
    }

    async fn run(self, mut page_events: broadcast::Receiver<PageEvent>, cancel: CancellationToken) {
        let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
        tokio::spawn(poll_url(
            self.page.clone(),
            WatchSpec::unbounded(self.config.url_poll()),
            cancel.clone(),
            nav_tx,
        ));
        let groups = self.page.read(|doc| self.filler.locator().field_groups(doc).len());
        self.session.update_form_fields(groups);
        self.set_state(WatcherState::Watching);
        debug!(page = %self.page.id(), groups, "lifecycle watcher started");

        let mut pending: Option<PendingRefill> = None;
        loop {
            let deadline = pending.map(|p| p.deadline);
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(trigger) = nav_rx.recv() => {
                    self.on_navigation(trigger, &mut pending, &cancel);
                }
                event = recv_lossy(&mut page_events) => match event {
                    Ok(PageEvent::Closed) | Err(_) => break,
                    Ok(event) => self.on_page_event(event, &mut pending, &cancel),
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(due) = pending.take() {
                        self.try_refill(due.forced, &cancel).await;
                        self.set_state(WatcherState::Watching);
                    }
                }
            }
        }
        self.set_state(WatcherState::Idle);
        debug!(page = %self.page.id(), "lifecycle watcher stopped");
    }

    fn on_page_event(
        &self,
        event: PageEvent,
        pending: &mut Option<PendingRefill>,
        cancel: &CancellationToken,
    ) {
        match event {
            PageEvent::UserActivity { kind, target } => {
                trace!(?kind, %target, "user activity");
                self.session.note_user_interaction(Instant::now());
            }
            PageEvent::Clicked {
                target,
                trusted: true,
            } => {
                if self.page.read(|doc| is_next_like(doc, target)) {
                    self.on_navigation(NavigationTrigger::NextClicked { target }, pending, cancel);
                }
            }
            PageEvent::HistoryPopped { url } => {
                self.on_navigation(NavigationTrigger::HistoryPopped { url }, pending, cancel);
            }
            PageEvent::Mutated { structural: true } => {
                let groups = self
                    .page
                    .read(|doc| self.filler.locator().field_groups(doc).len());
                if self.session.update_form_fields(groups) && groups > 0 {
                    self.schedule(pending, false, self.config.mutation_debounce());
                }
            }
            PageEvent::Intercepted { target, tag } if tag == UPLOAD_TRIGGER_TAG => {
                let proceed = self.page.with_document(|doc| {
                    self.attachments.on_trigger_clicked(doc, target)
                });
                match proceed {
                    Ok(true) if self.session.has_attachment() => self.spawn_attachment(cancel),
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "upload trigger handling failed"),
                }
            }
            _ => {}
        }
    }

    fn on_navigation(
        &self,
        trigger: NavigationTrigger,
        pending: &mut Option<PendingRefill>,
        cancel: &CancellationToken,
    ) {
        info!(?trigger, "navigation detected");
        self.set_state(WatcherState::Navigated);
        let groups = self
            .page
            .read(|doc| self.filler.locator().field_groups(doc).len());
        self.session.reset_page_counters(groups);
        self.events.publish(LifecycleEvent::Navigated(trigger));
        self.schedule(pending, true, self.config.settle_delay());
        if self.session.has_attachment() {
            self.spawn_attachment(cancel);
        }
    }

    /// Forced refills replace whatever is pending; a non-forced one never
    /// downgrades a pending forced refill.
    fn schedule(&self, pending: &mut Option<PendingRefill>, forced: bool, delay: std::time::Duration) {
        let keep_forced = !forced && pending.is_some_and(|p| p.forced);
        if keep_forced {
            return;
        }
        *pending = Some(PendingRefill {
            deadline: Instant::now() + delay,
            forced,
        });
        self.set_state(WatcherState::RefillPending);
    }

    fn skip(&self, forced: bool, reason: SkipReason) {
        debug!(forced, ?reason, "refill skipped");
        self.events
            .publish(LifecycleEvent::Skipped { forced, reason });
    }

    #[instrument(skip(self, cancel), fields(page = %self.page.id()))]
    async fn try_refill(&self, forced: bool, cancel: &CancellationToken) {
        let Some(record) = self.session.record() else {
            return self.skip(forced, SkipReason::NoRecord);
        };
        let Some(_guard) = self.session.try_begin_refill() else {
            return self.skip(forced, SkipReason::InProgress);
        };
        if self.page.visibility() == Visibility::Hidden {
            return self.skip(forced, SkipReason::Hidden);
        }
        if !forced && self.session.refill_count() >= self.config.max_refills_per_page {
            return self.skip(forced, SkipReason::BudgetExhausted);
        }
        if self
            .session
            .user_active_within(self.config.user_cooldown(), Instant::now())
        {
            return self.skip(forced, SkipReason::UserActive);
        }

        let required = self.config.min_empty_fields;
        let outcome = self.page.with_document(|doc| {
            let empty = self.count_empty_groups(doc);
            if empty < required {
                return Err(empty);
            }
            Ok(self.filler.fill(doc, &record))
        });
        let summary = match outcome {
            Ok(summary) => summary,
            Err(empty) => {
                return self.skip(forced, SkipReason::TooFewEmptyFields { empty, required })
            }
        };

        if !forced {
            self.session.record_refill();
        }
        let pass = self.session.note_pass();
        info!(
            forced,
            pass,
            filled = summary.filled_fields,
            "refill pass complete"
        );
        self.events
            .publish(LifecycleEvent::Refilled { forced, summary });

        if self.session.has_attachment() {
            self.spawn_attachment(cancel);
        }
    }

    /// Empty field groups among the first few, ignoring the one holding
    /// focus.
    fn count_empty_groups(&self, doc: &Document) -> usize {
        let focused = doc.focused();
        self.filler
            .locator()
            .field_groups(doc)
            .into_iter()
            .take(self.config.empty_scan_groups)
            .filter(|group| !focused.is_some_and(|f| f == *group || doc.contains(*group, f)))
            .filter(|group| group_is_empty(doc, *group))
            .count()
    }

    fn spawn_attachment(&self, cancel: &CancellationToken) {
        let agent = self.attachments.clone();
        let page = self.page.clone();
        let session = self.session.clone();
        let events = self.events.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match agent.watch_and_attach(page, session, cancel).await {
                Ok(outcome) => {
                    events.publish(LifecycleEvent::Attachment(outcome));
                }
                Err(err) => warn!(error = %err, "attachment attempt failed"),
            }
        });
    }
}

/// Polls the URL until the page goes away, reporting every change.
async fn poll_url(
    page: Arc<HostPage>,
    spec: WatchSpec,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<NavigationTrigger>,
) {
    let mut last = page.url();
    loop {
        let changed = watch(&spec, &cancel, |_| {
            let url = page.url();
            (url != last).then_some(url)
        })
        .await;
        match changed {
            Ok(WatchOutcome::Satisfied(url)) => {
                last = url.clone();
                if tx.send(NavigationTrigger::UrlChanged { url }).is_err() {
                    break;
                }
            }
            Ok(_) => break,
            Err(err) => {
                warn!(error = %err, "url polling stopped");
                break;
            }
        }
    }
}

/// A trusted click on something that reads like "Next" / "Continue".
pub fn is_next_like(doc: &Document, target: NodeId) -> bool {
    let control = doc
        .closest(target, CLICKABLE_SELECTOR)
        .ok()
        .flatten()
        .unwrap_or(target);
    let Some(element) = doc.element(control) else {
        return false;
    };
    let label = match element.tag.as_str() {
        "input" => element.attr("value").unwrap_or("").to_string(),
        _ => doc.text_content(control),
    };
    let text_hit = NEXT_TEXT
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(&label));
    let attr_hit = ["id", "class"].iter().any(|name| {
        element
            .attr(name)
            .is_some_and(|value| value.to_ascii_lowercase().contains("next"))
    });
    text_hit || attr_hit
}

/// A group is empty when its radios are all unchecked or one of its text
/// or select controls has no value.
fn group_is_empty(doc: &Document, group: NodeId) -> bool {
    let controls = doc.query_in(group, "input, textarea, select").unwrap_or_default();
    let mut checkable = controls
        .iter()
        .filter_map(|node| doc.element(*node))
        .filter(|el| matches!(el.input_type().as_deref(), Some("radio" | "checkbox")))
        .peekable();
    if checkable.peek().is_some() {
        return !checkable.any(|el| el.is_checked());
    }
    controls.iter().any(|node| {
        let Some(element) = doc.element(*node) else {
            return false;
        };
        if element
            .input_type()
            .is_some_and(|kind| NON_TEXT_TYPES.contains(&kind.as_str()))
        {
            return false;
        }
        let value = element.value().unwrap_or("").trim();
        value.is_empty() || (element.tag == "select" && value == "-1")
    })
}

#[cfg(test)]
mod tests {
    use host_dom::{el, PageSnapshot};

    use super::*;

    fn doc(body: host_dom::NodeSnapshot) -> Document {
        Document::from_snapshot(&PageSnapshot {
            url: "https://forms.example/".into(),
            body,
        })
        .unwrap()
    }

    #[test]
    fn next_like_controls() {
        let doc = doc(el("body").children([
            el("button").id("a").child(el("span").id("inner").text("Next")),
            el("button").id("b").text("Save and Continue"),
            el("input").id("c").attr("type", "submit").attr("value", "Proceed"),
            el("a").id("d").class("btn-next").text("→"),
            el("button").id("e").text("Add another receipt"),
            el("button").id("f").text("Upload next file"),
        ]));
        let id = |name: &str| doc.get_element_by_id(name).unwrap();
        assert!(is_next_like(&doc, id("inner")));
        assert!(is_next_like(&doc, id("b")));
        assert!(is_next_like(&doc, id("c")));
        assert!(is_next_like(&doc, id("d")));
        assert!(!is_next_like(&doc, id("e")));
        assert!(!is_next_like(&doc, id("f")));
    }

    #[test]
    fn empty_groups() {
        let doc = doc(el("body").children([
            el("div").id("text-empty").child(el("input")),
            el("div").id("text-full").child(el("input").attr("value", "x")),
            el("div").id("radio-empty").children([
                el("input").attr("type", "radio").attr("name", "r"),
                el("input").attr("type", "radio").attr("name", "r"),
            ]),
            el("div").id("radio-full").child(
                el("input").attr("type", "radio").attr("name", "s").attr("checked", ""),
            ),
            el("div").id("select-sentinel").child(
                el("select").child(el("option").attr("value", "-1").text("Choose")),
            ),
            el("div").id("only-hidden").child(el("input").attr("type", "hidden")),
        ]));
        let id = |name: &str| doc.get_element_by_id(name).unwrap();
        assert!(group_is_empty(&doc, id("text-empty")));
        assert!(!group_is_empty(&doc, id("text-full")));
        assert!(group_is_empty(&doc, id("radio-empty")));
        assert!(!group_is_empty(&doc, id("radio-full")));
        assert!(group_is_empty(&doc, id("select-sentinel")));
        assert!(!group_is_empty(&doc, id("only-hidden")));
    }
}
