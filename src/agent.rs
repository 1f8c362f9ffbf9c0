//! Orchestration boundary: the one place commands enter the engine.

use std::sync::Arc;

use autofill_core_types::FillSummary;
use host_dom::HostPage;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::attachment::{AttachmentAgent, AttachmentOutcome};
use crate::command::{Command, FillCommand, Response};
use crate::config::{Config, LifecycleConfig};
use crate::errors::AgentError;
use crate::lifecycle::{LifecycleWatcher, WatcherHandle};
use crate::orchestrator::FormFiller;
use crate::session::SessionContext;

/// Drives one host page for one session.
pub struct AutofillAgent {
    page: Arc<HostPage>,
    session: Arc<SessionContext>,
    filler: Arc<FormFiller>,
    attachments: Arc<AttachmentAgent>,
    lifecycle: LifecycleConfig,
    attach_task: Mutex<Option<JoinHandle<Option<AttachmentOutcome>>>>,
}

impl AutofillAgent {
    pub fn new(page: Arc<HostPage>, config: &Config) -> Self {
        Self::with_session(page, SessionContext::new(), config)
    }

    pub fn with_session(page: Arc<HostPage>, session: Arc<SessionContext>, config: &Config) -> Self {
        Self {
            page,
            session,
            filler: Arc::new(FormFiller::new(&config.policy)),
            attachments: Arc::new(AttachmentAgent::new(config.attachment.clone())),
            lifecycle: config.lifecycle.clone(),
            attach_task: Mutex::new(None),
        }
    }

    pub fn page(&self) -> &Arc<HostPage> {
        &self.page
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn filler(&self) -> &FormFiller {
        &self.filler
    }

    pub fn watcher(&self) -> LifecycleWatcher {
        LifecycleWatcher::new(
            self.page.clone(),
            self.session.clone(),
            self.filler.clone(),
            self.attachments.clone(),
            self.lifecycle.clone(),
        )
    }

    /// Starts the lifecycle watcher for this page.
    pub fn start_watcher(&self) -> WatcherHandle {
        self.watcher().spawn()
    }

    pub async fn handle(&self, command: Command) -> Result<Response, AgentError> {
        match command {
            Command::Fill(fill) => self.fill(fill).await.map(Response::Filled),
            Command::UpdateSettings(settings) => {
                debug!(has_key = settings.api_key.is_some(), "settings updated");
                self.session.set_settings(settings);
                Ok(Response::SettingsStored)
            }
        }
    }

    /// Stores the record (and file), runs one pass and starts the
    /// attachment flow in the background.
    #[instrument(skip_all, fields(session = %self.session.id().0, fields = command.record.len()))]
    pub async fn fill(&self, command: FillCommand) -> Result<FillSummary, AgentError> {
        if self.page.is_closed() {
            return Err(AgentError::PageClosed);
        }
        if command.record.is_empty() {
            return Err(AgentError::InvalidCommand("record has no fields".into()));
        }

        let record = command.record;
        self.session.set_record(record.clone());
        if let Some(file) = command.file {
            self.session.set_attachment(file.into_attachment());
        }

        // Held so a watcher refill landing meanwhile reports itself as
        // in progress instead of queueing behind the document lock.
        let guard = self.session.try_begin_refill();
        if guard.is_none() {
            debug!("a refill pass is running; this pass follows it");
        }
        let summary = self.page.with_document(|doc| self.filler.fill(doc, &record));
        drop(guard);
        let pass = self.session.note_pass();
        info!(
            pass,
            filled = summary.filled_fields,
            review = summary.low_confidence_fields,
            "fill command handled"
        );

        if self.session.has_attachment() {
            self.start_attachment();
        }
        Ok(summary)
    }

    /// Attempts right away when the control is already rendered, otherwise
    /// polls for it.
    fn start_attachment(&self) {
        let present = self
            .page
            .read(|doc| self.attachments.find_control(doc).is_some());
        let agent = self.attachments.clone();
        let page = self.page.clone();
        let session = self.session.clone();
        let cancel = self.page.lifetime().child_token();
        let task = tokio::spawn(async move {
            let outcome = if present {
                agent.attempt(&page, &session, &cancel).await
            } else {
                agent.watch_and_attach(page, session, cancel).await
            };
            match outcome {
                Ok(outcome) => {
                    debug!(?outcome, "attachment flow finished");
                    Some(outcome)
                }
                Err(err) => {
                    warn!(error = %err, "attachment flow failed");
                    None
                }
            }
        });
        if let Some(previous) = self.attach_task.lock().replace(task) {
            previous.abort();
        }
    }

    /// Waits for the attachment flow started by the last fill command.
    pub async fn wait_for_attachment(&self) -> Option<AttachmentOutcome> {
        let task = self.attach_task.lock().take()?;
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "attachment task did not complete");
                None
            }
        }
    }
}
