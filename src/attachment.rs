//! File attachment agent.
//!
//! Hands the pending receipt to the host's own upload control: either by
//! assigning it to the native file input and letting the host's handler
//! process it, or, when that cannot work, by asking the user to upload it
//! manually. The upload trigger's click is intercepted in the capture phase
//! so the native chooser never pops up unasked; once a manual upload is
//! requested the interception is lifted so the host's button works again.

use std::sync::Arc;

use autofill_core_types::PendingAttachment;
use autofill_scheduler::{watch, WatchOutcome, WatchSpec};
use host_dom::{
    AttachedFile, DomError, DomEventKind, Document, HostPage, ListenerAction, ListenerId, NodeId,
    Phase,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::AttachmentConfig;
use crate::errors::AgentError;
use crate::session::SessionContext;

/// Tag carried by `PageEvent::Intercepted` for upload-trigger clicks.
pub const UPLOAD_TRIGGER_TAG: &str = "upload-trigger";
pub const BANNER_ID: &str = "autofill-upload-banner";
pub const NOTICE_CLASS: &str = "autofill-notice";
pub const LOCK_ATTR: &str = "data-autofill-locked";
/// Set on a trigger handed back to the user after a manual-upload request.
pub const RELEASED_ATTR: &str = "data-autofill-released";

const FILE_INPUT_SELECTOR: &str = "input[type=\"file\"]";
const TRIGGER_SELECTOR: &str =
    "[data-file-input], label[for], .upload-button, .file-upload, [data-upload]";
const FILENAME_SELECTOR: &str = ".file-name, .upload-filename, [data-file-name]";
const MODAL_SELECTOR: &str = "[role=\"dialog\"], .modal";

static HOST_UPLOAD_FIELD: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)file|upload|attachment|receipt").ok());

/// What one attachment attempt did.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentOutcome {
    NoPending,
    ControlAbsent,
    /// The host already shows an attached file.
    AlreadyUploaded,
    /// The host accepted the file; the attachment was consumed.
    Attached,
    /// The user was asked to upload manually; the attachment is kept.
    ManualFallback,
    /// Another attempt is running.
    Busy,
    Cancelled,
}

/// The host's upload control as found in the document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UploadControl {
    /// What the user clicks to upload.
    pub trigger: NodeId,
    /// The native file input, if the host has one.
    pub input: Option<NodeId>,
    /// The input lives inside a modal dialog.
    pub in_modal: bool,
}

impl UploadControl {
    /// Native substitution is possible: there is an input outside any modal.
    pub fn substitutable(&self) -> Option<NodeId> {
        self.input.filter(|_| !self.in_modal)
    }
}

#[derive(Clone, Debug, Default)]
pub struct AttachmentAgent {
    config: AttachmentConfig,
}

impl AttachmentAgent {
    pub fn new(config: AttachmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AttachmentConfig {
        &self.config
    }

    /// Bounded poll used while waiting for the control to render.
    pub fn poll_spec(&self) -> WatchSpec {
        WatchSpec::bounded(self.config.poll_interval(), self.config.max_poll_attempts.max(1))
            .with_backoff(self.config.poll_backoff())
    }

    fn confirm_spec(&self) -> WatchSpec {
        WatchSpec::bounded(self.config.confirm_delay(), self.config.confirm_attempts.max(1))
            .immediate(false)
    }

    /// The visible upload control, if the page shows one.
    pub fn find_control(&self, doc: &Document) -> Option<UploadControl> {
        let input = doc
            .query_selector_all(FILE_INPUT_SELECTOR)
            .ok()?
            .into_iter()
            .find(|node| doc.element(*node).is_some_and(|el| !el.has_attr("disabled")));

        let trigger = match input {
            Some(input) if doc.is_visible(input) => input,
            _ => {
                let visible: Vec<NodeId> = doc
                    .query_selector_all(TRIGGER_SELECTOR)
                    .ok()?
                    .into_iter()
                    .filter(|node| doc.is_visible(*node) && is_upload_trigger(doc, *node))
                    .collect();
                visible
                    .iter()
                    .copied()
                    .find(|node| input.is_some() && doc.file_chooser_target(*node) == input)
                    .or_else(|| visible.first().copied())?
            }
        };

        let in_modal = input
            .and_then(|node| doc.closest(node, MODAL_SELECTOR).ok().flatten())
            .is_some();
        Some(UploadControl {
            trigger,
            input,
            in_modal,
        })
    }

    /// Installs the capture-phase interception on the trigger. Idempotent,
    /// and a no-op on a trigger already released to the user.
    pub fn intercept_trigger(&self, doc: &mut Document, control: &UploadControl) {
        if doc.attr(control.trigger, RELEASED_ATTR).is_some() {
            return;
        }
        if interceptors(doc, control.trigger).is_empty() {
            doc.add_listener(
                control.trigger,
                DomEventKind::Click,
                Phase::Capture,
                ListenerAction::Intercept {
                    tag: UPLOAD_TRIGGER_TAG.to_string(),
                },
            );
            debug!(trigger = %control.trigger, "upload trigger intercepted");
        }
    }

    /// Whether the host shows a file name next to its upload control.
    pub fn already_uploaded(&self, doc: &Document) -> bool {
        doc.query_selector_all(FILENAME_SELECTOR)
            .unwrap_or_default()
            .into_iter()
            .any(|node| !doc.text_content(node).trim().is_empty())
    }

    /// Whether the host's own upload handling accepted a file since
    /// `baseline` was taken: a hidden upload field got a new value, or the
    /// file-name label was populated.
    pub fn host_accepted(&self, doc: &Document, baseline: &UploadBaseline) -> bool {
        let hidden_field_set = upload_fields(doc).into_iter().any(|(node, value)| {
            !value.trim().is_empty() && baseline.value_of(node) != Some(value.as_str())
        });
        hidden_field_set || self.already_uploaded(doc)
    }

    /// Reacts to an intercepted trigger click. Returns `true` when the
    /// click should lead to an attachment attempt.
    pub fn on_trigger_clicked(&self, doc: &mut Document, trigger: NodeId) -> Result<bool, DomError> {
        if manual_upload_requested(doc) {
            return Ok(false);
        }
        if self.already_uploaded(doc) {
            self.show_notice(doc, trigger, "This receipt is already uploaded.")?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Makes one attempt with the session's pending attachment.
    #[instrument(skip_all, fields(page = %page.id()))]
    pub async fn attempt(
        &self,
        page: &HostPage,
        session: &SessionContext,
        cancel: &CancellationToken,
    ) -> Result<AttachmentOutcome, AgentError> {
        let Some(pending) = session.pending_attachment() else {
            return Ok(AttachmentOutcome::NoPending);
        };
        let Some(_guard) = session.try_begin_attach() else {
            return Ok(AttachmentOutcome::Busy);
        };

        let prepared = page.with_document(|doc| self.prepare(doc, &pending))?;
        let (control, baseline) = match prepared {
            Prepared::Done(outcome) => return Ok(outcome),
            Prepared::Assigned { control, baseline } => (control, baseline),
        };

        let confirmed = watch(&self.confirm_spec(), cancel, |_| {
            page.read(|doc| self.host_accepted(doc, &baseline)).then_some(())
        })
        .await?;

        match confirmed {
            WatchOutcome::Satisfied(()) => {
                session.take_attachment();
                page.with_document(|doc| lock_trigger(doc, control.trigger))?;
                info!(file = %pending.file_name, "host accepted the attachment");
                Ok(AttachmentOutcome::Attached)
            }
            WatchOutcome::Exhausted { attempts } => {
                warn!(attempts, "host did not confirm the upload; asking for a manual upload");
                page.with_document(|doc| self.request_manual_upload(doc, &control))?;
                Ok(AttachmentOutcome::ManualFallback)
            }
            WatchOutcome::Cancelled => Ok(AttachmentOutcome::Cancelled),
        }
    }

    /// Waits (bounded) for the upload control to render, then attempts.
    pub async fn watch_and_attach(
        &self,
        page: Arc<HostPage>,
        session: Arc<SessionContext>,
        cancel: CancellationToken,
    ) -> Result<AttachmentOutcome, AgentError> {
        let appeared = watch(&self.poll_spec(), &cancel, |_| {
            if !session.has_attachment() {
                return Some(false);
            }
            page.read(|doc| self.find_control(doc)).map(|_| true)
        })
        .await?;
        match appeared {
            WatchOutcome::Satisfied(true) => self.attempt(&page, &session, &cancel).await,
            WatchOutcome::Satisfied(false) => Ok(AttachmentOutcome::NoPending),
            WatchOutcome::Exhausted { attempts } => {
                debug!(attempts, "upload control never appeared");
                Ok(AttachmentOutcome::ControlAbsent)
            }
            WatchOutcome::Cancelled => Ok(AttachmentOutcome::Cancelled),
        }
    }

    /// Synchronous part of an attempt, under one document lock.
    fn prepare(&self, doc: &mut Document, pending: &PendingAttachment) -> Result<Prepared, DomError> {
        let Some(control) = self.find_control(doc) else {
            return Ok(Prepared::Done(AttachmentOutcome::ControlAbsent));
        };
        if manual_upload_requested(doc) {
            debug!("manual upload already requested on this page");
            return Ok(Prepared::Done(AttachmentOutcome::ManualFallback));
        }
        self.intercept_trigger(doc, &control);
        if self.already_uploaded(doc) {
            debug!("host already shows an uploaded file");
            return Ok(Prepared::Done(AttachmentOutcome::AlreadyUploaded));
        }
        let Some(input) = control.substitutable() else {
            self.request_manual_upload(doc, &control)?;
            return Ok(Prepared::Done(AttachmentOutcome::ManualFallback));
        };

        let baseline = UploadBaseline::capture(doc);
        doc.set_files(
            input,
            vec![AttachedFile {
                name: pending.file_name.clone(),
                mime_type: pending.mime_type.clone(),
                size: pending.size(),
            }],
        )?;
        doc.dispatch(input, DomEventKind::Input, false)?;
        doc.dispatch(input, DomEventKind::Change, false)?;
        debug!(%input, file = %pending.file_name, "file assigned to native input");
        Ok(Prepared::Assigned { control, baseline })
    }

    /// Shows the banner and gives the trigger back to the user, so the
    /// host's own button opens its chooser again.
    pub fn request_manual_upload(
        &self,
        doc: &mut Document,
        control: &UploadControl,
    ) -> Result<(), DomError> {
        self.show_banner(doc)?;
        for id in interceptors(doc, control.trigger) {
            doc.remove_listener(id);
        }
        doc.set_attr(control.trigger, RELEASED_ATTR, "true")?;
        info!(trigger = %control.trigger, "upload trigger released for a manual upload");
        Ok(())
    }

    /// One-time banner asking for a manual upload.
    pub fn show_banner(&self, doc: &mut Document) -> Result<(), DomError> {
        if doc.get_element_by_id(BANNER_ID).is_some() {
            return Ok(());
        }
        let banner = doc.create_element("div");
        doc.set_attr(banner, "id", BANNER_ID)?;
        doc.set_attr(banner, "role", "alert")?;
        doc.set_text(
            banner,
            "Your receipt could not be attached automatically. Please upload it using the form's upload button.",
        )?;
        let body = doc.body();
        let first = doc.children(body).first().copied();
        doc.insert_before(body, banner, first)
    }

    fn show_notice(&self, doc: &mut Document, trigger: NodeId, text: &str) -> Result<(), DomError> {
        let parent = doc.parent(trigger).unwrap_or_else(|| doc.body());
        if let Some(existing) = doc.query_first_in(parent, &format!(".{NOTICE_CLASS}"))? {
            return doc.set_text(existing, text);
        }
        let notice = doc.create_element("div");
        doc.set_attr(notice, "class", NOTICE_CLASS)?;
        doc.set_attr(notice, "role", "status")?;
        doc.set_text(notice, text)?;
        doc.append_child(parent, notice)
    }
}

enum Prepared {
    Done(AttachmentOutcome),
    Assigned {
        control: UploadControl,
        baseline: UploadBaseline,
    },
}

/// Host upload fields and their values just before the file was assigned.
/// Values already present then (session tokens and the like) prove nothing.
#[derive(Clone, Debug, Default)]
pub struct UploadBaseline {
    fields: Vec<(NodeId, String)>,
}

impl UploadBaseline {
    pub fn capture(doc: &Document) -> Self {
        Self {
            fields: upload_fields(doc),
        }
    }

    fn value_of(&self, node: NodeId) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == node)
            .map(|(_, value)| value.as_str())
    }
}

/// Hidden inputs named like an upload field, with their current values.
fn upload_fields(doc: &Document) -> Vec<(NodeId, String)> {
    let Some(pattern) = HOST_UPLOAD_FIELD.as_ref() else {
        return Vec::new();
    };
    doc.query_selector_all("input[type=\"hidden\"]")
        .unwrap_or_default()
        .into_iter()
        .filter(|node| {
            doc.attr(*node, "name")
                .or_else(|| doc.attr(*node, "id"))
                .is_some_and(|name| pattern.is_match(name))
        })
        .map(|node| {
            let value = doc
                .value(node)
                .or_else(|| doc.attr(node, "value"))
                .unwrap_or("");
            (node, value.to_string())
        })
        .collect()
}

fn interceptors(doc: &Document, trigger: NodeId) -> Vec<ListenerId> {
    doc.listeners_on(trigger)
        .filter(|l| {
            matches!(&l.action, ListenerAction::Intercept { tag } if tag == UPLOAD_TRIGGER_TAG)
        })
        .map(|l| l.id)
        .collect()
}

fn manual_upload_requested(doc: &Document) -> bool {
    doc.get_element_by_id(BANNER_ID).is_some()
}

/// Labels only count when they open a file input.
fn is_upload_trigger(doc: &Document, node: NodeId) -> bool {
    match doc.element(node) {
        Some(el) if el.tag == "label" => doc.file_chooser_target(node).is_some(),
        Some(_) => true,
        None => false,
    }
}

/// Disables the trigger so it cannot start a second upload.
fn lock_trigger(doc: &mut Document, trigger: NodeId) -> Result<(), DomError> {
    doc.set_attr(trigger, LOCK_ATTR, "true")?;
    doc.set_attr(trigger, "aria-disabled", "true")?;
    doc.set_attr(trigger, "disabled", "")?;
    doc.set_style(trigger, "pointer-events", "none")?;
    doc.set_style(trigger, "opacity", "0.6")
}
