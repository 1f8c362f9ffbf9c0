//! One fill pass over the field table.
//!
//! For each definition: locate the group, probe its control, ask the
//! policy, then write or annotate. Per-field failures are logged and
//! reported as `Failed`; they never abort the pass.

use autofill_core_types::{
    Decision, ExistingContent, FillResult, FillSummary, ParsedRecord, WriterKind,
};
use field_locator::{FieldLocator, LocatorError};
use host_dom::{Document, DomError, NodeId};
use thiserror::Error;
use tool_choice_group::{ChoiceError, ChoiceWriter};
use tool_fill_text::{TextFillError, TextWriter};
use tool_select_option::{SelectError, SelectWriter};
use tracing::{debug, info, instrument, warn};

use crate::annotator::Annotator;
use crate::config::PolicyConfig;
use crate::fields::{field_table, FieldDefinition};
use crate::policy::ConfidencePolicy;

/// Why one field could not be handled.
#[derive(Debug, Error)]
enum FieldError {
    #[error(transparent)]
    Locate(#[from] LocatorError),
    #[error(transparent)]
    Text(#[from] TextFillError),
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Choice(#[from] ChoiceError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl FieldError {
    /// Nothing to act on: no group, no usable control in it.
    fn is_not_found(&self) -> bool {
        matches!(
            self,
            FieldError::Locate(LocatorError::NotFound(_))
                | FieldError::Locate(LocatorError::ControlMissing { .. })
                | FieldError::Text(
                    TextFillError::ControlMissing
                        | TextFillError::ReadOnly
                        | TextFillError::DisabledField
                )
                | FieldError::Select(SelectError::ControlMissing | SelectError::DisabledField)
                | FieldError::Choice(ChoiceError::ControlMissing)
        )
    }
}

/// The value handed to a writer, after the policy said yes.
struct Verdict<'a> {
    value: &'a str,
    confidence: f64,
    decision: Decision,
}

#[derive(Clone, Default)]
pub struct FormFiller {
    locator: FieldLocator,
    text: TextWriter,
    select: SelectWriter,
    choice: ChoiceWriter,
    policy: ConfidencePolicy,
    annotator: Annotator,
}

impl FormFiller {
    pub fn new(policy: &PolicyConfig) -> Self {
        Self {
            policy: ConfidencePolicy::from(policy),
            ..Self::default()
        }
    }

    pub fn with_locator(mut self, locator: FieldLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn locator(&self) -> &FieldLocator {
        &self.locator
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        &self.policy
    }

    /// Runs one pass of the whole table against `doc`.
    #[instrument(skip_all, fields(url = %doc.url()))]
    pub fn fill(&self, doc: &mut Document, record: &ParsedRecord) -> FillSummary {
        let results: Vec<FillResult> = field_table()
            .iter()
            .map(|def| {
                let (value, confidence) = def.extract(record);
                match self.fill_field(doc, def, &value, confidence) {
                    Ok(result) => result,
                    Err(err) if err.is_not_found() => {
                        debug!(field = %def.name, error = %err, "field not found");
                        FillResult::not_found(def.name, confidence)
                    }
                    Err(err) => {
                        warn!(field = %def.name, error = %err, "field handling failed");
                        FillResult::failed(def.name, confidence)
                    }
                }
            })
            .collect();

        let summary = FillSummary::from_results(results);
        info!(
            total = summary.total_fields,
            filled = summary.filled_fields,
            review = summary.low_confidence_fields,
            "fill pass complete"
        );
        summary
    }

    fn fill_field(
        &self,
        doc: &mut Document,
        def: &FieldDefinition,
        value: &str,
        confidence: f64,
    ) -> Result<FillResult, FieldError> {
        let found = self.locator.locate(doc, &def.label_pattern)?;
        let group = found.group;
        match def.writer {
            WriterKind::Text => {
                let control = self.text.probe(doc, group)?;
                let Some(verdict) = self.judge(doc, def, group, value, confidence, &control.existing)?
                else {
                    return Ok(self.skipped(def, value, confidence, &control.existing));
                };
                let report = self.text.write(doc, &control, verdict.value)?;
                self.finish(doc, def, group, report.written, &verdict)
            }
            WriterKind::Select => {
                let control = self.select.probe(doc, group)?;
                let Some(verdict) = self.judge(doc, def, group, value, confidence, &control.existing)?
                else {
                    return Ok(self.skipped(def, value, confidence, &control.existing));
                };
                let matched = match self.select.match_option(&control, verdict.value) {
                    Ok(matched) => matched,
                    Err(SelectError::OptionMissing) => {
                        return self.unmatched(doc, def, group, verdict, "option")
                    }
                    Err(err) => return Err(err.into()),
                };
                let state = self.select.select(doc, &control, &matched)?;
                self.finish(doc, def, group, state.selected_text, &verdict)
            }
            WriterKind::ChoiceGroup => {
                let control = self.choice.probe(doc, group)?;
                let Some(verdict) = self.judge(doc, def, group, value, confidence, &control.existing)?
                else {
                    return Ok(self.skipped(def, value, confidence, &control.existing));
                };
                let matched = match self.choice.match_choice(&control, verdict.value) {
                    Ok(matched) => matched,
                    Err(ChoiceError::NoMatch(_)) => {
                        return self.unmatched(doc, def, group, verdict, "choice")
                    }
                    Err(err) => return Err(err.into()),
                };
                let label = self.choice.check(doc, &control, &matched)?;
                self.finish(doc, def, group, label, &verdict)
            }
        }
    }

    /// Applies the policy. `None` means skip; unknown fields are annotated
    /// here so every writer kind treats them the same way.
    fn judge<'a>(
        &self,
        doc: &mut Document,
        def: &FieldDefinition,
        group: NodeId,
        value: &'a str,
        confidence: f64,
        existing: &ExistingContent,
    ) -> Result<Option<Verdict<'a>>, FieldError> {
        let decision = self
            .policy
            .decide(value, confidence, existing, def.always_fill);
        debug!(field = %def.name, ?decision, confidence, "policy verdict");
        match decision {
            Decision::SkipCollision => Ok(None),
            Decision::SkipUnknown => {
                let reason = if value.trim().is_empty() {
                    format!("No {} was found on the receipt.", label_of(def))
                } else {
                    format!(
                        "Not confident enough ({:.0}%) to fill {} automatically.",
                        confidence * 100.0,
                        label_of(def)
                    )
                };
                self.annotator.mark_unknown(doc, group, &reason)?;
                Ok(None)
            }
            Decision::Fill | Decision::FillFlagged => Ok(Some(Verdict {
                value,
                confidence,
                decision,
            })),
        }
    }

    fn skipped(
        &self,
        def: &FieldDefinition,
        value: &str,
        confidence: f64,
        existing: &ExistingContent,
    ) -> FillResult {
        if existing.is_empty() {
            FillResult::unknown(def.name, confidence)
        } else {
            debug!(field = %def.name, existing = ?existing.text(), value, "collision, keeping existing content");
            FillResult::collision(def.name, confidence)
        }
    }

    fn unmatched(
        &self,
        doc: &mut Document,
        def: &FieldDefinition,
        group: NodeId,
        verdict: Verdict<'_>,
        what: &str,
    ) -> Result<FillResult, FieldError> {
        let reason = format!("Could not find a matching {what} for \"{}\".", verdict.value);
        self.annotator.mark_unknown(doc, group, &reason)?;
        debug!(field = %def.name, value = verdict.value, "no matching {what}");
        Ok(FillResult::unmatched(
            def.name,
            verdict.value.to_string(),
            verdict.confidence,
        ))
    }

    fn finish(
        &self,
        doc: &mut Document,
        def: &FieldDefinition,
        group: NodeId,
        written: String,
        verdict: &Verdict<'_>,
    ) -> Result<FillResult, FieldError> {
        let flagged = verdict.decision == Decision::FillFlagged;
        if flagged {
            self.annotator
                .mark_low_confidence(doc, group, verdict.confidence)?;
        } else {
            self.annotator.clear(doc, group)?;
        }
        debug!(field = %def.name, value = %written, flagged, "field filled");
        Ok(FillResult::written(
            def.name,
            written,
            verdict.confidence,
            flagged,
        ))
    }
}

fn label_of(def: &FieldDefinition) -> String {
    def.name.as_str().replace('_', " ")
}
