use std::sync::Arc;

use crate::record::FieldName;

/// What a located control already holds before this system touches it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExistingContent {
    Empty,
    /// Holds exactly what a previous pass of this system wrote.
    OwnWrite(String),
    /// Host default or genuine user input.
    Foreign(String),
}

impl ExistingContent {
    /// Classifies a control's current content against the provenance
    /// marker left by the last write (see `PROVENANCE_ATTR`).
    pub fn classify(current: &str, marker: Option<&str>) -> Self {
        let current = current.trim();
        if current.is_empty() {
            ExistingContent::Empty
        } else if marker.map(str::trim) == Some(current) {
            ExistingContent::OwnWrite(current.to_string())
        } else {
            ExistingContent::Foreign(current.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ExistingContent::Empty)
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self, ExistingContent::Foreign(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ExistingContent::Empty => None,
            ExistingContent::OwnWrite(text) | ExistingContent::Foreign(text) => Some(text),
        }
    }
}

/// Verdict of the confidence policy for one field.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Fill,
    FillFlagged,
    SkipUnknown,
    SkipCollision,
}

/// Control shape a field definition targets.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriterKind {
    Text,
    Select,
    ChoiceGroup,
}

/// Diagnostic detail behind a `FillResult`'s two booleans.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FillOutcome {
    Filled,
    Flagged,
    /// No usable value; field annotated as unknown.
    Unknown,
    /// Value usable but no option/choice matched it.
    Unmatched,
    /// Control already held content.
    Collision,
    NotFound,
    /// The field's handling raised an error; degraded to not-found.
    Failed,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FillResult {
    pub field_name: FieldName,
    pub filled: bool,
    pub confidence: f64,
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub value: Option<String>,
    pub needs_review: bool,
    pub outcome: FillOutcome,
}

impl FillResult {
    pub fn written(field: FieldName, value: String, confidence: f64, flagged: bool) -> Self {
        Self {
            field_name: field,
            filled: true,
            confidence,
            value: Some(value),
            needs_review: flagged,
            outcome: if flagged {
                FillOutcome::Flagged
            } else {
                FillOutcome::Filled
            },
        }
    }

    pub fn unknown(field: FieldName, confidence: f64) -> Self {
        Self::skipped(field, confidence, None, true, FillOutcome::Unknown)
    }

    pub fn unmatched(field: FieldName, value: String, confidence: f64) -> Self {
        Self::skipped(field, confidence, Some(value), true, FillOutcome::Unmatched)
    }

    pub fn collision(field: FieldName, confidence: f64) -> Self {
        Self::skipped(field, confidence, None, false, FillOutcome::Collision)
    }

    pub fn not_found(field: FieldName, confidence: f64) -> Self {
        Self::skipped(field, confidence, None, false, FillOutcome::NotFound)
    }

    pub fn failed(field: FieldName, confidence: f64) -> Self {
        Self::skipped(field, confidence, None, false, FillOutcome::Failed)
    }

    fn skipped(
        field: FieldName,
        confidence: f64,
        value: Option<String>,
        needs_review: bool,
        outcome: FillOutcome,
    ) -> Self {
        Self {
            field_name: field,
            filled: false,
            confidence,
            value,
            needs_review,
            outcome,
        }
    }
}

/// Aggregate view of one fill pass.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FillSummary {
    pub results: Vec<FillResult>,
    pub total_fields: usize,
    pub filled_fields: usize,
    pub low_confidence_fields: usize,
}

impl FillSummary {
    pub fn from_results(results: Vec<FillResult>) -> Self {
        let filled_fields = results.iter().filter(|r| r.filled).count();
        let low_confidence_fields = results.iter().filter(|r| r.needs_review).count();
        Self {
            total_fields: results.len(),
            filled_fields,
            low_confidence_fields,
            results,
        }
    }

    pub fn result(&self, field: FieldName) -> Option<&FillResult> {
        self.results.iter().find(|r| r.field_name == field)
    }
}

/// A user-supplied file waiting to be handed to the host's upload control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAttachment {
    pub bytes: Arc<Vec<u8>>,
    pub file_name: String,
    pub mime_type: String,
}

impl PendingAttachment {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_filled_and_review() {
        let summary = FillSummary::from_results(vec![
            FillResult::written(FieldName::VendorName, "Acme".into(), 0.95, false),
            FillResult::written(FieldName::Description, "Lunch".into(), 0.7, true),
            FillResult::unknown(FieldName::EventLink, 0.0),
            FillResult::not_found(FieldName::NetId, 0.0),
        ]);
        assert_eq!(summary.total_fields, 4);
        assert_eq!(summary.filled_fields, 2);
        assert_eq!(summary.low_confidence_fields, 2);
        assert_eq!(
            summary.result(FieldName::EventLink).map(|r| r.outcome),
            Some(FillOutcome::Unknown)
        );
    }

    #[test]
    fn edited_own_write_becomes_foreign() {
        assert_eq!(ExistingContent::classify("  ", None), ExistingContent::Empty);
        assert_eq!(
            ExistingContent::classify("Acme", Some("Acme")),
            ExistingContent::OwnWrite("Acme".into())
        );
        assert!(ExistingContent::classify("Acme Corp", Some("Acme")).is_foreign());
        assert!(ExistingContent::classify("Other Co.", None).is_foreign());
    }
}
