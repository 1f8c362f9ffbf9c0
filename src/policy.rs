//! Confidence policy: the per-field fill / skip / flag verdict.

use autofill_core_types::{Decision, ExistingContent};

use crate::config::PolicyConfig;

/// Literal values the parser uses to say "I don't know".
pub const UNKNOWN_MARKERS: &[&str] = &["n/a", "na", "none", "unknown"];

pub fn is_unknown_marker(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    UNKNOWN_MARKERS.contains(&normalized.as_str())
}

fn is_unusable(value: &str) -> bool {
    value.trim().is_empty() || is_unknown_marker(value)
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfidencePolicy {
    fill_threshold: f64,
    unknown_threshold: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

impl From<&PolicyConfig> for ConfidencePolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            fill_threshold: config.fill_threshold,
            unknown_threshold: config.unknown_threshold,
        }
    }
}

impl ConfidencePolicy {
    pub fn fill_threshold(&self) -> f64 {
        self.fill_threshold
    }

    pub fn unknown_threshold(&self) -> f64 {
        self.unknown_threshold
    }

    fn fill_verdict(&self, confidence: f64) -> Decision {
        if confidence < self.fill_threshold {
            Decision::FillFlagged
        } else {
            Decision::Fill
        }
    }

    /// Decides what to do with one field.
    ///
    /// Content already in the control wins over everything: a value we
    /// wrote earlier is kept as-is and anything else belongs to the user
    /// or the host. Always-fill fields bypass the unknown threshold.
    pub fn decide(
        &self,
        value: &str,
        confidence: f64,
        existing: &ExistingContent,
        always_fill: bool,
    ) -> Decision {
        if !existing.is_empty() {
            return Decision::SkipCollision;
        }
        if always_fill && !is_unusable(value) {
            return self.fill_verdict(confidence);
        }
        if is_unusable(value) || confidence < self.unknown_threshold {
            return Decision::SkipUnknown;
        }
        self.fill_verdict(confidence)
    }
}
