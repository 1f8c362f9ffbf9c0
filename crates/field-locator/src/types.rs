//! Core types for field location

use host_dom::NodeId;
use serde::{Deserialize, Serialize};

/// Field-group containers, most specific first.
pub const GROUP_SELECTOR: &str = ".form-group, .field-group, .question, fieldset, \
     [role=\"group\"], [role=\"radiogroup\"]";

/// Label containers tried in order by the selector strategy.
///
/// The last entry uses a pseudo-class the host engine does not implement;
/// it stays in the list so hosts that do support it get the extra coverage.
pub const LABEL_SELECTORS: &[&str] = &[
    "label",
    "legend",
    ".control-label",
    ".form-label",
    ".question-title",
    ".form-group > span:first-child",
];

/// Label-ish descendants consulted by the group scan.
pub const GROUP_LABEL_SELECTOR: &str =
    "label, legend, .control-label, .form-label, .question-title";

/// Strategies in fallback order:
/// 1. LabelSelectors - known label containers, then walk up to the group
/// 2. GroupScan - every field group, testing its own label text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    LabelSelectors,
    GroupScan,
}

impl LocatorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::LabelSelectors => "label-selectors",
            LocatorStrategy::GroupScan => "group-scan",
        }
    }

    pub fn fallback_chain() -> Vec<LocatorStrategy> {
        vec![LocatorStrategy::LabelSelectors, LocatorStrategy::GroupScan]
    }
}

/// A located field group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMatch {
    pub group: NodeId,
    /// The label element whose text matched, when there was one.
    pub label: Option<NodeId>,
    pub label_text: String,
    pub strategy: LocatorStrategy,
}

/// Collapses runs of whitespace (spaces, tabs, newlines) and case-folds.
pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
