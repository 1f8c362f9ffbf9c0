//! Group resolution strategies

use host_dom::{Document, NodeId};
use regex::Regex;
use tracing::{debug, trace};

use crate::errors::LocatorError;
use crate::types::{normalize_label, GroupMatch, LocatorStrategy, GROUP_LABEL_SELECTOR};

/// Strategy trait for field-group resolution. Strategies only read.
pub trait Strategy: Send + Sync {
    fn locate(&self, doc: &Document, pattern: &Regex) -> Result<Option<GroupMatch>, LocatorError>;

    fn strategy_type(&self) -> LocatorStrategy;

    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

/// Matches against the normalized text first, then the raw text.
pub fn label_matches(pattern: &Regex, raw: &str) -> bool {
    pattern.is_match(&normalize_label(raw)) || pattern.is_match(raw)
}

/// Finds label containers by selector and walks up to their group.
pub struct LabelSelectorStrategy {
    label_selectors: Vec<String>,
    group_selector: String,
}

impl LabelSelectorStrategy {
    pub fn new(label_selectors: Vec<String>, group_selector: impl Into<String>) -> Self {
        Self {
            label_selectors,
            group_selector: group_selector.into(),
        }
    }
}

impl Strategy for LabelSelectorStrategy {
    fn locate(&self, doc: &Document, pattern: &Regex) -> Result<Option<GroupMatch>, LocatorError> {
        for selector in &self.label_selectors {
            let labels = match doc.query_selector_all(selector) {
                Ok(labels) => labels,
                Err(err) => {
                    debug!(selector = %selector, error = %err, "label selector skipped");
                    continue;
                }
            };
            for label in labels {
                let text = doc.text_content(label);
                if !label_matches(pattern, &text) {
                    continue;
                }
                let group = doc
                    .closest(label, &self.group_selector)
                    .map_err(|err| LocatorError::StrategyFailed {
                        strategy: self.name().to_string(),
                        reason: err.to_string(),
                    })?;
                match group {
                    Some(group) => {
                        return Ok(Some(GroupMatch {
                            group,
                            label: Some(label),
                            label_text: text,
                            strategy: self.strategy_type(),
                        }))
                    }
                    None => trace!(%label, "matching label outside any field group"),
                }
            }
        }
        Ok(None)
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::LabelSelectors
    }
}

/// Scans every group and tests the group's own label text.
pub struct GroupScanStrategy {
    group_selector: String,
}

impl GroupScanStrategy {
    pub fn new(group_selector: impl Into<String>) -> Self {
        Self {
            group_selector: group_selector.into(),
        }
    }

    fn group_label(doc: &Document, group: NodeId) -> (Option<NodeId>, String) {
        match doc.query_first_in(group, GROUP_LABEL_SELECTOR) {
            Ok(Some(label)) => (Some(label), doc.text_content(label)),
            _ => (None, doc.text_content(group)),
        }
    }
}

impl Strategy for GroupScanStrategy {
    fn locate(&self, doc: &Document, pattern: &Regex) -> Result<Option<GroupMatch>, LocatorError> {
        let groups =
            doc.query_selector_all(&self.group_selector)
                .map_err(|err| LocatorError::StrategyFailed {
                    strategy: self.name().to_string(),
                    reason: err.to_string(),
                })?;
        for group in groups {
            let (label, text) = Self::group_label(doc, group);
            if label_matches(pattern, &text) {
                return Ok(Some(GroupMatch {
                    group,
                    label,
                    label_text: text,
                    strategy: self.strategy_type(),
                }));
            }
        }
        Ok(None)
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::GroupScan
    }
}
