//! Field locator with fallback chain orchestration

use std::sync::Arc;

use host_dom::{Document, NodeId};
use regex::Regex;
use tracing::{debug, trace};

use crate::errors::LocatorError;
use crate::strategies::{GroupScanStrategy, LabelSelectorStrategy, Strategy};
use crate::types::{GroupMatch, LocatorStrategy, GROUP_SELECTOR, LABEL_SELECTORS};

/// Resolves a label pattern to the field group that owns it.
#[derive(Clone)]
pub struct FieldLocator {
    group_selector: String,
    label_strategy: Arc<LabelSelectorStrategy>,
    scan_strategy: Arc<GroupScanStrategy>,
}

impl Default for FieldLocator {
    fn default() -> Self {
        Self::new(
            LABEL_SELECTORS.iter().map(|s| s.to_string()).collect(),
            GROUP_SELECTOR,
        )
    }
}

impl FieldLocator {
    pub fn new(label_selectors: Vec<String>, group_selector: &str) -> Self {
        Self {
            group_selector: group_selector.to_string(),
            label_strategy: Arc::new(LabelSelectorStrategy::new(label_selectors, group_selector)),
            scan_strategy: Arc::new(GroupScanStrategy::new(group_selector)),
        }
    }

    fn strategy(&self, kind: LocatorStrategy) -> &dyn Strategy {
        match kind {
            LocatorStrategy::LabelSelectors => self.label_strategy.as_ref(),
            LocatorStrategy::GroupScan => self.scan_strategy.as_ref(),
        }
    }

    /// Nearest field group whose label matches `pattern`. Never mutates
    /// the document.
    pub fn locate(&self, doc: &Document, pattern: &Regex) -> Result<GroupMatch, LocatorError> {
        for kind in LocatorStrategy::fallback_chain() {
            let strategy = self.strategy(kind);
            match strategy.locate(doc, pattern) {
                Ok(Some(found)) => {
                    trace!(
                        strategy = strategy.name(),
                        group = %found.group,
                        label = %found.label_text.trim(),
                        "field group located"
                    );
                    return Ok(found);
                }
                Ok(None) => {}
                Err(err) => debug!(strategy = strategy.name(), error = %err, "strategy failed"),
            }
        }
        Err(LocatorError::NotFound(pattern.as_str().to_string()))
    }

    /// All field groups in document order.
    pub fn field_groups(&self, doc: &Document) -> Vec<NodeId> {
        doc.query_selector_all(&self.group_selector)
            .unwrap_or_default()
    }

    pub fn group_selector(&self) -> &str {
        &self.group_selector
    }
}
