use host_dom::{Document, NodeId};

use crate::errors::TextFillError;
use crate::model::{TextControl, TextWriteReport};
use crate::policy::TextPolicyView;
use crate::{precheck, runner};

/// Two-phase text writer: `probe` reads, `write` mutates. Both run under
/// the caller's document lock.
#[derive(Clone, Debug, Default)]
pub struct TextWriter {
    policy: TextPolicyView,
}

impl TextWriter {
    pub fn builder() -> TextWriterBuilder {
        TextWriterBuilder::new(TextPolicyView::default())
    }

    pub fn policy(&self) -> &TextPolicyView {
        &self.policy
    }

    pub fn probe(&self, doc: &Document, group: NodeId) -> Result<TextControl, TextFillError> {
        precheck::run_precheck(doc, group, &self.policy)
    }

    pub fn write(
        &self,
        doc: &mut Document,
        control: &TextControl,
        value: &str,
    ) -> Result<TextWriteReport, TextFillError> {
        runner::execute(doc, control, value, &self.policy)
    }
}

pub struct TextWriterBuilder {
    policy: TextPolicyView,
}

impl TextWriterBuilder {
    pub fn new(policy: TextPolicyView) -> Self {
        Self { policy }
    }

    pub fn with_max_text_len(mut self, max: usize) -> Self {
        self.policy.max_text_len = max;
        self
    }

    pub fn with_control_selectors(mut self, selectors: Vec<String>) -> Self {
        self.policy.control_selectors = selectors;
        self
    }

    pub fn build(self) -> TextWriter {
        TextWriter {
            policy: self.policy,
        }
    }
}
