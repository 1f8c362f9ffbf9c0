use autofill_core_types::ExistingContent;
use host_dom::{DomEventKind, NodeId};

/// A text-entry control resolved inside a field group.
#[derive(Clone, Debug, PartialEq)]
pub struct TextControl {
    pub group: NodeId,
    pub node: NodeId,
    /// `textarea`, or the input's lower-cased type.
    pub input_type: String,
    pub maxlength: Option<usize>,
    pub existing: ExistingContent,
}

impl TextControl {
    pub fn is_date(&self) -> bool {
        self.input_type == "date"
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextWriteReport {
    pub node: NodeId,
    /// The value as written after control-specific formatting.
    pub written: String,
    pub events: Vec<DomEventKind>,
}
