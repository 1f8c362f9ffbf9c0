use autofill_core_types::ExistingContent;
use host_dom::NodeId;
use serde::{Deserialize, Serialize};

/// How an option was matched against the target value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Case-insensitive equality with the option text or value.
    Exact,
    /// The option text contains the value.
    OptionContainsValue,
    /// The value contains the option text.
    ValueContainsOption,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionEntry {
    pub node: NodeId,
    pub index: usize,
    pub value: String,
    pub text: String,
}

/// A select control resolved inside a field group.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectControl {
    pub group: NodeId,
    pub node: NodeId,
    /// Options that represent a real choice, in document order.
    pub options: Vec<OptionEntry>,
    pub existing: ExistingContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionMatch {
    pub option: OptionEntry,
    pub kind: MatchKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_value: String,
    pub selected_text: String,
    pub changed: bool,
}
