use autofill_core_types::ExistingContent;
use host_dom::NodeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub node: NodeId,
    /// Rendered label text, whitespace-collapsed.
    pub label: String,
    pub value: Option<String>,
    pub checked: bool,
}

/// The mutually exclusive choices of one field group.
#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceControl {
    pub group: NodeId,
    pub choices: Vec<Choice>,
    /// Label of the checked choice, classified by provenance.
    pub existing: ExistingContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceMatch {
    pub choice: Choice,
    /// The pattern that selected it.
    pub pattern: String,
}
