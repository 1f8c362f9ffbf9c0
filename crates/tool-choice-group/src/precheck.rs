use autofill_core_types::{ExistingContent, PROVENANCE_ATTR};
use host_dom::{Document, NodeId};

use crate::errors::ChoiceError;
use crate::model::{Choice, ChoiceControl};
use crate::policy::ChoicePolicyView;

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rendered label of a choice: `label[for]`, a wrapping label,
/// `aria-label`, then the text that follows it up to the next input.
pub fn choice_label(doc: &Document, input: NodeId) -> String {
    if let Some(id) = doc.attr(input, "id").filter(|id| !id.is_empty()) {
        let by_for = doc
            .query_selector_all("label")
            .unwrap_or_default()
            .into_iter()
            .find(|label| doc.attr(*label, "for") == Some(id));
        if let Some(label) = by_for {
            return collapse(&doc.text_content(label));
        }
    }
    if let Ok(Some(label)) = doc.closest(input, "label") {
        return collapse(&doc.text_content(label));
    }
    if let Some(aria) = doc.attr(input, "aria-label") {
        return collapse(aria);
    }
    let Some(parent) = doc.parent(input) else {
        return String::new();
    };
    let siblings = doc.children(parent);
    let start = siblings
        .iter()
        .position(|s| *s == input)
        .map_or(siblings.len(), |p| p + 1);
    let mut text = String::new();
    for sibling in &siblings[start..] {
        if doc.element(*sibling).is_some_and(|el| el.tag == "input") {
            break;
        }
        text.push(' ');
        text.push_str(&doc.text_content(*sibling));
    }
    collapse(&text)
}

pub fn run_precheck(
    doc: &Document,
    group: NodeId,
    policy: &ChoicePolicyView,
) -> Result<ChoiceControl, ChoiceError> {
    let inputs = doc
        .query_in(group, &policy.choice_selector)
        .map_err(|err| ChoiceError::Pattern(err.to_string()))?;
    if inputs.is_empty() {
        return Err(ChoiceError::ControlMissing);
    }

    let choices: Vec<Choice> = inputs
        .into_iter()
        .filter(|input| doc.element(*input).is_some_and(|el| !el.has_attr("disabled")))
        .map(|input| Choice {
            node: input,
            label: choice_label(doc, input),
            value: doc.attr(input, "value").map(str::to_string),
            checked: doc.element(input).is_some_and(|el| el.is_checked()),
        })
        .collect();

    let existing = choices
        .iter()
        .find(|choice| choice.checked)
        .map(|choice| {
            let shown = if choice.label.is_empty() {
                choice.value.clone().unwrap_or_else(|| "on".into())
            } else {
                choice.label.clone()
            };
            ExistingContent::classify(&shown, doc.attr(choice.node, PROVENANCE_ATTR))
        })
        .unwrap_or(ExistingContent::Empty);

    Ok(ChoiceControl {
        group,
        choices,
        existing,
    })
}
