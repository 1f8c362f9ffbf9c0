use autofill_core_types::{ExistingContent, PROVENANCE_ATTR};
use host_dom::{Document, NodeId};
use tracing::trace;

use crate::errors::TextFillError;
use crate::model::TextControl;
use crate::policy::TextPolicyView;

const NON_TEXT_TYPES: &[&str] = &[
    "hidden", "file", "radio", "checkbox", "submit", "button", "reset", "image",
];

fn is_text_entry(doc: &Document, node: NodeId) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    match element.input_type() {
        Some(kind) => !NON_TEXT_TYPES.contains(&kind.as_str()),
        None => element.tag == "textarea",
    }
}

/// Finds the group's text-entry control and reads what it holds.
pub fn run_precheck(
    doc: &Document,
    group: NodeId,
    policy: &TextPolicyView,
) -> Result<TextControl, TextFillError> {
    let node = policy
        .control_selectors
        .iter()
        .find_map(|selector| match doc.query_in(group, selector) {
            Ok(found) => found.into_iter().find(|n| is_text_entry(doc, *n)),
            Err(err) => {
                trace!(selector = %selector, error = %err, "control selector skipped");
                None
            }
        })
        .ok_or(TextFillError::ControlMissing)?;

    let element = doc.element(node).ok_or(TextFillError::ControlMissing)?;
    if element.has_attr("disabled") {
        return Err(TextFillError::DisabledField);
    }
    if element.has_attr("readonly") {
        return Err(TextFillError::ReadOnly);
    }
    let input_type = element
        .input_type()
        .unwrap_or_else(|| element.tag.clone());
    let maxlength = element
        .attr("maxlength")
        .and_then(|raw| raw.trim().parse::<usize>().ok());
    let existing = ExistingContent::classify(
        element.value().unwrap_or(""),
        element.attr(PROVENANCE_ATTR),
    );

    Ok(TextControl {
        group,
        node,
        input_type,
        maxlength,
        existing,
    })
}
