use autofill_core_types::{ExistingContent, PROVENANCE_ATTR};
use host_dom::{Document, NodeId};

use crate::errors::SelectError;
use crate::model::{OptionEntry, SelectControl};
use crate::policy::SelectPolicyView;

pub fn run_precheck(
    doc: &Document,
    group: NodeId,
    policy: &SelectPolicyView,
) -> Result<SelectControl, SelectError> {
    let node = doc
        .query_first_in(group, "select")
        .map_err(|err| SelectError::InvalidTarget(err.to_string()))?
        .ok_or(SelectError::ControlMissing)?;
    let element = doc.element(node).ok_or(SelectError::ControlMissing)?;
    if element.has_attr("disabled") {
        return Err(SelectError::DisabledField);
    }

    let options: Vec<OptionEntry> = doc
        .query_in(node, "option")
        .map_err(|err| SelectError::InvalidTarget(err.to_string()))?
        .into_iter()
        .enumerate()
        .map(|(index, option)| OptionEntry {
            node: option,
            index,
            value: doc.option_value(option),
            text: doc.text_content(option).trim().to_string(),
        })
        .filter(|entry| !policy.is_sentinel(&entry.value) && !entry.text.is_empty())
        .collect();

    let current = element.value().unwrap_or("");
    let existing = if policy.is_sentinel(current) {
        ExistingContent::Empty
    } else {
        ExistingContent::classify(current, element.attr(PROVENANCE_ATTR))
    };

    Ok(SelectControl {
        group,
        node,
        options,
        existing,
    })
}
