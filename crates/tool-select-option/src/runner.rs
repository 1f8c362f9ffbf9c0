use autofill_core_types::PROVENANCE_ATTR;
use host_dom::Document;
use tracing::{debug, instrument};

use crate::errors::SelectError;
use crate::model::{MatchKind, OptionMatch, SelectControl, SelectionState};
use crate::policy::SelectPolicyView;

/// Exact match first, then option-contains-value, then
/// value-contains-option; first option in document order wins each pass.
pub fn match_option(
    control: &SelectControl,
    target: &str,
    policy: &SelectPolicyView,
) -> Result<OptionMatch, SelectError> {
    let needle = target.trim().to_lowercase();
    if needle.is_empty() {
        return Err(SelectError::InvalidTarget("empty item".into()));
    }

    let mut passes = vec![MatchKind::Exact];
    if policy.allow_partial {
        passes.push(MatchKind::OptionContainsValue);
        passes.push(MatchKind::ValueContainsOption);
    }

    for kind in passes {
        let found = control.options.iter().find(|option| {
            let text = option.text.to_lowercase();
            match kind {
                MatchKind::Exact => text == needle || option.value.to_lowercase() == needle,
                MatchKind::OptionContainsValue => text.contains(&needle),
                MatchKind::ValueContainsOption => needle.contains(&text),
            }
        });
        if let Some(option) = found {
            return Ok(OptionMatch {
                option: option.clone(),
                kind,
            });
        }
    }
    Err(SelectError::OptionMissing)
}

#[instrument(skip_all, fields(node = %control.node, option = matched.option.index))]
pub fn execute(
    doc: &mut Document,
    control: &SelectControl,
    matched: &OptionMatch,
    policy: &SelectPolicyView,
) -> Result<SelectionState, SelectError> {
    if !policy.enabled {
        return Err(SelectError::Disabled);
    }
    let before = doc.value(control.node).map(str::to_string);
    doc.select_option(control.node, matched.option.node)?;
    let selected_value = doc.option_value(matched.option.node);
    doc.set_attr(control.node, PROVENANCE_ATTR, &selected_value)?;
    for kind in &policy.notify {
        doc.dispatch(control.node, *kind, false)?;
    }
    debug!(kind = ?matched.kind, text = %matched.option.text, "option selected");

    Ok(SelectionState {
        changed: before.as_deref() != Some(selected_value.as_str()),
        selected_value,
        selected_text: matched.option.text.clone(),
    })
}
