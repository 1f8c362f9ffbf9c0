use autofill_core_types::PROVENANCE_ATTR;
use host_dom::Document;
use tracing::{debug, instrument};

use crate::errors::ChoiceError;
use crate::model::{ChoiceControl, ChoiceMatch};
use crate::policy::ChoicePolicyView;
use crate::table;

/// Pattern-major: the first pattern that matches any choice decides, and
/// within a pattern the first choice in document order wins.
pub fn match_choice(control: &ChoiceControl, value: &str) -> Result<ChoiceMatch, ChoiceError> {
    let patterns = table::patterns_for(value)?;
    for pattern in &patterns {
        if let Some(choice) = control
            .choices
            .iter()
            .find(|choice| pattern.is_match(&choice.label))
        {
            return Ok(ChoiceMatch {
                choice: choice.clone(),
                pattern: pattern.as_str().to_string(),
            });
        }
    }
    Err(ChoiceError::NoMatch(value.to_string()))
}

#[instrument(skip_all, fields(group = %control.group, choice = %matched.choice.node))]
pub fn execute(
    doc: &mut Document,
    control: &ChoiceControl,
    matched: &ChoiceMatch,
    policy: &ChoicePolicyView,
) -> Result<String, ChoiceError> {
    if !policy.enabled {
        return Err(ChoiceError::Disabled);
    }
    let node = matched.choice.node;
    doc.set_checked(node, true)?;
    let marker = if matched.choice.label.is_empty() {
        matched.choice.value.clone().unwrap_or_else(|| "on".into())
    } else {
        matched.choice.label.clone()
    };
    doc.set_attr(node, PROVENANCE_ATTR, &marker)?;
    for kind in &policy.notify {
        doc.dispatch(node, *kind, false)?;
    }
    debug!(label = %matched.choice.label, pattern = %matched.pattern, "choice checked");
    Ok(marker)
}
