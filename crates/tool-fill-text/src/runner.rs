use autofill_core_types::PROVENANCE_ATTR;
use host_dom::Document;
use tracing::{debug, instrument};

use crate::errors::TextFillError;
use crate::format;
use crate::model::{TextControl, TextWriteReport};
use crate::policy::TextPolicyView;

/// Writes `value`, stamps provenance and fires the host's expected
/// notifications (untrusted) in policy order.
#[instrument(skip_all, fields(node = %control.node))]
pub fn execute(
    doc: &mut Document,
    control: &TextControl,
    value: &str,
    policy: &TextPolicyView,
) -> Result<TextWriteReport, TextFillError> {
    if !policy.enabled {
        return Err(TextFillError::Disabled);
    }
    let written = format::for_control(value.trim(), &control.input_type);
    let limit = control
        .maxlength
        .map_or(policy.max_text_len, |max| max.min(policy.max_text_len));
    if written.chars().count() > limit {
        return Err(TextFillError::TextTooLong(limit));
    }

    doc.set_value(control.node, &written)?;
    doc.set_attr(control.node, PROVENANCE_ATTR, &written)?;
    for kind in &policy.notify {
        doc.dispatch(control.node, *kind, false)?;
    }
    debug!(input_type = %control.input_type, "text value written");

    Ok(TextWriteReport {
        node: control.node,
        written,
        events: policy.notify.clone(),
    })
}
