//! Review annotations on field groups.
//!
//! Two states: low-confidence (amber background, red outline, dismissable
//! tooltip with the score) and unknown (same treatment plus a persistent
//! warning). Re-annotating a group updates the existing elements.

use host_dom::{DomError, DomEventKind, Document, ListenerAction, NodeId, Phase};

pub const REVIEW_ATTR: &str = "data-autofill-review";
pub const TOOLTIP_CLASS: &str = "autofill-tooltip";
pub const WARNING_CLASS: &str = "autofill-unknown-warning";

const BACKGROUND: &str = "#fff7e0";
const OUTLINE: &str = "2px solid #d93025";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReviewState {
    LowConfidence,
    Unknown,
}

impl ReviewState {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewState::LowConfidence => "low-confidence",
            ReviewState::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Annotator;

impl Annotator {
    pub fn new() -> Self {
        Self
    }

    pub fn mark_low_confidence(
        &self,
        doc: &mut Document,
        group: NodeId,
        confidence: f64,
    ) -> Result<(), DomError> {
        self.highlight(doc, group, ReviewState::LowConfidence)?;
        let text = format!(
            "Low confidence ({:.0}%). Please double-check this value.",
            confidence * 100.0
        );
        self.upsert_tooltip(doc, group, &text)
    }

    pub fn mark_unknown(
        &self,
        doc: &mut Document,
        group: NodeId,
        reason: &str,
    ) -> Result<(), DomError> {
        self.highlight(doc, group, ReviewState::Unknown)?;
        self.replace_warning(doc, group, reason)
    }

    /// Removes every trace of a previous annotation.
    pub fn clear(&self, doc: &mut Document, group: NodeId) -> Result<(), DomError> {
        if doc.attr(group, REVIEW_ATTR).is_none() {
            return Ok(());
        }
        doc.remove_attr(group, REVIEW_ATTR)?;
        doc.remove_style(group, "background-color")?;
        doc.remove_style(group, "outline")?;
        let stale = doc.query_in(group, &format!(".{TOOLTIP_CLASS}, .{WARNING_CLASS}"))?;
        for node in stale {
            if doc.is_attached(node) {
                doc.remove(node)?;
            }
        }
        Ok(())
    }

    pub fn state(&self, doc: &Document, group: NodeId) -> Option<ReviewState> {
        match doc.attr(group, REVIEW_ATTR)? {
            "low-confidence" => Some(ReviewState::LowConfidence),
            "unknown" => Some(ReviewState::Unknown),
            _ => None,
        }
    }

    fn highlight(
        &self,
        doc: &mut Document,
        group: NodeId,
        state: ReviewState,
    ) -> Result<(), DomError> {
        doc.set_style(group, "background-color", BACKGROUND)?;
        doc.set_style(group, "outline", OUTLINE)?;
        doc.set_attr(group, REVIEW_ATTR, state.as_str())
    }

    fn upsert_tooltip(&self, doc: &mut Document, group: NodeId, text: &str) -> Result<(), DomError> {
        let text_selector = format!(".{TOOLTIP_CLASS} .{TOOLTIP_CLASS}-text");
        if let Some(existing) = doc.query_first_in(group, &text_selector)? {
            return doc.set_text(existing, text);
        }

        let tooltip = doc.create_element("div");
        doc.set_attr(tooltip, "class", TOOLTIP_CLASS)?;
        doc.set_attr(tooltip, "role", "tooltip")?;

        let body = doc.create_element("span");
        doc.set_attr(body, "class", &format!("{TOOLTIP_CLASS}-text"))?;
        doc.set_text(body, text)?;
        doc.append_child(tooltip, body)?;

        let dismiss = doc.create_element("button");
        doc.set_attr(dismiss, "type", "button")?;
        doc.set_attr(dismiss, "class", &format!("{TOOLTIP_CLASS}-dismiss"))?;
        doc.set_attr(dismiss, "aria-label", "Dismiss")?;
        doc.set_text(dismiss, "×")?;
        doc.append_child(tooltip, dismiss)?;
        doc.add_listener(
            dismiss,
            DomEventKind::Click,
            Phase::Bubble,
            ListenerAction::RemoveClosest(format!(".{TOOLTIP_CLASS}")),
        );

        doc.append_child(group, tooltip)
    }

    /// Keeps exactly one warning per group, carrying the latest reason.
    fn replace_warning(&self, doc: &mut Document, group: NodeId, reason: &str) -> Result<(), DomError> {
        let mut existing = doc.query_in(group, &format!(".{WARNING_CLASS}"))?.into_iter();
        if let Some(keep) = existing.next() {
            for duplicate in existing {
                doc.remove(duplicate)?;
            }
            doc.set_attr(keep, "title", reason)?;
            return Ok(());
        }

        let warning = doc.create_element("div");
        doc.set_attr(warning, "class", WARNING_CLASS)?;
        doc.set_attr(warning, "role", "note")?;
        doc.set_attr(warning, "title", reason)?;
        doc.set_text(warning, "⚠ Needs your input")?;
        doc.append_child(group, warning)
    }
}

#[cfg(test)]
mod tests {
    use host_dom::{el, PageSnapshot};

    use super::*;

    fn doc_with_group() -> (Document, NodeId) {
        let doc = Document::from_snapshot(&PageSnapshot {
            url: "https://forms.example/".into(),
            body: el("body").child(
                el("div")
                    .class("form-group")
                    .id("g")
                    .children([el("label").text("Description"), el("textarea")]),
            ),
        })
        .unwrap();
        let group = doc.get_element_by_id("g").unwrap();
        (doc, group)
    }

    #[test]
    fn low_confidence_tooltip_is_updated_in_place() {
        let (mut doc, group) = doc_with_group();
        let annotator = Annotator::new();
        annotator.mark_low_confidence(&mut doc, group, 0.7).unwrap();
        annotator.mark_low_confidence(&mut doc, group, 0.65).unwrap();

        let tooltips = doc.query_in(group, ".autofill-tooltip").unwrap();
        assert_eq!(tooltips.len(), 1);
        assert!(doc.text_content(tooltips[0]).contains("65%"));
        assert_eq!(annotator.state(&doc, group), Some(ReviewState::LowConfidence));
        assert_eq!(doc.style_value(group, "background-color").as_deref(), Some(BACKGROUND));
        assert_eq!(doc.style_value(group, "outline").as_deref(), Some(OUTLINE));
    }

    #[test]
    fn tooltip_can_be_dismissed() {
        let (mut doc, group) = doc_with_group();
        Annotator::new().mark_low_confidence(&mut doc, group, 0.6).unwrap();
        let dismiss = doc
            .query_first_in(group, ".autofill-tooltip-dismiss")
            .unwrap()
            .unwrap();
        doc.dispatch(dismiss, DomEventKind::Click, true).unwrap();
        assert!(doc.query_in(group, ".autofill-tooltip").unwrap().is_empty());
        // The highlight itself stays until cleared.
        assert_eq!(doc.attr(group, REVIEW_ATTR), Some("low-confidence"));
    }

    #[test]
    fn unknown_warning_is_not_duplicated() {
        let (mut doc, group) = doc_with_group();
        let annotator = Annotator::new();
        annotator.mark_unknown(&mut doc, group, "first").unwrap();
        annotator.mark_unknown(&mut doc, group, "second").unwrap();

        let warnings = doc.query_in(group, ".autofill-unknown-warning").unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(doc.attr(warnings[0], "title"), Some("second"));
        assert_eq!(annotator.state(&doc, group), Some(ReviewState::Unknown));
    }

    #[test]
    fn clear_removes_annotations() {
        let (mut doc, group) = doc_with_group();
        let annotator = Annotator::new();
        annotator.mark_low_confidence(&mut doc, group, 0.6).unwrap();
        annotator.mark_unknown(&mut doc, group, "why").unwrap();
        annotator.clear(&mut doc, group).unwrap();

        assert_eq!(annotator.state(&doc, group), None);
        assert!(doc.query_in(group, ".autofill-tooltip, .autofill-unknown-warning").unwrap().is_empty());
        assert_eq!(doc.attr(group, "style"), None);
    }

    #[test]
    fn clear_keeps_host_styling() {
        let (mut doc, group) = doc_with_group();
        doc.set_attr(group, "style", "display: flex").unwrap();
        let annotator = Annotator::new();
        annotator.mark_unknown(&mut doc, group, "empty").unwrap();
        assert_eq!(doc.style_value(group, "outline").as_deref(), Some(OUTLINE));
        annotator.clear(&mut doc, group).unwrap();

        assert_eq!(doc.attr(group, "style"), Some("display: flex"));
        assert_eq!(doc.style_value(group, "background-color"), None);
    }
}
