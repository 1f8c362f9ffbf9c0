use host_dom::{Document, NodeId};

use crate::errors::ChoiceError;
use crate::model::{ChoiceControl, ChoiceMatch};
use crate::policy::ChoicePolicyView;
use crate::{precheck, runner};

/// Two-phase choice-group writer.
#[derive(Clone, Debug, Default)]
pub struct ChoiceWriter {
    policy: ChoicePolicyView,
}

impl ChoiceWriter {
    pub fn builder() -> ChoiceWriterBuilder {
        ChoiceWriterBuilder::new(ChoicePolicyView::default())
    }

    pub fn probe(&self, doc: &Document, group: NodeId) -> Result<ChoiceControl, ChoiceError> {
        precheck::run_precheck(doc, group, &self.policy)
    }

    pub fn match_choice(
        &self,
        control: &ChoiceControl,
        value: &str,
    ) -> Result<ChoiceMatch, ChoiceError> {
        runner::match_choice(control, value)
    }

    /// Checks the matched choice; returns the provenance marker written.
    pub fn check(
        &self,
        doc: &mut Document,
        control: &ChoiceControl,
        matched: &ChoiceMatch,
    ) -> Result<String, ChoiceError> {
        runner::execute(doc, control, matched, &self.policy)
    }
}

pub struct ChoiceWriterBuilder {
    policy: ChoicePolicyView,
}

impl ChoiceWriterBuilder {
    pub fn new(policy: ChoicePolicyView) -> Self {
        Self { policy }
    }

    pub fn with_choice_selector(mut self, selector: impl Into<String>) -> Self {
        self.policy.choice_selector = selector.into();
        self
    }

    pub fn build(self) -> ChoiceWriter {
        ChoiceWriter {
            policy: self.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use autofill_core_types::ExistingContent;
    use host_dom::{el, DomEventKind, NodeSnapshot, PageSnapshot};

    use super::*;

    fn radio(id: &str, label: &str) -> [NodeSnapshot; 2] {
        [
            el("input")
                .attr("type", "radio")
                .attr("name", "payment")
                .attr("value", id)
                .id(id),
            el("label").attr("for", id).text(label),
        ]
    }

    fn payment_form() -> (Document, NodeId) {
        let mut group = el("fieldset").class("form-group").child(el("legend").text("Payment Method"));
        for (id, label) in [
            ("pm-with", "Club Spending Card (with additional funding)"),
            ("pm-without", "Club Spending Card (without additional funding)"),
            ("pm-oop", "Out of pocket"),
        ] {
            group = group.children(radio(id, label));
        }
        let doc = Document::from_snapshot(&PageSnapshot {
            url: "https://forms.example/".into(),
            body: el("body").child(group),
        })
        .unwrap();
        let group = doc.query_selector("fieldset").unwrap().unwrap();
        (doc, group)
    }

    #[test]
    fn with_extra_funding_picks_the_with_choice() {
        let (mut doc, group) = payment_form();
        let writer = ChoiceWriter::default();
        let control = writer.probe(&doc, group).unwrap();
        assert_eq!(control.choices.len(), 3);
        assert_eq!(control.existing, ExistingContent::Empty);

        let matched = writer.match_choice(&control, "club_card_with_extra").unwrap();
        assert_eq!(matched.choice.value.as_deref(), Some("pm-with"));
        writer.check(&mut doc, &control, &matched).unwrap();

        let with = doc.get_element_by_id("pm-with").unwrap();
        assert!(doc.element(with).unwrap().is_checked());
        assert_eq!(
            doc.events_for(with),
            vec![DomEventKind::Change, DomEventKind::Click]
        );
        let again = writer.probe(&doc, group).unwrap();
        assert!(matches!(again.existing, ExistingContent::OwnWrite(_)));
    }

    #[test]
    fn without_and_out_of_pocket_resolve() {
        let (doc, group) = payment_form();
        let writer = ChoiceWriter::default();
        let control = writer.probe(&doc, group).unwrap();
        let without = writer.match_choice(&control, "club_card_without_extra").unwrap();
        assert_eq!(without.choice.value.as_deref(), Some("pm-without"));
        let oop = writer.match_choice(&control, "out_of_pocket").unwrap();
        assert_eq!(oop.choice.value.as_deref(), Some("pm-oop"));
    }

    #[test]
    fn unmatched_value_is_reported() {
        let (doc, group) = payment_form();
        let writer = ChoiceWriter::default();
        let control = writer.probe(&doc, group).unwrap();
        assert_eq!(
            writer.match_choice(&control, "crypto"),
            Err(ChoiceError::NoMatch("crypto".into()))
        );
    }

    #[test]
    fn wrapping_labels_and_trailing_text_are_read() {
        let doc = Document::from_snapshot(&PageSnapshot {
            url: "https://forms.example/".into(),
            body: el("body").child(el("div").attr("role", "radiogroup").children([
                el("label").child(el("input").attr("type", "radio").attr("name", "t")).child(
                    NodeSnapshot::text_node(" Food / Meals "),
                ),
                el("span").children([
                    el("input").attr("type", "radio").attr("name", "t"),
                    el("span").text("Supplies"),
                ]),
            ])),
        })
        .unwrap();
        let group = doc.query_selector("[role=radiogroup]").unwrap().unwrap();
        let control = ChoiceWriter::default().probe(&doc, group).unwrap();
        let labels: Vec<_> = control.choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Food / Meals", "Supplies"]);
    }

    #[test]
    fn user_choice_is_foreign() {
        let (doc, group) = payment_form();
        let oop = doc.get_element_by_id("pm-oop").unwrap();
        let mut doc = doc;
        doc.set_checked(oop, true).unwrap();
        let control = ChoiceWriter::default().probe(&doc, group).unwrap();
        assert_eq!(
            control.existing,
            ExistingContent::Foreign("Out of pocket".into())
        );
    }
}
