use host_dom::{Document, NodeId};

use crate::errors::SelectError;
use crate::model::{OptionMatch, SelectControl, SelectionState};
use crate::policy::SelectPolicyView;
use crate::{precheck, runner};

/// Two-phase single-select writer: `probe` and `match_option` read,
/// `select` mutates.
#[derive(Clone, Debug, Default)]
pub struct SelectWriter {
    policy: SelectPolicyView,
}

impl SelectWriter {
    pub fn builder() -> SelectWriterBuilder {
        SelectWriterBuilder::new(SelectPolicyView::default())
    }

    pub fn probe(&self, doc: &Document, group: NodeId) -> Result<SelectControl, SelectError> {
        precheck::run_precheck(doc, group, &self.policy)
    }

    pub fn match_option(
        &self,
        control: &SelectControl,
        target: &str,
    ) -> Result<OptionMatch, SelectError> {
        runner::match_option(control, target, &self.policy)
    }

    pub fn select(
        &self,
        doc: &mut Document,
        control: &SelectControl,
        matched: &OptionMatch,
    ) -> Result<SelectionState, SelectError> {
        runner::execute(doc, control, matched, &self.policy)
    }
}

pub struct SelectWriterBuilder {
    policy: SelectPolicyView,
}

impl SelectWriterBuilder {
    pub fn new(policy: SelectPolicyView) -> Self {
        Self { policy }
    }

    pub fn exact_only(mut self) -> Self {
        self.policy.allow_partial = false;
        self
    }

    pub fn with_sentinels(mut self, values: Vec<String>) -> Self {
        self.policy.sentinel_values = values;
        self
    }

    pub fn build(self) -> SelectWriter {
        SelectWriter {
            policy: self.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use autofill_core_types::{ExistingContent, PROVENANCE_ATTR};
    use host_dom::{el, DomEventKind, PageSnapshot};

    use super::*;
    use crate::model::MatchKind;

    fn club_form(selected: Option<&str>) -> (Document, NodeId) {
        let option = |value: &str, text: &str| {
            let node = el("option").attr("value", value).text(text);
            if Some(value) == selected {
                node.attr("selected", "")
            } else {
                node
            }
        };
        let doc = Document::from_snapshot(&PageSnapshot {
            url: "https://forms.example/".into(),
            body: el("body").child(el("div").class("form-group").children([
                el("label").text("Club Name"),
                el("select").children([
                    option("-1", "-- Select your club --"),
                    option("", ""),
                    option("chess", "Chess Club"),
                    option("robotics", "Robotics Society"),
                    option("ski", "Ski and Snowboard Club"),
                ]),
            ])),
        })
        .unwrap();
        let group = doc.query_selector(".form-group").unwrap().unwrap();
        (doc, group)
    }

    #[test]
    fn sentinels_are_not_options() {
        let (doc, group) = club_form(None);
        let control = SelectWriter::default().probe(&doc, group).unwrap();
        assert_eq!(control.options.len(), 3);
        assert_eq!(control.existing, ExistingContent::Empty);
    }

    #[test]
    fn matching_is_bidirectional() {
        let (doc, group) = club_form(None);
        let writer = SelectWriter::default();
        let control = writer.probe(&doc, group).unwrap();

        let exact = writer.match_option(&control, "chess club").unwrap();
        assert_eq!(exact.kind, MatchKind::Exact);

        let partial = writer.match_option(&control, "Robotics Soc").unwrap();
        assert_eq!(partial.option.value, "robotics");
        assert_eq!(partial.kind, MatchKind::OptionContainsValue);

        let wider = writer
            .match_option(&control, "The Ski and Snowboard Club at State")
            .unwrap();
        assert_eq!(wider.option.value, "ski");
        assert_eq!(wider.kind, MatchKind::ValueContainsOption);

        assert_eq!(
            writer.match_option(&control, "Fencing"),
            Err(SelectError::OptionMissing)
        );
    }

    #[test]
    fn exact_only_disables_containment() {
        let (doc, group) = club_form(None);
        let writer = SelectWriter::builder().exact_only().build();
        let control = writer.probe(&doc, group).unwrap();
        assert!(writer.match_option(&control, "Robotics Soc").is_err());
    }

    #[test]
    fn select_marks_provenance_and_notifies() {
        let (mut doc, group) = club_form(None);
        let writer = SelectWriter::default();
        let control = writer.probe(&doc, group).unwrap();
        let matched = writer.match_option(&control, "Chess").unwrap();
        let state = writer.select(&mut doc, &control, &matched).unwrap();
        assert!(state.changed);
        assert_eq!(doc.value(control.node), Some("chess"));
        assert_eq!(doc.attr(control.node, PROVENANCE_ATTR), Some("chess"));
        assert_eq!(
            doc.events_for(control.node),
            vec![DomEventKind::Input, DomEventKind::Change]
        );

        let again = writer.probe(&doc, group).unwrap();
        assert_eq!(again.existing, ExistingContent::OwnWrite("chess".into()));
    }

    #[test]
    fn host_preselection_is_foreign() {
        let (doc, group) = club_form(Some("ski"));
        let control = SelectWriter::default().probe(&doc, group).unwrap();
        assert!(control.existing.is_foreign());
    }
}
