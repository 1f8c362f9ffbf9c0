use serde::{Deserialize, Serialize};

use host_dom::DomEventKind;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChoicePolicyView {
    pub enabled: bool,
    pub choice_selector: String,
    pub notify: Vec<DomEventKind>,
}

impl Default for ChoicePolicyView {
    fn default() -> Self {
        Self {
            enabled: true,
            choice_selector: "input[type=radio]".into(),
            notify: vec![DomEventKind::Change, DomEventKind::Click],
        }
    }
}
