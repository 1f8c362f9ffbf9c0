use serde::{Deserialize, Serialize};

use host_dom::DomEventKind;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectPolicyView {
    pub enabled: bool,
    /// Option values meaning "nothing chosen".
    pub sentinel_values: Vec<String>,
    /// Allow the containment passes after an exact match fails.
    pub allow_partial: bool,
    pub notify: Vec<DomEventKind>,
}

impl SelectPolicyView {
    pub fn is_sentinel(&self, value: &str) -> bool {
        let value = value.trim();
        self.sentinel_values.iter().any(|s| s == value)
    }
}

impl Default for SelectPolicyView {
    fn default() -> Self {
        Self {
            enabled: true,
            sentinel_values: vec![String::new(), "-1".into()],
            allow_partial: true,
            notify: vec![DomEventKind::Input, DomEventKind::Change],
        }
    }
}
