use serde::{Deserialize, Serialize};

use host_dom::DomEventKind;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextPolicyView {
    pub enabled: bool,
    pub max_text_len: usize,
    /// Control selectors tried in order inside the field group.
    pub control_selectors: Vec<String>,
    /// Notifications fired after the value lands, in order.
    pub notify: Vec<DomEventKind>,
}

impl Default for TextPolicyView {
    fn default() -> Self {
        Self {
            enabled: true,
            max_text_len: 4000,
            control_selectors: vec![
                "textarea".into(),
                "input[type=text], input[type=date], input[type=number], input[type=email], \
                 input[type=tel], input[type=url]"
                    .into(),
                "input".into(),
            ],
            notify: vec![
                DomEventKind::Input,
                DomEventKind::Change,
                DomEventKind::KeyUp,
                DomEventKind::Blur,
            ],
        }
    }
}
