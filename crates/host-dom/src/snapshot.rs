//! JSON page snapshots.
//!
//! Pages are loaded from and written back to a small tree format. Live form
//! state is folded into attributes on the way out (`value`, `checked`,
//! `selected`) and read back from them on the way in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::errors::DomError;
use crate::node::{AttachedFile, NodeData, NodeId};

pub const TEXT_TAG: &str = "#text";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Leading text of an element, or the content of a `#text` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<AttachedFile>,
}

impl NodeSnapshot {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn text_node(text: &str) -> Self {
        Self {
            tag: TEXT_TAG.to_string(),
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: NodeSnapshot) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeSnapshot>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Shorthand for [`NodeSnapshot::element`].
pub fn el(tag: &str) -> NodeSnapshot {
    NodeSnapshot::element(tag)
}

/// A whole page as stored on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub body: NodeSnapshot,
}

impl Document {
    pub fn from_snapshot(page: &PageSnapshot) -> Result<Self, DomError> {
        let mut doc = Document::new(page.url.clone());
        let body = doc.body();
        doc.load_into(body, &page.body)?;
        doc.take_outbox();
        Ok(doc)
    }

    /// Builds `snapshot` under `parent`. A `body` snapshot merges into the
    /// document body instead of nesting a second one.
    pub fn load_into(&mut self, parent: NodeId, snapshot: &NodeSnapshot) -> Result<NodeId, DomError> {
        if snapshot.tag == "body" && parent == self.body() {
            self.apply_snapshot(parent, snapshot)?;
            return Ok(parent);
        }
        let node = self.build(snapshot)?;
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Creates a detached subtree from `snapshot`.
    pub fn build(&mut self, snapshot: &NodeSnapshot) -> Result<NodeId, DomError> {
        if snapshot.tag == TEXT_TAG {
            return Ok(self.create_text(snapshot.text.as_deref().unwrap_or("")));
        }
        let node = self.create_element(&snapshot.tag);
        self.apply_snapshot(node, snapshot)?;
        Ok(node)
    }

    fn apply_snapshot(&mut self, node: NodeId, snapshot: &NodeSnapshot) -> Result<(), DomError> {
        for (name, value) in &snapshot.attrs {
            self.set_attr(node, name, value)?;
        }
        let tag = snapshot.tag.to_ascii_lowercase();
        if let Some(text) = snapshot.text.as_deref() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node)?;
        }
        for child in &snapshot.children {
            let built = self.build(child)?;
            self.append_child(node, built)?;
        }

        match tag.as_str() {
            "input" => {
                if let Some(value) = snapshot.attrs.get("value") {
                    self.set_value(node, value)?;
                }
                if snapshot.attrs.contains_key("checked") {
                    self.set_checked(node, true)?;
                }
                if !snapshot.files.is_empty() {
                    self.set_files(node, snapshot.files.clone())?;
                }
            }
            "textarea" => {
                let initial = snapshot.text.clone().unwrap_or_default();
                self.set_value(node, &initial)?;
            }
            "select" => {
                let options = self.query_in(node, "option")?;
                let chosen = options
                    .iter()
                    .copied()
                    .find(|o| self.element(*o).is_some_and(|el| el.has_attr("selected")))
                    .or_else(|| options.first().copied());
                if let Some(option) = chosen {
                    self.select_option(node, option)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn to_page_snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            url: self.url().to_string(),
            body: self.snapshot(self.body()),
        }
    }

    /// Serialisable view of `node`'s subtree including live form state.
    pub fn snapshot(&self, node: NodeId) -> NodeSnapshot {
        let Some(data) = self.node(node).map(|n| &n.data) else {
            return NodeSnapshot::default();
        };
        let element = match data {
            NodeData::Text(text) => return NodeSnapshot::text_node(text),
            NodeData::Element(element) => element,
        };

        let mut out = NodeSnapshot::element(&element.tag);
        for (name, value) in element.attrs() {
            out.attrs.insert(name.to_string(), value.to_string());
        }
        match element.tag.as_str() {
            "input" => {
                match element.value() {
                    Some(value) if element.input_type().as_deref() != Some("file") => {
                        out.attrs.insert("value".into(), value.to_string());
                    }
                    _ => {}
                }
                if element.is_checked() {
                    out.attrs.insert("checked".into(), String::new());
                } else {
                    out.attrs.remove("checked");
                }
                out.files = element.files().to_vec();
            }
            "option" => {
                if element.is_selected() {
                    out.attrs.insert("selected".into(), String::new());
                } else {
                    out.attrs.remove("selected");
                }
            }
            "textarea" => {
                let value = element.value().unwrap_or("");
                if !value.is_empty() {
                    out.text = Some(value.to_string());
                }
                return out;
            }
            _ => {}
        }

        let children = self.children(node);
        let mut rest = children;
        if let Some(first) = children.first() {
            if let Some(NodeData::Text(text)) = self.node(*first).map(|n| &n.data) {
                out.text = Some(text.clone());
                rest = &children[1..];
            }
        }
        out.children = rest.iter().map(|child| self.snapshot(*child)).collect();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageSnapshot {
        PageSnapshot {
            url: "https://forms.example/step-1".into(),
            body: el("body").child(
                el("form").children([
                    el("div").class("form-group").children([
                        el("label").text("Vendor Name"),
                        el("input").attr("type", "text").attr("value", "Other Co."),
                    ]),
                    el("div").class("form-group").children([
                        el("label").text("Club Name"),
                        el("select").children([
                            el("option").attr("value", "").text("Select..."),
                            el("option").attr("value", "chess").attr("selected", "").text("Chess Club"),
                        ]),
                    ]),
                    el("textarea").text("prefilled"),
                ]),
            ),
        }
    }

    #[test]
    fn load_restores_live_state() {
        let doc = Document::from_snapshot(&page()).unwrap();
        let input = doc.query_selector("input").unwrap().unwrap();
        assert_eq!(doc.value(input), Some("Other Co."));
        let select = doc.query_selector("select").unwrap().unwrap();
        assert_eq!(doc.value(select), Some("chess"));
        let textarea = doc.query_selector("textarea").unwrap().unwrap();
        assert_eq!(doc.value(textarea), Some("prefilled"));
    }

    #[test]
    fn snapshot_reflects_writes() {
        let mut doc = Document::from_snapshot(&page()).unwrap();
        let textarea = doc.query_selector("textarea").unwrap().unwrap();
        doc.set_value(textarea, "Lunch").unwrap();
        let out = doc.to_page_snapshot();
        let json = serde_json::to_string(&out).unwrap();
        let reparsed: PageSnapshot = serde_json::from_str(&json).unwrap();
        let reloaded = Document::from_snapshot(&reparsed).unwrap();
        let textarea = reloaded.query_selector("textarea").unwrap().unwrap();
        assert_eq!(reloaded.value(textarea), Some("Lunch"));
        assert_eq!(reloaded.query_selector_all(".form-group").unwrap().len(), 2);
    }
}
