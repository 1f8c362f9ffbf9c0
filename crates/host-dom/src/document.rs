//! Arena-backed host document.
//!
//! The document is plain data: it never awaits and never publishes on its
//! own. Page-level notifications are queued in an outbox that `HostPage`
//! drains after releasing its lock.

use std::sync::Arc;

use tracing::trace;

use crate::errors::{DomError, SelectorError};
use crate::events::{
    DispatchOutcome, DomEvent, DomEventKind, Listener, ListenerAction, ListenerId, PageEvent,
    Phase, Visibility,
};
use crate::node::{AttachedFile, ElementData, Node, NodeData, NodeId};
use crate::script::HostScript;
use crate::selector::SelectorList;

pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    url: String,
    history: Vec<String>,
    visibility: Visibility,
    focused: Option<NodeId>,
    listeners: Vec<Listener>,
    next_listener: u64,
    scripts: Vec<Arc<dyn HostScript>>,
    journal: Vec<DomEvent>,
    seq: u64,
    outbox: Vec<PageEvent>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("nodes", &self.nodes.len())
            .field("visibility", &self.visibility)
            .field("scripts", &self.scripts.len())
            .finish()
    }
}

impl Document {
    pub fn new(url: impl Into<String>) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            url: url.into(),
            history: Vec::new(),
            visibility: Visibility::Visible,
            focused: None,
            listeners: Vec::new(),
            next_listener: 0,
            scripts: Vec::new(),
            journal: Vec::new(),
            seq: 0,
            outbox: Vec::new(),
        };
        let root = doc.push_node(Node::element("html"));
        let body = doc.push_node(Node::element("body"));
        doc.nodes[root.0].children.push(body);
        doc.nodes[body.0].parent = Some(root);
        doc.root = root;
        doc.body = body;
        doc
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Pushes a history entry without any notification, the way a
    /// single-page app rewrites the location.
    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if url != self.url {
            let previous = std::mem::replace(&mut self.url, url);
            self.history.push(previous);
        }
    }

    /// Back navigation. Returns the restored URL, if any.
    pub fn history_back(&mut self) -> Option<String> {
        let previous = self.history.pop()?;
        self.url = previous.clone();
        self.outbox.push(PageEvent::HistoryPopped {
            url: previous.clone(),
        });
        Some(previous)
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, state: Visibility) {
        if self.visibility != state {
            self.visibility = state;
            self.outbox.push(PageEvent::VisibilityChanged { state });
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|id| self.is_attached(*id))
    }

    pub(crate) fn set_focused(&mut self, node: Option<NodeId>) {
        self.focused = node;
    }

    // ---- node access -------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).and_then(Node::as_element)
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(DomError::UnknownNode(id.0))?;
        node.as_element_mut().ok_or(DomError::NotAnElement(id.0))
    }

    fn checked_element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        let node = self.node(id).ok_or(DomError::UnknownNode(id.0))?;
        node.as_element().ok_or(DomError::NotAnElement(id.0))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Ancestors from the root down to (and including) `id`.
    fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cursor = self.parent(id);
        while let Some(parent) = cursor {
            path.push(parent);
            cursor = self.parent(parent);
        }
        path.reverse();
        path
    }

    // ---- queries -----------------------------------------------------

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        self.query_in(self.root, selector)
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Matches within the subtree of `scope`, excluding `scope` itself.
    pub fn query_in(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|id| list.matches(self, *id))
            .collect())
    }

    pub fn query_first_in(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        Ok(self.query_in(scope, selector)?.into_iter().next())
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(list.matches(self, node))
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if list.matches(self, current) {
                return Ok(Some(current));
            }
            cursor = self.parent(current);
        }
        Ok(None)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|node| self.element(*node).and_then(ElementData::id) == Some(id))
    }

    pub fn text_content(&self, node: NodeId) -> String {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Text(text)) => text.clone(),
            Some(NodeData::Element(_)) => self
                .descendants(node)
                .into_iter()
                .filter_map(|id| match self.node(id).map(|n| &n.data) {
                    Some(NodeData::Text(text)) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.element(node).and_then(ElementData::value)
    }

    pub fn style_value(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attr(node, "style")?;
        parse_style(style)
            .into_iter()
            .find(|(key, _)| key == property)
            .map(|(_, value)| value)
    }

    fn hides_itself(&self, node: NodeId) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };
        element.has_attr("hidden")
            || element.input_type().as_deref() == Some("hidden")
            || self.style_value(node, "display").as_deref() == Some("none")
            || self.style_value(node, "visibility").as_deref() == Some("hidden")
    }

    /// Attached and not hidden by itself or any ancestor.
    pub fn is_visible(&self, node: NodeId) -> bool {
        if !self.is_attached(node) {
            return false;
        }
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.hides_itself(current) {
                return false;
            }
            cursor = self.parent(current);
        }
        true
    }

    // ---- mutations ---------------------------------------------------

    fn note_mutation(&mut self, structural: bool) {
        if let Some(PageEvent::Mutated { structural: pending }) = self.outbox.last_mut() {
            *pending |= structural;
            return;
        }
        self.outbox.push(PageEvent::Mutated { structural });
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(Node::element(tag))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(Node::text(text))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` under `parent` before `reference` (or last). Moves
    /// the child if it is already attached elsewhere.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.checked_element(parent)?;
        if self.node(child).is_none() {
            return Err(DomError::UnknownNode(child.0));
        }
        if self.contains(child, parent) {
            return Err(DomError::Cycle { child: child.0 });
        }
        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let position = reference
            .and_then(|r| siblings.iter().position(|s| *s == r))
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        self.note_mutation(true);
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if self.node(node).is_none() {
            return Err(DomError::UnknownNode(node.0));
        }
        if node == self.root || node == self.body {
            return Err(DomError::Detached(node.0));
        }
        if self.parent(node).is_some() {
            self.detach(node);
            self.note_mutation(true);
        }
        Ok(())
    }

    /// Removes every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) -> Result<(), DomError> {
        self.checked_element(node)?;
        let children = std::mem::take(&mut self.nodes[node.0].children);
        if children.is_empty() {
            return Ok(());
        }
        for child in children {
            self.nodes[child.0].parent = None;
        }
        self.note_mutation(true);
        Ok(())
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if self.element_mut(node)?.set_attr(name, value) {
            self.note_mutation(false);
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        if self.element_mut(node)?.remove_attr(name) {
            self.note_mutation(false);
        }
        Ok(())
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let mut entries = parse_style(self.checked_element(node)?.attr("style").unwrap_or(""));
        match entries.iter_mut().find(|(key, _)| key == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None => entries.push((property.to_string(), value.to_string())),
        }
        self.write_style(node, &entries)
    }

    /// Drops one inline style property, keeping every other declaration.
    pub fn remove_style(&mut self, node: NodeId, property: &str) -> Result<(), DomError> {
        let Some(style) = self.checked_element(node)?.attr("style") else {
            return Ok(());
        };
        let mut entries = parse_style(style);
        let before = entries.len();
        entries.retain(|(key, _)| key != property);
        if entries.len() == before {
            return Ok(());
        }
        self.write_style(node, &entries)
    }

    fn write_style(&mut self, node: NodeId, entries: &[(String, String)]) -> Result<(), DomError> {
        if entries.is_empty() {
            return self.remove_attr(node, "style");
        }
        let rendered = entries
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(node, "style", &rendered)
    }

    /// Replaces all children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        if self.text_content(node) == text && self.children(node).len() <= 1 {
            return Ok(());
        }
        self.clear_children(node)?;
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node)?;
        }
        Ok(())
    }

    /// Sets the live `value` of a form control. Does not fire events.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.element_mut(node)?.value = Some(value.to_string());
        Ok(())
    }

    /// Checks or unchecks a checkable input. Checking a radio unchecks the
    /// other radios sharing its `name`.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<(), DomError> {
        let element = self.checked_element(node)?;
        let radio_name = (element.input_type().as_deref() == Some("radio"))
            .then(|| element.attr("name").map(str::to_string))
            .flatten();
        if checked {
            if let Some(name) = radio_name {
                let peers: Vec<NodeId> = self
                    .descendants(self.root)
                    .into_iter()
                    .filter(|id| *id != node)
                    .filter(|id| {
                        self.element(*id).is_some_and(|el| {
                            el.input_type().as_deref() == Some("radio")
                                && el.attr("name") == Some(name.as_str())
                        })
                    })
                    .collect();
                for peer in peers {
                    self.element_mut(peer)?.checked = false;
                }
            }
        }
        self.element_mut(node)?.checked = checked;
        Ok(())
    }

    /// Selects `option` inside `select`, deselecting its siblings and
    /// updating the select's value.
    pub fn select_option(&mut self, select: NodeId, option: NodeId) -> Result<(), DomError> {
        self.checked_element(select)?;
        let options: Vec<NodeId> = self
            .descendants(select)
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(|el| el.tag == "option"))
            .collect();
        if !options.contains(&option) {
            return Err(DomError::Detached(option.0));
        }
        for id in &options {
            self.element_mut(*id)?.selected = *id == option;
        }
        let value = self.option_value(option);
        self.element_mut(select)?.value = Some(value);
        Ok(())
    }

    /// An option's submitted value: its `value` attribute, else its text.
    pub fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text_content(option).trim().to_string())
    }

    pub fn set_files(&mut self, input: NodeId, files: Vec<AttachedFile>) -> Result<(), DomError> {
        let element = self.element_mut(input)?;
        element.value = files.first().map(|f| format!("C:\\fakepath\\{}", f.name));
        element.files = files;
        Ok(())
    }

    // ---- events ------------------------------------------------------

    pub fn add_listener(
        &mut self,
        node: NodeId,
        kind: DomEventKind,
        phase: Phase,
        action: ListenerAction,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener {
            id,
            node,
            kind,
            phase,
            action,
        });
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        before != self.listeners.len()
    }

    pub fn listeners_on(&self, node: NodeId) -> impl Iterator<Item = &Listener> {
        self.listeners.iter().filter(move |l| l.node == node)
    }

    pub fn install_script(&mut self, script: Arc<dyn HostScript>) {
        trace!(script = script.name(), "host script installed");
        self.scripts.push(script);
    }

    pub fn journal(&self) -> &[DomEvent] {
        &self.journal
    }

    /// Event kinds delivered to `node`, in dispatch order.
    pub fn events_for(&self, node: NodeId) -> Vec<DomEventKind> {
        self.journal
            .iter()
            .filter(|e| e.target == node)
            .map(|e| e.kind)
            .collect()
    }

    fn record(&mut self, target: NodeId, kind: DomEventKind, trusted: bool) -> DomEvent {
        self.seq += 1;
        let event = DomEvent {
            target,
            kind,
            trusted,
            seq: self.seq,
        };
        self.journal.push(event.clone());
        event
    }

    /// Dispatches `kind` at `target`: capture listeners root to target,
    /// bubble listeners target to root, host scripts, then the default
    /// action unless prevented.
    pub fn dispatch(
        &mut self,
        target: NodeId,
        kind: DomEventKind,
        trusted: bool,
    ) -> Result<DispatchOutcome, DomError> {
        if self.node(target).is_none() {
            return Err(DomError::UnknownNode(target.0));
        }
        let event = self.record(target, kind, trusted);
        let path = self.path_to(target);

        let mut order: Vec<(NodeId, Phase)> = path.iter().map(|n| (*n, Phase::Capture)).collect();
        order.extend(path.iter().rev().map(|n| (*n, Phase::Bubble)));

        let mut outcome = DispatchOutcome::default();
        let mut removals: Vec<(NodeId, String)> = Vec::new();
        'walk: for (node, phase) in order {
            let matching: Vec<Listener> = self
                .listeners
                .iter()
                .filter(|l| l.node == node && l.kind == kind && l.phase == phase)
                .cloned()
                .collect();
            for listener in matching {
                match listener.action {
                    ListenerAction::PreventDefault => outcome.default_prevented = true,
                    ListenerAction::Intercept { tag } => {
                        outcome.default_prevented = true;
                        outcome.intercepted = true;
                        self.outbox.push(PageEvent::Intercepted { target, tag });
                        break 'walk;
                    }
                    ListenerAction::RemoveClosest(selector) => {
                        removals.push((listener.node, selector));
                    }
                }
            }
        }

        for (node, selector) in removals {
            if let Ok(Some(container)) = self.closest(node, &selector) {
                self.remove(container)?;
            }
        }

        if trusted && kind.is_interaction() {
            self.outbox.push(PageEvent::UserActivity { kind, target });
        }
        if kind == DomEventKind::Click {
            self.outbox.push(PageEvent::Clicked { target, trusted });
        }

        if !outcome.intercepted {
            let scripts = self.scripts.clone();
            for script in scripts {
                script.on_event(self, &event);
            }
        }

        if !outcome.default_prevented && kind == DomEventKind::Click {
            self.click_default_action(target, trusted)?;
        }
        Ok(outcome)
    }

    fn click_default_action(&mut self, target: NodeId, trusted: bool) -> Result<(), DomError> {
        let Some(element) = self.element(target) else {
            return Ok(());
        };
        match element.input_type().as_deref() {
            Some("radio") => return self.set_checked(target, true),
            Some("checkbox") => {
                let next = !element.is_checked();
                return self.set_checked(target, next);
            }
            _ => {}
        }
        if let Some(input) = self.file_chooser_target(target) {
            self.record(input, DomEventKind::FileChooserOpened, trusted);
        }
        Ok(())
    }

    fn is_file_input(&self, node: NodeId) -> bool {
        self.element(node)
            .and_then(ElementData::input_type)
            .as_deref()
            == Some("file")
    }

    /// The file input a click on `target` would open, if any.
    pub fn file_chooser_target(&self, target: NodeId) -> Option<NodeId> {
        if self.is_file_input(target) {
            return Some(target);
        }
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            if let Some(element) = self.element(current) {
                let referenced = if element.tag == "label" {
                    element.attr("for")
                } else {
                    element.attr("data-file-input")
                };
                if let Some(input) = referenced.and_then(|id| self.get_element_by_id(id)) {
                    if self.is_file_input(input) {
                        return Some(input);
                    }
                }
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Moves focus, dispatching blur on the previous element and focus on
    /// the new one.
    pub fn focus(&mut self, node: NodeId, trusted: bool) -> Result<(), DomError> {
        if let Some(previous) = self.focused() {
            if previous == node {
                return Ok(());
            }
            self.dispatch(previous, DomEventKind::Blur, trusted)?;
        }
        self.set_focused(Some(node));
        self.dispatch(node, DomEventKind::Focus, trusted)?;
        Ok(())
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<PageEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Replaces the content of `body`, used by navigation.
    pub(crate) fn reset_body(&mut self) -> Result<(), DomError> {
        let body = self.body;
        self.focused = None;
        self.clear_children(body)
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            (!key.is_empty()).then_some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_form() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("https://forms.example/page1");
        let group = doc.create_element("div");
        doc.set_attr(group, "class", "form-group").unwrap();
        let label = doc.create_element("label");
        doc.set_text(label, "Vendor Name").unwrap();
        let input = doc.create_element("input");
        doc.set_attr(input, "type", "text").unwrap();
        doc.append_child(group, label).unwrap();
        doc.append_child(group, input).unwrap();
        let body = doc.body();
        doc.append_child(body, group).unwrap();
        (doc, group, label, input)
    }

    #[test]
    fn queries_follow_document_order() {
        let (doc, group, label, input) = doc_with_form();
        assert_eq!(doc.query_selector_all(".form-group").unwrap(), vec![group]);
        assert_eq!(doc.query_in(group, "label, input").unwrap(), vec![label, input]);
        assert_eq!(doc.closest(input, "div.form-group").unwrap(), Some(group));
        assert_eq!(doc.text_content(group), "Vendor Name");
        assert!(doc.matches(input, ".form-group > input[type=text]").unwrap());
    }

    #[test]
    fn visibility_is_inherited() {
        let (mut doc, group, _, input) = doc_with_form();
        assert!(doc.is_visible(input));
        doc.set_style(group, "display", "none").unwrap();
        assert!(!doc.is_visible(input));
        doc.set_style(group, "display", "block").unwrap();
        assert!(doc.is_visible(input));
        let detached = doc.create_element("span");
        assert!(!doc.is_visible(detached));
    }

    #[test]
    fn removing_one_style_keeps_the_rest() {
        let (mut doc, group, _, _) = doc_with_form();
        doc.set_attr(group, "style", "display: flex").unwrap();
        doc.set_style(group, "outline", "1px solid red").unwrap();
        doc.remove_style(group, "outline").unwrap();
        assert_eq!(doc.attr(group, "style"), Some("display: flex"));
        doc.remove_style(group, "display").unwrap();
        assert_eq!(doc.attr(group, "style"), None);
        doc.remove_style(group, "display").unwrap();
    }

    #[test]
    fn radios_are_mutually_exclusive() {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let a = doc.create_element("input");
        let b = doc.create_element("input");
        for radio in [a, b] {
            doc.set_attr(radio, "type", "radio").unwrap();
            doc.set_attr(radio, "name", "payment").unwrap();
            doc.append_child(body, radio).unwrap();
        }
        doc.set_checked(a, true).unwrap();
        doc.set_checked(b, true).unwrap();
        assert!(!doc.element(a).unwrap().is_checked());
        assert!(doc.element(b).unwrap().is_checked());
    }

    #[test]
    fn capture_intercept_suppresses_file_chooser() {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let input = doc.create_element("input");
        doc.set_attr(input, "type", "file").unwrap();
        doc.set_attr(input, "id", "receipt").unwrap();
        let trigger = doc.create_element("button");
        doc.set_attr(trigger, "data-file-input", "receipt").unwrap();
        doc.append_child(body, input).unwrap();
        doc.append_child(body, trigger).unwrap();

        doc.dispatch(trigger, DomEventKind::Click, true).unwrap();
        assert_eq!(doc.events_for(input), vec![DomEventKind::FileChooserOpened]);

        doc.add_listener(
            trigger,
            DomEventKind::Click,
            Phase::Capture,
            ListenerAction::Intercept {
                tag: "upload".into(),
            },
        );
        let outcome = doc.dispatch(trigger, DomEventKind::Click, true).unwrap();
        assert!(outcome.intercepted);
        assert_eq!(doc.events_for(input).len(), 1);
        assert!(doc
            .take_outbox()
            .iter()
            .any(|e| matches!(e, PageEvent::Intercepted { tag, .. } if tag == "upload")));
    }

    #[test]
    fn mutations_coalesce_within_one_lock() {
        let (mut doc, group, _, _) = doc_with_form();
        doc.take_outbox();
        doc.set_attr(group, "data-x", "1").unwrap();
        let extra = doc.create_element("span");
        doc.append_child(group, extra).unwrap();
        assert_eq!(
            doc.take_outbox(),
            vec![PageEvent::Mutated { structural: true }]
        );
    }

    #[test]
    fn remove_closest_listener_detaches_container() {
        let (mut doc, group, _, _) = doc_with_form();
        let tooltip = doc.create_element("div");
        doc.set_attr(tooltip, "class", "tip").unwrap();
        let button = doc.create_element("button");
        doc.append_child(tooltip, button).unwrap();
        doc.append_child(group, tooltip).unwrap();
        doc.add_listener(
            button,
            DomEventKind::Click,
            Phase::Bubble,
            ListenerAction::RemoveClosest(".tip".into()),
        );
        doc.dispatch(button, DomEventKind::Click, true).unwrap();
        assert!(!doc.is_attached(tooltip));
        assert!(doc.query_in(group, ".tip").unwrap().is_empty());
    }

    #[test]
    fn insert_rejects_cycles() {
        let (mut doc, group, label, _) = doc_with_form();
        assert_eq!(
            doc.append_child(label, group),
            Err(DomError::Cycle { child: group.0 })
        );
    }
}
