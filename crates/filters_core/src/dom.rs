//! Live document model: a parsed HTML tree plus the form-control state a
//! browser keeps beside the markup.
//!
//! Control state mirrors the "dirty" flags of real form controls: until the
//! user touches a control its checkedness or value comes from the `checked`,
//! `value` and `selected` attributes; afterwards the overlay wins. Swapping a
//! region drops the overlay of every node it destroys.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::{CoreError, QueryParams};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ControlState {
    Checked(bool),
    Value(String),
}

/// How a form control reacts to user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Checkable,
    Text,
    Select,
}

/// The document the user sees. Only mutated on the UI thread.
#[derive(Debug)]
pub struct LiveDocument {
    html: Html,
    controls: HashMap<NodeId, ControlState>,
}

impl LiveDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            controls: HashMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::parse("")
    }

    pub fn html(&self) -> String {
        self.html.html()
    }

    pub fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        self.html.root_element().select(selector).next().map(node_id)
    }

    pub fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(node).and_then(ElementRef::wrap)
    }

    /// First connected element whose `id` attribute equals `dom_id`.
    pub fn get_element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        if dom_id.is_empty() {
            return None;
        }
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().id() == Some(dom_id))
            .map(node_id)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let root = self.html.tree.root().id();
        match self.html.tree.get(node) {
            Some(node_ref) => node_ref.id() == root || node_ref.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    /// Nearest inclusive ancestor matching `selector`, following detached
    /// subtrees the same way a removed DOM node keeps its parents.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let start = self.html.tree.get(node)?;
        std::iter::once(start)
            .chain(start.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|el| selector.matches(el))
            .map(node_id)
    }

    /// Target first, then every ancestor up to the tree root.
    pub fn propagation_path(&self, node: NodeId) -> Vec<NodeId> {
        match self.html.tree.get(node) {
            Some(start) => std::iter::once(start)
                .chain(start.ancestors())
                .map(|n| n.id())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.value().attr(name))
    }

    pub fn dom_id(&self, node: NodeId) -> Option<&str> {
        self.element(node).and_then(|el| el.value().id())
    }

    pub fn inner_html(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|el| el.inner_html())
    }

    /// Replaces every child of `target` with a deep copy of `donor`'s children.
    pub fn replace_children(&mut self, target: NodeId, donor: ElementRef<'_>) {
        let Some(target_ref) = self.html.tree.get(target) else {
            return;
        };
        let old_children: Vec<NodeId> = target_ref.children().map(|child| child.id()).collect();
        let destroyed: Vec<NodeId> = target_ref
            .children()
            .flat_map(|child| child.descendants())
            .map(|node| node.id())
            .collect();

        for id in destroyed {
            self.controls.remove(&id);
        }
        for id in old_children {
            if let Some(mut child) = self.html.tree.get_mut(id) {
                child.detach();
            }
        }

        let mut stack: Vec<(NodeRef<'_, Node>, NodeId)> = Vec::new();
        push_children_reversed(&mut stack, *donor, target);
        while let Some((source, parent)) = stack.pop() {
            let Some(mut parent_mut) = self.html.tree.get_mut(parent) else {
                continue;
            };
            let copied = parent_mut.append(source.value().clone()).id();
            push_children_reversed(&mut stack, source, copied);
        }
    }

    pub fn control_kind(&self, node: NodeId) -> Option<ControlKind> {
        let el = self.element(node)?;
        match el.value().name() {
            "input" => match input_type(el).as_str() {
                "checkbox" | "radio" => Some(ControlKind::Checkable),
                "submit" | "reset" | "button" | "image" | "file" => None,
                _ => Some(ControlKind::Text),
            },
            "textarea" => Some(ControlKind::Text),
            "select" => Some(ControlKind::Select),
            _ => None,
        }
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        match self.controls.get(&node) {
            Some(ControlState::Checked(checked)) => *checked,
            _ => self.attr(node, "checked").is_some(),
        }
    }

    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<(), CoreError> {
        if self.control_kind(node) != Some(ControlKind::Checkable) {
            return Err(self.not_a_control(node));
        }
        if checked && self.element(node).map(input_type).as_deref() == Some("radio") {
            for other in self.radio_group(node) {
                self.controls.insert(other, ControlState::Checked(false));
            }
        }
        self.controls.insert(node, ControlState::Checked(checked));
        Ok(())
    }

    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) -> Result<(), CoreError> {
        match self.control_kind(node) {
            Some(ControlKind::Text) | Some(ControlKind::Select) => {
                self.controls.insert(node, ControlState::Value(value.into()));
                Ok(())
            }
            _ => Err(self.not_a_control(node)),
        }
    }

    /// Entries a browser would submit for `form`, in tree order.
    pub fn form_entries(&self, form: NodeId) -> QueryParams {
        let mut params = QueryParams::new();
        let Some(form) = self.element(form) else {
            return params;
        };
        for el in form.descendants().filter_map(ElementRef::wrap) {
            let element = el.value();
            let Some(name) = element.attr("name").filter(|name| !name.is_empty()) else {
                continue;
            };
            if element.attr("disabled").is_some() {
                continue;
            }
            match element.name() {
                "input" => match input_type(el).as_str() {
                    "checkbox" | "radio" => {
                        if self.is_checked(node_id(el)) {
                            params.append(name, element.attr("value").unwrap_or("on"));
                        }
                    }
                    "submit" | "reset" | "button" | "image" | "file" => {}
                    _ => params.append(name, self.input_value(el)),
                },
                "select" => {
                    for value in self.selected_values(el) {
                        params.append(name, value);
                    }
                }
                "textarea" => params.append(name, self.textarea_value(el)),
                _ => {}
            }
        }
        params
    }

    fn input_value(&self, el: ElementRef<'_>) -> String {
        match self.controls.get(&node_id(el)) {
            Some(ControlState::Value(value)) => value.clone(),
            _ => el.value().attr("value").unwrap_or_default().to_string(),
        }
    }

    fn textarea_value(&self, el: ElementRef<'_>) -> String {
        match self.controls.get(&node_id(el)) {
            Some(ControlState::Value(value)) => value.clone(),
            _ => el.text().collect(),
        }
    }

    fn selected_values(&self, select: ElementRef<'_>) -> Vec<String> {
        if let Some(ControlState::Value(value)) = self.controls.get(&node_id(select)) {
            return vec![value.clone()];
        }
        let options: Vec<ElementRef<'_>> = select
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "option")
            .collect();
        let selected: Vec<String> = options
            .iter()
            .filter(|option| option.value().attr("selected").is_some())
            .map(|option| option_value(*option))
            .collect();

        if select.value().attr("multiple").is_some() {
            return selected;
        }
        if let Some(last) = selected.last() {
            return vec![last.clone()];
        }
        options
            .iter()
            .find(|option| option.value().attr("disabled").is_none())
            .map(|option| vec![option_value(*option)])
            .unwrap_or_default()
    }

    fn radio_group(&self, node: NodeId) -> Vec<NodeId> {
        let Some(el) = self.element(node) else {
            return Vec::new();
        };
        let Some(name) = el.value().attr("name") else {
            return Vec::new();
        };
        let scope = el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| ancestor.value().name() == "form")
            .unwrap_or_else(|| self.html.root_element());
        scope
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|other| node_id(*other) != node)
            .filter(|other| other.value().name() == "input" && input_type(*other) == "radio")
            .filter(|other| other.value().attr("name") == Some(name))
            .map(node_id)
            .collect()
    }

    fn not_a_control(&self, node: NodeId) -> CoreError {
        let el = self.element(node);
        CoreError::NotAControl {
            id: el
                .and_then(|el| el.value().id())
                .unwrap_or_default()
                .to_string(),
            tag: el
                .map(|el| el.value().name().to_string())
                .unwrap_or_else(|| "#text".to_string()),
        }
    }
}

/// Read-only document parsed from a fetched section, scoped to one render.
#[derive(Debug)]
pub struct Fragment {
    html: Html,
}

impl Fragment {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.root_element().select(selector).next()
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.html.root_element().select(selector).collect()
    }
}

fn push_children_reversed<'a>(
    stack: &mut Vec<(NodeRef<'a, Node>, NodeId)>,
    source: NodeRef<'a, Node>,
    parent: NodeId,
) {
    let children: Vec<NodeRef<'a, Node>> = source.children().collect();
    stack.extend(children.into_iter().rev().map(|child| (child, parent)));
}

/// Tree id of an element, as opposed to its `id` attribute.
pub(crate) fn node_id(el: ElementRef<'_>) -> NodeId {
    (*el).id()
}

fn input_type(el: ElementRef<'_>) -> String {
    el.value()
        .attr("type")
        .unwrap_or("text")
        .trim()
        .to_ascii_lowercase()
}

fn option_value(option: ElementRef<'_>) -> String {
    match option.value().attr("value") {
        Some(value) => value.to_string(),
        None => option
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    }
}
