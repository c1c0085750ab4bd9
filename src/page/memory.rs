//! In-memory document for exercising the toggler without a browser.
//!
//! Nodes live in an arena and are addressed by `NodeId`. Only what the
//! toggler touches is modelled: tag, id, classes, attributes, text, the
//! tree, and click listeners. Selector support covers compound selectors
//! (`a.btn#x`) joined by the descendant combinator, plus `,` groups.

use super::{ClickAction, PageQuery, SimulatedClick};
use crate::error::{Result, TogglerError};
use crate::toolbar::Toolbar;
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<ClickAction>,
}

#[derive(Debug)]
pub struct MemoryPage {
    nodes: RefCell<Vec<NodeData>>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// Empty document with a single `body` root.
    pub fn new() -> Self {
        let root = NodeData {
            tag: "body".to_string(),
            ..NodeData::default()
        };
        Self {
            nodes: RefCell::new(vec![root]),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new element under `parent`.
    pub fn append(&self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(NodeData {
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            parent: Some(parent),
            ..NodeData::default()
        });
        nodes[parent.0].children.push(id);
        id
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.nodes.borrow()[node.0].classes.clone()
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0]
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    pub fn text(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].text.clone()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.0].children.clone()
    }

    /// Whether `node` is still reachable from the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = node;
        loop {
            if current == NodeId(0) {
                return true;
            }
            match nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn listeners(&self, node: NodeId) -> Vec<ClickAction> {
        self.nodes.borrow()[node.0].listeners.clone()
    }

    /// Dispatch a click on `target`, bubbling to the root.
    ///
    /// `handler` runs once per bound action on the way up, with the same
    /// event each time, so listeners see the original target.
    pub fn click(
        &self,
        target: NodeId,
        mut handler: impl FnMut(ClickAction, &SimulatedClick<NodeId>),
    ) -> SimulatedClick<NodeId> {
        let event = SimulatedClick::on(target);
        let mut bound = Vec::new();
        {
            let nodes = self.nodes.borrow();
            let mut current = Some(target);
            while let Some(node) = current {
                bound.extend(nodes[node.0].listeners.iter().copied());
                current = nodes[node.0].parent;
            }
        }
        // Handlers mutate the page, so no borrow may be held here.
        for action in bound {
            handler(action, &event);
        }
        event
    }

    /// Attached nodes in document order.
    fn walk(&self) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut order = Vec::new();
        let mut stack = vec![NodeId(0)];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(nodes[node.0].children.iter().rev().copied());
        }
        order
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let nodes = self.nodes.borrow();
        let Some((last, ancestors)) = selector.parts.split_last() else {
            return false;
        };
        if !last.matches(&nodes[node.0]) {
            return false;
        }
        let mut current = nodes[node.0].parent;
        for part in ancestors.iter().rev() {
            loop {
                match current {
                    Some(ancestor) => {
                        current = nodes[ancestor.0].parent;
                        if part.matches(&nodes[ancestor.0]) {
                            break;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }
}

impl PageQuery for MemoryPage {
    type Node = NodeId;

    fn by_class(&self, class: &str) -> Vec<NodeId> {
        let order = self.walk();
        let nodes = self.nodes.borrow();
        order
            .into_iter()
            .filter(|n| nodes[n.0].classes.iter().any(|c| c == class))
            .collect()
    }

    fn select_all(&self, selector: &str) -> Vec<NodeId> {
        let groups: Vec<Selector> = selector.split(',').filter_map(Selector::parse).collect();
        self.walk()
            .into_iter()
            .filter(|n| groups.iter().any(|s| self.matches(*n, s)))
            .collect()
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        let order = self.walk();
        let nodes = self.nodes.borrow();
        order
            .into_iter()
            .find(|n| nodes[n.0].id.as_deref() == Some(id))
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.nodes.borrow()[node.0].classes.iter().any(|c| c == class)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].parent
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let parent = nodes[node.0].parent?;
        let siblings = &nodes[parent.0].children;
        let index = siblings.iter().position(|n| n == node)?;
        siblings.get(index + 1).copied()
    }

    fn remove(&self, node: &NodeId) -> Result<()> {
        if *node == NodeId(0) {
            return Err(TogglerError::Dom("cannot remove the root".to_string()));
        }
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|n| n != node);
        }
        Ok(())
    }

    fn add_class(&self, node: &NodeId, class: &str) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[node.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&self, node: &NodeId, class: &str) -> Result<()> {
        self.nodes.borrow_mut()[node.0]
            .classes
            .retain(|c| c != class);
        Ok(())
    }

    fn prepend_toolbar(&self, anchor: &NodeId, toolbar: &Toolbar) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let group = NodeId(nodes.len());
        nodes.push(NodeData {
            tag: "div".to_string(),
            classes: toolbar.classes.clone(),
            parent: Some(*anchor),
            ..NodeData::default()
        });
        for button in &toolbar.buttons {
            let id = NodeId(nodes.len());
            nodes.push(NodeData {
                tag: "a".to_string(),
                id: Some(button.id.clone()),
                classes: button.class.split_whitespace().map(str::to_string).collect(),
                attributes: vec![
                    ("href".to_string(), "#".to_string()),
                    ("aria-label".to_string(), button.aria_label.clone()),
                ],
                text: button.label.clone(),
                parent: Some(group),
                ..NodeData::default()
            });
            nodes[group.0].children.push(id);
        }
        nodes[anchor.0].children.insert(0, group);
        Ok(())
    }

    fn on_click(&self, node: &NodeId, action: ClickAction) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let listeners = &mut nodes[node.0].listeners;
        if !listeners.contains(&action) {
            listeners.push(action);
        }
        Ok(())
    }
}

/// Handles into a page built by `MemoryPage::diff_view`.
#[derive(Debug, Clone)]
pub struct DiffFixture {
    pub toolbar_anchor: NodeId,
    pub container: NodeId,
    pub files: Vec<FileFixture>,
}

/// One file block:
///
/// ```text
/// div.file
///   div.file-header
///     span.file-info > a.Link--primary
///     button.js-details-target
///   div.Details-content--shown
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FileFixture {
    pub header: NodeId,
    pub info: NodeId,
    pub link: NodeId,
    pub native_button: NodeId,
    pub body: NodeId,
}

impl MemoryPage {
    /// A pull-request diff page with `files` expanded file entries, laid
    /// out with the default markers.
    pub fn diff_view(files: usize) -> (Self, DiffFixture) {
        let page = Self::new();
        let root = page.root();
        let toolbar_anchor = page.append(root, "div", &["pr-review-tools"]);
        let container = page.append(root, "div", &["js-diff-progressive-container"]);
        let files = (0..files)
            .map(|_| {
                let file = page.append(container, "div", &["file"]);
                let header = page.append(file, "div", &["file-header"]);
                let info = page.append(header, "span", &["file-info"]);
                let link = page.append(info, "a", &["Link--primary"]);
                let native_button = page.append(header, "button", &["js-details-target"]);
                let body = page.append(file, "div", &["Details-content--shown"]);
                FileFixture {
                    header,
                    info,
                    link,
                    native_button,
                    body,
                }
            })
            .collect();
        (
            page,
            DiffFixture {
                toolbar_anchor,
                container,
                files,
            },
        )
    }
}

/// Descendant-combinator chain of compound selectors.
#[derive(Debug)]
struct Selector {
    parts: Vec<Compound>,
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<Compound> = raw
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<_>>()?;
        if parts.is_empty() {
            None
        } else {
            Some(Self { parts })
        }
    }
}

impl Compound {
    fn parse(raw: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = raw;
        let tag_end = rest.find(['.', '#']).unwrap_or(rest.len());
        if tag_end > 0 {
            compound.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];
        while let Some(kind) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            match kind {
                '.' => compound.classes.push(name.to_string()),
                '#' => compound.id = Some(name.to_string()),
                _ => return None,
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    fn matches(&self, node: &NodeData) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.id.as_ref() != Some(id) {
                return false;
            }
        }
        self.classes
            .iter()
            .all(|class| node.classes.iter().any(|c| c == class))
    }
}
