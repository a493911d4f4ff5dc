//! In-memory page tree.
//!
//! [`HtmlPage`] is the concrete document behind the transformer's tree
//! interface: an arena of nodes parsed permissively from HTML, with
//! document-order queries, ancestor lookup, in-place node replacement, and
//! serialization back to HTML. Text is held decoded; entities are re-escaped
//! on output.

mod parser;
mod types;

pub use types::{ElementData, NodeId};

use htmlize::{escape_attribute, escape_text};

use crate::selector::Selector;
use crate::transform::DocumentTree;
use types::{Node, NodeData};

/// A parsed documentation page.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    nodes: Vec<Node>,
}

impl HtmlPage {
    /// Parse a page. Parsing is permissive and does not fail; malformed
    /// markup degrades to text nodes.
    pub fn parse(source: &str) -> Self {
        Self {
            nodes: parser::parse(source),
        }
    }

    /// The document root.
    pub const fn root() -> NodeId {
        NodeId(0)
    }

    /// Element data of `id`, if it is an element node.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Child nodes of `id` in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of `id`, `None` for the root and detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == Self::root() {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Concatenated descendant text of `id`, verbatim.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let NodeData::Text(text) = &self.nodes[id.0].data {
            out.push_str(text);
        }
        for child in &self.nodes[id.0].children {
            self.collect_text(*child, out);
        }
    }

    /// All nodes matching `selector`, in document order.
    pub fn query(&self, selector: &Selector) -> Vec<NodeId> {
        let mut matches = Vec::new();
        let mut stack = vec![Self::root()];
        while let Some(id) = stack.pop() {
            if self.matches_selector(id, selector) {
                matches.push(id);
            }
            for child in self.nodes[id.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        matches
    }

    /// First element with the given tag name, in document order.
    pub fn find_element(&self, tag: &str) -> Option<NodeId> {
        let mut stack = vec![Self::root()];
        while let Some(id) = stack.pop() {
            if self.element(id).is_some_and(|el| el.tag() == tag) {
                return Some(id);
            }
            for child in self.nodes[id.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        None
    }

    /// Nearest ancestor of `id` matching `selector`, or `None`.
    pub fn nearest_ancestor(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = self.nodes[id.0].parent;
        while let Some(ancestor) = current {
            if self.matches_selector(ancestor, selector) {
                return Some(ancestor);
            }
            current = self.nodes[ancestor.0].parent;
        }
        None
    }

    fn matches_selector(&self, id: NodeId, selector: &Selector) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if !selector.target().matches(el.tag(), &el.classes()) {
            return false;
        }
        // Each ancestor step must be satisfied somewhere further up, innermost
        // step first.
        let mut current = self.nodes[id.0].parent;
        for step in selector.ancestors().iter().rev() {
            loop {
                let Some(ancestor) = current else {
                    return false;
                };
                current = self.nodes[ancestor.0].parent;
                if self
                    .element(ancestor)
                    .is_some_and(|el| step.matches(el.tag(), &el.classes()))
                {
                    break;
                }
            }
        }
        true
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let data = ElementData::new(
            tag.to_ascii_lowercase(),
            attrs
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect(),
        );
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(NodeData::Element(data)));
        id
    }

    /// Append a text child to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(NodeData::Text(text.to_string()));
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
    }

    /// Append `child` (detaching it first if needed) as the last child of
    /// `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Swap `new` into `old`'s position among its parent's children.
    ///
    /// Returns `false` without mutating anything when `old` has no parent
    /// (already detached). `old` is left detached on success.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        if old == new {
            return self.nodes[old.0].parent.is_some();
        }
        let Some(parent) = self.nodes[old.0].parent else {
            return false;
        };
        self.detach(new);
        let slot = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == old)
            .expect("child lists stay consistent with parent links");
        self.nodes[parent.0].children[slot] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        true
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            self.nodes[parent.0].children.retain(|c| *c != id);
            self.nodes[id.0].parent = None;
        }
    }

    /// Serialize the page back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.nodes[Self::root().0].children {
            self.write_node(*child, false, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Document => {}
            NodeData::Doctype(body) => {
                out.push_str("<!");
                out.push_str(body);
                out.push('>');
            }
            NodeData::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            NodeData::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text.as_str()));
                }
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(el.tag());
                for (name, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(value.as_str()));
                        out.push('"');
                    }
                }
                out.push('>');
                if parser::is_void_element(el.tag()) {
                    return;
                }
                let raw = parser::is_raw_text_element(el.tag());
                for child in &self.nodes[id.0].children {
                    self.write_node(*child, raw, out);
                }
                out.push_str("</");
                out.push_str(el.tag());
                out.push('>');
            }
        }
    }
}

impl DocumentTree for HtmlPage {
    type NodeRef = NodeId;

    fn query(&self, selector: &Selector) -> Vec<NodeId> {
        Self::query(self, selector)
    }

    fn text_of(&self, node: NodeId) -> String {
        self.text_content(node)
    }

    fn nearest_ancestor(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        Self::nearest_ancestor(self, node, selector)
    }

    fn create_marked(&mut self, marker_class: &str, text: &str) -> NodeId {
        let id = self.create_element("div", &[("class", marker_class)]);
        self.append_text(id, text);
        id
    }

    fn replace(&mut self, old: NodeId, replacement: NodeId) -> bool {
        Self::replace(self, old, replacement)
    }
}
