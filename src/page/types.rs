//! Page tree node types.

/// Opaque reference to a node in an [`HtmlPage`](super::HtmlPage) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A node in the arena, with its tree links.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) const fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    /// The document root; never has a parent.
    Document,
    Element(ElementData),
    /// Decoded character data.
    Text(String),
    /// Comment body, without the `<!--`/`-->` delimiters.
    Comment(String),
    /// Raw declaration text, without `<!`/`>` (e.g. `DOCTYPE html`).
    Doctype(String),
}

/// Tag name and attributes of an element node.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercased tag name.
    tag: String,
    /// Attributes in source order, values decoded.
    attrs: Vec<(String, String)>,
}

impl ElementData {
    pub(crate) fn new(tag: String, attrs: Vec<(String, String)>) -> Self {
        Self { tag, attrs }
    }

    /// Lowercased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attributes in source order.
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Value of the first attribute named `name` (ASCII case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether the `class` attribute contains `class` as a token.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }
}
