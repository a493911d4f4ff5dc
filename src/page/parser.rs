//! Permissive HTML parsing into the page arena.
//!
//! This is tag-soup parsing, not a spec-complete HTML5 tree builder: statically
//! rendered documentation pages are well-nested, so the builder only needs to
//! handle void elements, raw-text elements, comments, doctypes, and to stay
//! calm about stray `<` characters and unmatched end tags.

use std::collections::HashSet;

use htmlize::unescape;
use once_cell::sync::Lazy;

use super::types::{ElementData, Node, NodeData, NodeId};

/// Elements that never have children and take no end tag.
static VOID_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
        "param", "source", "track", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Elements whose content is raw text up to the matching end tag.
static RAW_TEXT_ELEMENTS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["script", "style"].into_iter().collect());

pub(crate) fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(tag)
}

pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(tag)
}

/// Parse `source` into an arena whose first node is the document root.
pub(crate) fn parse(source: &str) -> Vec<Node> {
    let mut builder = Builder::new();
    let mut rest = source;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            builder.text(rest);
            break;
        };
        if lt > 0 {
            builder.text(&rest[..lt]);
            rest = &rest[lt..];
        }

        if let Some(after) = rest.strip_prefix("<!--") {
            if let Some(end) = after.find("-->") {
                builder.comment(&after[..end]);
                rest = &after[end + 3..];
            } else {
                builder.comment(after);
                break;
            }
        } else if rest.starts_with("<!") {
            if let Some(end) = rest.find('>') {
                builder.doctype(&rest[2..end]);
                rest = &rest[end + 1..];
            } else {
                builder.text(rest);
                break;
            }
        } else if rest.starts_with("</") {
            if let Some((tag, len)) = scan_end_tag(rest) {
                builder.close(&tag);
                rest = &rest[len..];
            } else {
                // `</` not followed by a tag: literal text.
                builder.text("<");
                rest = &rest[1..];
            }
        } else if let Some(token) = scan_start_tag(rest) {
            rest = &rest[token.len..];
            let tag = token.data.tag().to_string();
            if token.self_closing || is_void_element(&tag) {
                builder.leaf(token.data);
            } else if is_raw_text_element(&tag) {
                let (raw, consumed) = scan_raw_text(rest, &tag);
                builder.raw_element(token.data, raw);
                rest = &rest[consumed..];
            } else {
                builder.open(token.data);
            }
        } else {
            builder.text("<");
            rest = &rest[1..];
        }
    }

    builder.finish()
}

struct Builder {
    arena: Vec<Node>,
    stack: Vec<NodeId>,
}

impl Builder {
    fn new() -> Self {
        Self {
            arena: vec![Node::new(NodeData::Document)],
            stack: vec![NodeId(0)],
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.arena.len());
        let parent = *self.stack.last().expect("stack holds the document root");
        let mut node = Node::new(data);
        node.parent = Some(parent);
        self.arena.push(node);
        self.arena[parent.0].children.push(id);
        id
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        self.push(NodeData::Text(unescape(raw).into_owned()));
    }

    fn comment(&mut self, body: &str) {
        self.push(NodeData::Comment(body.to_string()));
    }

    fn doctype(&mut self, body: &str) {
        self.push(NodeData::Doctype(body.to_string()));
    }

    fn leaf(&mut self, data: ElementData) {
        self.push(NodeData::Element(data));
    }

    fn open(&mut self, data: ElementData) {
        let id = self.push(NodeData::Element(data));
        self.stack.push(id);
    }

    /// Element whose content was consumed verbatim (script/style).
    fn raw_element(&mut self, data: ElementData, raw: String) {
        let id = self.push(NodeData::Element(data));
        if !raw.is_empty() {
            let child = NodeId(self.arena.len());
            let mut node = Node::new(NodeData::Text(raw));
            node.parent = Some(id);
            self.arena.push(node);
            self.arena[id.0].children.push(child);
        }
    }

    /// Close the nearest open element with this tag; ignore if none is open.
    fn close(&mut self, tag: &str) {
        let found = self.stack.iter().rposition(|id| {
            matches!(&self.arena[id.0].data, NodeData::Element(el) if el.tag() == tag)
        });
        if let Some(idx) = found {
            self.stack.truncate(idx);
        }
    }

    fn finish(self) -> Vec<Node> {
        self.arena
    }
}

struct TagToken {
    data: ElementData,
    self_closing: bool,
    /// Bytes consumed, from `<` through `>` inclusive.
    len: usize,
}

/// Scan a start tag. `input` begins at `<`. Returns `None` when the `<` does
/// not open a tag (next char is not a letter, or the tag never terminates).
fn scan_start_tag(input: &str) -> Option<TagToken> {
    let bytes = input.as_bytes();
    if bytes.len() < 2 || !bytes[1].is_ascii_alphabetic() {
        return None;
    }

    let mut pos = 1;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    let tag = input[1..pos].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }
        match bytes[pos] {
            b'>' => {
                pos += 1;
                break;
            }
            b'/' => {
                if bytes.get(pos + 1) == Some(&b'>') {
                    self_closing = true;
                    pos += 2;
                    break;
                }
                // Stray slash inside the tag; skip it.
                pos += 1;
            }
            _ => {
                let (attr, consumed) = scan_attribute(&input[pos..]);
                attrs.push(attr);
                pos += consumed;
            }
        }
    }

    Some(TagToken {
        data: ElementData::new(tag, attrs),
        self_closing,
        len: pos,
    })
}

/// Scan one attribute. `input` begins at the first name character.
fn scan_attribute(input: &str) -> ((String, String), usize) {
    let bytes = input.as_bytes();
    let mut pos = 0;
    while pos < bytes.len()
        && !bytes[pos].is_ascii_whitespace()
        && !matches!(bytes[pos], b'=' | b'>' | b'/')
    {
        pos += 1;
    }
    let name = input[..pos].to_ascii_lowercase();

    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'=') {
        // Boolean attribute.
        return ((name, String::new()), pos);
    }
    pos += 1;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let value = match bytes.get(pos) {
        Some(&quote @ (b'"' | b'\'')) => {
            pos += 1;
            let start = pos;
            while pos < bytes.len() && bytes[pos] != quote {
                pos += 1;
            }
            let raw = &input[start..pos];
            if pos < bytes.len() {
                pos += 1;
            }
            unescape(raw).into_owned()
        }
        _ => {
            let start = pos;
            while pos < bytes.len()
                && !bytes[pos].is_ascii_whitespace()
                && bytes[pos] != b'>'
            {
                pos += 1;
            }
            unescape(&input[start..pos]).into_owned()
        }
    };

    ((name, value), pos)
}

/// Scan an end tag. `input` begins at `</`. Returns the lowercased tag name
/// and the bytes consumed through `>`.
fn scan_end_tag(input: &str) -> Option<(String, usize)> {
    let bytes = input.as_bytes();
    if bytes.len() < 3 || !bytes[2].is_ascii_alphabetic() {
        return None;
    }
    let mut pos = 2;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    let tag = input[2..pos].to_ascii_lowercase();
    let close = input[pos..].find('>')?;
    Some((tag, pos + close + 1))
}

/// Consume raw content up to (and including) `</tag ... >`, case-insensitive.
/// Returns the verbatim content and the total bytes consumed.
fn scan_raw_text(input: &str, tag: &str) -> (String, usize) {
    let lower = input.to_ascii_lowercase();
    let needle = format!("</{tag}");
    let mut search = 0;
    while let Some(found) = lower[search..].find(&needle) {
        let at = search + found;
        let after = lower.as_bytes().get(at + needle.len());
        // The end tag name must terminate here, not be a prefix.
        if after.is_none_or(|b| b.is_ascii_whitespace() || *b == b'>') {
            let content = input[..at].to_string();
            let close = input[at..].find('>').map_or(input.len(), |c| at + c + 1);
            return (content, close);
        }
        search = at + needle.len();
    }
    (input.to_string(), input.len())
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':'
}
