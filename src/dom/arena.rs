//! Arena-based document tree.
//!
//! html5ever parses into this tree through [`super::tree_sink::ArenaSink`].
//! Nodes live in one vector and link to each other by index, so element
//! handles are plain `Copy` ids and the whole tree is immutable once the
//! parse finishes.

use html5ever::{LocalName, Namespace, QualName};

/// Identifier of a node in a [`Document`].
///
/// Ids are assigned in creation order, which html5ever makes equal to
/// document order for everything except nodes moved by foster parenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel value for no node.
    pub(crate) const NONE: NodeId = NodeId(u32::MAX);

    pub(crate) fn is_some(self) -> bool {
        self.0 != u32::MAX
    }

    pub(crate) fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-extracted id for fast matching.
        id: Option<String>,
        /// Pre-extracted classes for fast matching.
        classes: Vec<String>,
    },
    Text(String),
    Comment(String),
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// HTML attribute, in source order on its element.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node and its tree links.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// A parsed markup document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    /// Whitespace-insensitive SHA-1 of the markup this tree was built from.
    pub(crate) digest: String,
}

impl Document {
    /// Create an empty document containing only the root node.
    pub(crate) fn empty() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::NONE,
            digest: String::new(),
        };
        doc.root = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The document root (not the `<html>` element).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes, including the root, text and comments.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Whitespace-insensitive SHA-1 digest of the source markup.
    pub fn markup_digest(&self) -> &str {
        &self.digest
    }

    // --- construction (used by the tree sink) ---

    pub(crate) fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let mut id = None;
        let mut classes = Vec::new();

        for attr in &attrs {
            match attr.name.local.as_ref() {
                "id" => id = Some(attr.value.clone()),
                "class" => {
                    classes = attr
                        .value
                        .split_ascii_whitespace()
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
        }

        self.alloc(Node::new(NodeData::Element {
            name,
            attrs,
            id,
            classes,
        }))
    }

    pub(crate) fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub(crate) fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub(crate) fn create_doctype(
        &mut self,
        name: String,
        public_id: String,
        system_id: String,
    ) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Append `child` as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    pub(crate) fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text, merging with a trailing text node when there is one.
    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Unlink a node from its parent and siblings.
    pub(crate) fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    // --- traversal ---

    /// Iterate over the children of a node.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        Children {
            doc: self,
            current: first,
        }
    }

    /// All elements in document (pre-)order.
    pub fn elements(&self) -> Elements<'_> {
        let mut stack: Vec<NodeId> = self.children(self.root).collect();
        stack.reverse();
        Elements { doc: self, stack }
    }

    /// Find the first element with the given tag name.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements()
            .find(|&id| self.element_name(id).is_some_and(|n| n.as_ref() == tag))
    }

    // --- element accessors ---

    /// Element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    pub fn element_namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.ns),
            _ => None,
        })
    }

    /// Element attributes in source order.
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Get an attribute value by local name.
    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.as_str())
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { id, .. } => id.as_deref(),
            _ => None,
        })
    }

    pub fn element_classes(&self, id: NodeId) -> &[String] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Concatenated text of the direct text children (e.g. a `<style>` body).
    pub fn text_content(&self, id: NodeId) -> String {
        self.children(id)
            .filter_map(|c| match self.get(c).map(|n| &n.data) {
                Some(NodeData::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Name of the document type declaration, if any.
    pub fn doctype(&self) -> Option<&str> {
        self.children(self.root)
            .find_map(|c| match self.get(c).map(|n| &n.data) {
                Some(NodeData::Doctype { name, .. }) => Some(name.as_str()),
                _ => None,
            })
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over elements.
pub struct Elements<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Elements<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if !self.doc.is_element(id) {
                continue;
            }
            let start = self.stack.len();
            self.stack.extend(self.doc.children(id));
            self.stack[start..].reverse();
            return Some(id);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use html5ever::ns;

    use super::*;

    fn make_qname(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    #[test]
    fn test_create_elements() {
        let mut doc = Document::empty();

        let div = doc.create_element(
            make_qname("div"),
            vec![
                Attribute {
                    name: make_qname("id"),
                    value: "main".to_string(),
                },
                Attribute {
                    name: make_qname("class"),
                    value: "card  wide".to_string(),
                },
            ],
        );
        doc.append(doc.root(), div);

        assert_eq!(doc.element_name(div).unwrap().as_ref(), "div");
        assert_eq!(doc.element_id(div), Some("main"));
        assert_eq!(doc.element_classes(div), ["card", "wide"]);
        assert_eq!(doc.attr(div, "class"), Some("card  wide"));
    }

    #[test]
    fn test_elements_preorder() {
        let mut doc = Document::empty();

        let body = doc.create_element(make_qname("body"), vec![]);
        let div = doc.create_element(make_qname("div"), vec![]);
        let p = doc.create_element(make_qname("p"), vec![]);
        let span = doc.create_element(make_qname("span"), vec![]);

        doc.append(doc.root(), body);
        doc.append(body, div);
        doc.append(div, p);
        doc.append_text(div, "text");
        doc.append(body, span);

        let order: Vec<_> = doc.elements().collect();
        assert_eq!(order, vec![body, div, p, span]);
    }

    #[test]
    fn test_text_merging() {
        let mut doc = Document::empty();

        let style = doc.create_element(make_qname("style"), vec![]);
        doc.append(doc.root(), style);

        doc.append_text(style, "p { color: red; }");
        doc.append_text(style, " h1 { color: blue; }");

        assert_eq!(doc.children(style).count(), 1);
        assert_eq!(
            doc.text_content(style),
            "p { color: red; } h1 { color: blue; }"
        );
    }

    #[test]
    fn test_insert_before_and_detach() {
        let mut doc = Document::empty();

        let ul = doc.create_element(make_qname("ul"), vec![]);
        let first = doc.create_element(make_qname("li"), vec![]);
        let second = doc.create_element(make_qname("li"), vec![]);
        doc.append(doc.root(), ul);
        doc.append(ul, second);
        doc.insert_before(second, first);

        assert_eq!(doc.children(ul).collect::<Vec<_>>(), vec![first, second]);

        doc.detach(first);
        assert_eq!(doc.children(ul).collect::<Vec<_>>(), vec![second]);
        assert!(doc.get(first).unwrap().parent.is_none());
    }
}
