//! Node storage for the editable document.
//!
//! Nodes live in a map keyed by [`NodeId`]. IDs come from a process-wide
//! counter, so a node keeps its identity when it is detached from one document
//! and adopted by another; selection snapshots rely on this.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::markup;
use crate::error::{DomError, DomResult};

static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable handle to a node of an editable document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// The payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a lowercase tag name and ordered attributes.
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    /// A text node.
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Top-level nodes removed from a document, together with their subtrees.
///
/// Adopting the content into another tree keeps every [`NodeId`].
#[derive(Debug, Default)]
pub struct DetachedContent {
    roots: Vec<NodeId>,
    nodes: HashMap<NodeId, NodeEntry>,
}

impl DetachedContent {
    /// The detached top-level nodes, in their original order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Whether no nodes were detached.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Whether the node is part of the detached subtrees.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }
}

/// A text node removed by [`DomTree::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMerge {
    /// The node that no longer exists.
    pub removed: NodeId,
    /// The node its text was appended to, if any.
    pub into: Option<NodeId>,
    /// Character offset in `into` where the removed text starts.
    pub offset: usize,
}

/// The node tree of one editable document, rooted at its body element.
#[derive(Debug)]
pub struct DomTree {
    nodes: HashMap<NodeId, NodeEntry>,
    body: NodeId,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding an empty `body` element.
    pub fn new() -> Self {
        let body = NodeId::next();
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            NodeEntry {
                kind: NodeKind::Element {
                    tag: "body".to_string(),
                    attributes: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            },
        );
        Self { nodes, body }
    }

    /// The body element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Whether the node exists in this tree (attached or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn entry(&self, id: NodeId) -> DomResult<&NodeEntry> {
        self.nodes.get(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> DomResult<&mut NodeEntry> {
        self.nodes.get_mut(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn insert_entry(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::next();
        self.nodes.insert(
            id,
            NodeEntry {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    // =========================================================================
    // Creation and inspection
    // =========================================================================

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert_entry(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert_entry(NodeKind::Text(text.into()))
    }

    /// The node payload.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id).map(|entry| &entry.kind)
    }

    /// The tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Whether the node is an element with the given tag.
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    /// Whether the node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    /// Whether the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    /// The data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> DomResult<()> {
        match &mut self.entry_mut(id)?.kind {
            NodeKind::Text(data) => {
                *data = text.into();
                Ok(())
            }
            NodeKind::Element { .. } => Err(DomError::NotAText(id)),
        }
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element { .. }) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// The parent node, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id)?.parent
    }

    /// The child nodes; empty for text nodes and unknown IDs.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    /// Position of the node among its parent's children.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// The following sibling.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.child_index(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Boundary length: characters for text nodes, children for elements.
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => text.chars().count(),
            Some(NodeKind::Element { .. }) => self.children(id).len(),
            None => 0,
        }
    }

    /// Ancestors of the node, nearest first, excluding the node itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is the body or a descendant of it.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(self.body, id)
    }

    /// Descendants of `root` in document order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Insert `child` into `parent` before `reference` (append when `None`).
    ///
    /// The child is first removed from its current parent.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if !self.is_element(parent) {
            self.entry(parent)?;
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.entry(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        self.detach(child);
        let index = match reference {
            Some(reference) => self.child_index(reference).unwrap_or(0),
            None => self.children(parent).len(),
        };
        self.entry_mut(parent)?.children.insert(index, child);
        self.entry_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Remove `child` from `parent`; the node stays in the tree, detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    /// Remove the node from its parent, if any.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(entry) = self.nodes.get_mut(&parent) {
            entry.children.retain(|&child| child != id);
        }
        if let Some(entry) = self.nodes.get_mut(&id) {
            entry.parent = None;
        }
    }

    /// Replace an element by its children.
    pub fn unwrap_element(&mut self, id: NodeId) -> DomResult<()> {
        if !self.is_element(id) {
            self.entry(id)?;
            return Err(DomError::NotAnElement(id));
        }
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        for child in self.children(id).to_vec() {
            self.insert_before(parent, child, Some(id))?;
        }
        self.remove_subtree(id);
        Ok(())
    }

    /// Wrap `node` in a new element, returning the wrapper.
    pub fn wrap(&mut self, node: NodeId, tag: &str) -> DomResult<NodeId> {
        let parent = self.parent(node).ok_or(DomError::NotAChild {
            parent: self.body,
            child: node,
        })?;
        let wrapper = self.create_element(tag);
        self.insert_before(parent, wrapper, Some(node))?;
        self.append_child(wrapper, node)?;
        Ok(wrapper)
    }

    /// Detach the node and drop it together with its descendants.
    pub fn remove_subtree(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(entry) = self.nodes.remove(&node) {
                stack.extend(entry.children);
            }
        }
    }

    /// Split a text node at `offset` (in characters).
    ///
    /// The node keeps the leading part; a new text node holding the rest is
    /// inserted right after it and returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> DomResult<NodeId> {
        let text = self.text(id).ok_or(DomError::NotAText(id))?;
        let length = text.chars().count();
        if offset > length {
            return Err(DomError::IndexSize {
                node: id,
                offset,
                length,
            });
        }
        let byte = char_to_byte(text, offset);
        let tail = text[byte..].to_string();
        let head = text[..byte].to_string();

        self.set_text(id, head)?;
        let new_node = self.create_text(tail);
        if let Some(parent) = self.parent(id) {
            let reference = self.next_sibling(id);
            self.insert_before(parent, new_node, reference)?;
        }
        Ok(new_node)
    }

    /// Merge adjacent text nodes and drop empty ones below `root`.
    ///
    /// Returns one [`TextMerge`] per removed node so callers can move boundary
    /// points that referenced it.
    pub fn normalize(&mut self, root: NodeId) -> Vec<TextMerge> {
        let mut merges = Vec::new();
        let mut elements = vec![root];
        elements.extend(
            self.descendants(root)
                .into_iter()
                .filter(|&id| self.is_element(id)),
        );

        for element in elements {
            let children = self.children(element).to_vec();
            let mut previous_text: Option<NodeId> = None;
            for child in children {
                let Some(text) = self.text(child).map(str::to_string) else {
                    previous_text = None;
                    continue;
                };
                match previous_text {
                    Some(previous) => {
                        let offset = self.node_length(previous);
                        if let Some(NodeKind::Text(data)) =
                            self.nodes.get_mut(&previous).map(|entry| &mut entry.kind)
                        {
                            data.push_str(&text);
                        }
                        self.remove_subtree(child);
                        merges.push(TextMerge {
                            removed: child,
                            into: Some(previous),
                            offset,
                        });
                    }
                    None if text.is_empty() => {
                        self.remove_subtree(child);
                        merges.push(TextMerge {
                            removed: child,
                            into: None,
                            offset: 0,
                        });
                    }
                    None => previous_text = Some(child),
                }
            }
        }
        merges
    }

    // =========================================================================
    // Attributes and inline style
    // =========================================================================

    /// The value of an attribute.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// All attributes of an element, in order.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    fn attributes_mut(&mut self, id: NodeId) -> DomResult<&mut Vec<(String, String)>> {
        match &mut self.entry_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    /// Set (or add) an attribute.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> DomResult<()> {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        let attributes = self.attributes_mut(id)?;
        match attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => attributes.push((name, value)),
        }
        Ok(())
    }

    /// Remove an attribute; absent attributes are ignored.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        self.attributes_mut(id)?.retain(|(key, _)| key != name);
        Ok(())
    }

    /// The value of one inline style property.
    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        let style = self.attribute(id, "style")?;
        parse_style(style)
            .into_iter()
            .find(|(key, _)| key == property)
            .map(|(_, value)| value)
    }

    /// Set one inline style property.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) -> DomResult<()> {
        let mut declarations = parse_style(self.attribute(id, "style").unwrap_or_default());
        match declarations.iter_mut().find(|(key, _)| key == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => declarations.push((property.to_string(), value.to_string())),
        }
        self.set_attribute(id, "style", serialize_style(&declarations))
    }

    /// Remove one inline style property; drops the attribute once empty.
    pub fn remove_style(&mut self, id: NodeId, property: &str) -> DomResult<()> {
        if !self.is_element(id) {
            self.entry(id)?;
            return Err(DomError::NotAnElement(id));
        }
        let mut declarations = parse_style(self.attribute(id, "style").unwrap_or_default());
        declarations.retain(|(key, _)| key != property);
        if declarations.is_empty() {
            self.remove_attribute(id, "style")
        } else {
            self.set_attribute(id, "style", serialize_style(&declarations))
        }
    }

    // =========================================================================
    // Markup and content transfer
    // =========================================================================

    /// Serialized markup of the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        markup::serialize_children(self, id)
    }

    /// Replace the node's children by the parsed markup.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> DomResult<()> {
        if !self.is_element(id) {
            self.entry(id)?;
            return Err(DomError::NotAnElement(id));
        }
        for child in self.children(id).to_vec() {
            self.remove_subtree(child);
        }
        markup::parse_into(self, id, html)
    }

    /// Remove all children of `parent`, handing them out with their subtrees.
    pub fn detach_children(&mut self, parent: NodeId) -> DetachedContent {
        let roots = self.children(parent).to_vec();
        let mut content = DetachedContent {
            roots: roots.clone(),
            nodes: HashMap::new(),
        };
        if let Some(entry) = self.nodes.get_mut(&parent) {
            entry.children.clear();
        }

        let mut stack = roots;
        while let Some(id) = stack.pop() {
            if let Some(mut entry) = self.nodes.remove(&id) {
                if entry.parent == Some(parent) {
                    entry.parent = None;
                }
                stack.extend(entry.children.iter().copied());
                content.nodes.insert(id, entry);
            }
        }
        content
    }

    /// Append previously detached content to `parent`, keeping node IDs.
    pub fn adopt_children(&mut self, parent: NodeId, content: DetachedContent) -> DomResult<()> {
        if !self.is_element(parent) {
            self.entry(parent)?;
            return Err(DomError::NotAnElement(parent));
        }
        let DetachedContent { roots, nodes } = content;
        self.nodes.extend(nodes);
        for root in roots {
            if let Some(entry) = self.nodes.get_mut(&root) {
                entry.parent = Some(parent);
            }
            self.entry_mut(parent)?.children.push(root);
        }
        Ok(())
    }
}

/// Byte index of the `offset`-th character, clamped to the string end.
pub(crate) fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (key, value) = declaration.split_once(':')?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            (!key.is_empty() && !value.is_empty()).then(|| (key, value.to_string()))
        })
        .collect()
}

fn serialize_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(key, value)| format!("{key}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(tree: &mut DomTree, text: &str) -> (NodeId, NodeId) {
        let p = tree.create_element("P");
        let t = tree.create_text(text);
        tree.append_child(p, t).unwrap();
        tree.append_child(tree.body(), p).unwrap();
        (p, t)
    }

    #[test]
    fn test_append_and_structure() {
        let mut tree = DomTree::new();
        let (p, t) = paragraph(&mut tree, "hello");

        assert_eq!(tree.tag(p), Some("p"));
        assert_eq!(tree.parent(t), Some(p));
        assert_eq!(tree.children(tree.body()), &[p]);
        assert_eq!(tree.node_length(t), 5);
        assert_eq!(tree.node_length(p), 1);
        assert!(tree.is_attached(t));
        assert_eq!(tree.ancestors(t).collect::<Vec<_>>(), vec![p, tree.body()]);
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut tree = DomTree::new();
        let (p, t) = paragraph(&mut tree, "x");
        assert_eq!(
            tree.append_child(p, tree.body()),
            Err(DomError::HierarchyRequest {
                parent: p,
                child: tree.body()
            })
        );
        assert!(matches!(
            tree.append_child(t, p),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn test_split_text_counts_characters() {
        let mut tree = DomTree::new();
        let (p, t) = paragraph(&mut tree, "héllo");

        let tail = tree.split_text(t, 2).unwrap();
        assert_eq!(tree.text(t), Some("hé"));
        assert_eq!(tree.text(tail), Some("llo"));
        assert_eq!(tree.children(p), &[t, tail]);
        assert!(matches!(
            tree.split_text(t, 9),
            Err(DomError::IndexSize { .. })
        ));
    }

    #[test]
    fn test_normalize_merges_and_drops_empty_text() {
        let mut tree = DomTree::new();
        let (p, t) = paragraph(&mut tree, "ab");
        let empty = tree.create_text("");
        let more = tree.create_text("cd");
        tree.append_child(p, empty).unwrap();
        tree.append_child(p, more).unwrap();

        let merges = tree.normalize(tree.body());
        assert_eq!(tree.children(p), &[t]);
        assert_eq!(
            merges,
            vec![
                TextMerge { removed: empty, into: Some(t), offset: 2 },
                TextMerge { removed: more, into: Some(t), offset: 2 },
            ]
        );
        assert_eq!(tree.text(t), Some("abcd"));
        assert!(!tree.contains(more));
    }

    #[test]
    fn test_style_round_trip() {
        let mut tree = DomTree::new();
        let span = tree.create_element("span");
        tree.set_style(span, "font-family", "Arial").unwrap();
        tree.set_style(span, "color", "red").unwrap();
        assert_eq!(tree.attribute(span, "style"), Some("font-family: Arial; color: red;"));

        tree.set_style(span, "font-family", "Georgia").unwrap();
        assert_eq!(tree.style(span, "font-family").as_deref(), Some("Georgia"));

        tree.remove_style(span, "font-family").unwrap();
        tree.remove_style(span, "color").unwrap();
        assert_eq!(tree.attribute(span, "style"), None);
    }

    #[test]
    fn test_unwrap_element_keeps_children_in_place() {
        let mut tree = DomTree::new();
        let (p, t) = paragraph(&mut tree, "x");
        let b = tree.wrap(t, "b").unwrap();
        assert_eq!(tree.inner_html(tree.body()), "<p><b>x</b></p>");

        tree.unwrap_element(b).unwrap();
        assert_eq!(tree.children(p), &[t]);
        assert!(!tree.contains(b));
    }

    #[test]
    fn test_detach_and_adopt_keep_identity() {
        let mut source = DomTree::new();
        let (p, t) = paragraph(&mut source, "kept");

        let content = source.detach_children(source.body());
        assert!(source.children(source.body()).is_empty());
        assert!(!source.contains(t));
        assert!(content.contains(t));
        assert_eq!(content.roots(), &[p]);

        let mut target = DomTree::new();
        target.adopt_children(target.body(), content).unwrap();
        assert_eq!(target.children(target.body()), &[p]);
        assert_eq!(target.parent(t), Some(p));
        assert_eq!(target.inner_html(target.body()), "<p>kept</p>");
    }
}
