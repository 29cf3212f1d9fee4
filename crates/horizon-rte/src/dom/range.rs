//! Boundary points and ranges.
//!
//! A [`Boundary`] is a `(node, offset)` pair: for text nodes the offset counts
//! characters, for elements it counts children. Ranges are plain values; they
//! are validated against a [`DomTree`] whenever they are used.

use std::cmp::Ordering;

use super::tree::{DomTree, NodeId};
use crate::error::{DomError, DomResult};

/// A position inside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    /// The container node.
    pub node: NodeId,
    /// Offset within the container.
    pub offset: usize,
}

impl Boundary {
    /// Create a boundary point.
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Document-order comparison of two boundaries in `tree`.
    pub fn compare(&self, other: &Boundary, tree: &DomTree) -> Ordering {
        position_key(tree, *self).cmp(&position_key(tree, *other))
    }
}

/// A contiguous span of the document between two boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// Start boundary.
    pub start: Boundary,
    /// End boundary.
    pub end: Boundary,
}

/// The part of one text node covered by a range, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSegment {
    /// The text node.
    pub node: NodeId,
    /// First covered character.
    pub start: usize,
    /// One past the last covered character.
    pub end: usize,
}

impl Range {
    /// Create a range between two boundaries.
    pub const fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// A collapsed range at `at`.
    pub const fn caret(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    /// A range spanning all contents of `node`.
    pub fn selecting_contents(tree: &DomTree, node: NodeId) -> Self {
        Self {
            start: Boundary::new(node, 0),
            end: Boundary::new(node, tree.node_length(node)),
        }
    }

    /// Whether start and end coincide.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The deepest node containing both boundaries.
    pub fn common_ancestor(&self, tree: &DomTree) -> Option<NodeId> {
        let start_chain: Vec<NodeId> = std::iter::once(self.start.node)
            .chain(tree.ancestors(self.start.node))
            .collect();
        std::iter::once(self.end.node)
            .chain(tree.ancestors(self.end.node))
            .find(|node| start_chain.contains(node))
    }

    /// Whether both boundaries are attached to `tree` and within bounds.
    pub fn is_valid(&self, tree: &DomTree) -> bool {
        [self.start, self.end].iter().all(|boundary| {
            tree.is_attached(boundary.node) && boundary.offset <= tree.node_length(boundary.node)
        })
    }

    /// The range with offsets clamped to node lengths, or `None` when a
    /// boundary node is no longer attached.
    pub fn clamped(&self, tree: &DomTree) -> Option<Range> {
        let clamp = |boundary: Boundary| {
            tree.is_attached(boundary.node).then(|| {
                Boundary::new(
                    boundary.node,
                    boundary.offset.min(tree.node_length(boundary.node)),
                )
            })
        };
        Some(Range::new(clamp(self.start)?, clamp(self.end)?))
    }

    /// The range with boundaries swapped if they are out of document order.
    pub fn ordered(&self, tree: &DomTree) -> Range {
        match self.start.compare(&self.end, tree) {
            Ordering::Greater => Range::new(self.end, self.start),
            _ => *self,
        }
    }

    /// Text covered by the range, split per text node in document order.
    pub fn text_segments(&self, tree: &DomTree) -> Vec<TextSegment> {
        let Some(root) = self.common_ancestor(tree) else {
            return Vec::new();
        };
        let mut candidates = vec![root];
        candidates.extend(tree.descendants(root));

        candidates
            .into_iter()
            .filter(|&node| tree.is_text(node))
            .filter_map(|node| {
                let length = tree.node_length(node);
                let start = if self.start.node == node {
                    self.start.offset
                } else if self.start.compare(&Boundary::new(node, 0), tree) != Ordering::Greater {
                    0
                } else {
                    length
                };
                let end = if self.end.node == node {
                    self.end.offset
                } else if self.end.compare(&Boundary::new(node, length), tree) != Ordering::Less {
                    length
                } else {
                    0
                };
                (start < end).then_some(TextSegment { node, start, end })
            })
            .collect()
    }

    /// Concatenated text covered by the range.
    pub fn text(&self, tree: &DomTree) -> String {
        self.text_segments(tree)
            .into_iter()
            .filter_map(|segment| {
                let text = tree.text(segment.node)?;
                Some(
                    text.chars()
                        .skip(segment.start)
                        .take(segment.end - segment.start)
                        .collect::<String>(),
                )
            })
            .collect()
    }
}

/// Document-order sort key: child index path of the container, then offset.
fn position_key(tree: &DomTree, boundary: Boundary) -> Vec<usize> {
    let mut path = vec![boundary.offset];
    let mut node = boundary.node;
    while let Some(index) = tree.child_index(node) {
        path.push(index);
        match tree.parent(node) {
            Some(parent) => node = parent,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Move the contents of `range` into `wrapper` and put `wrapper` in their place.
///
/// Text boundaries are split as needed. Fails with
/// [`DomError::PartiallySelected`] when a boundary sits inside an element
/// other than the common ancestor, since wrapping would have to break that
/// element apart.
pub fn surround_contents(tree: &mut DomTree, range: Range, wrapper: NodeId) -> DomResult<()> {
    if !tree.is_element(wrapper)
        || tree.parent(wrapper).is_some()
        || !tree.children(wrapper).is_empty()
    {
        return Err(DomError::InvalidSurroundTarget(wrapper));
    }
    for boundary in [range.start, range.end] {
        let length = tree.node_length(boundary.node);
        if !tree.contains(boundary.node) {
            return Err(DomError::NodeNotFound(boundary.node));
        }
        if boundary.offset > length {
            return Err(DomError::IndexSize {
                node: boundary.node,
                offset: boundary.offset,
                length,
            });
        }
    }

    let range = range.ordered(tree);
    let mut ancestor = range
        .common_ancestor(tree)
        .ok_or(DomError::PartiallySelected(range.start.node))?;
    if tree.is_text(ancestor) {
        ancestor = tree
            .parent(ancestor)
            .ok_or(DomError::PartiallySelected(ancestor))?;
    }
    for boundary in [range.start, range.end] {
        let direct_text = tree.is_text(boundary.node) && tree.parent(boundary.node) == Some(ancestor);
        if boundary.node != ancestor && !direct_text {
            return Err(DomError::PartiallySelected(boundary.node));
        }
    }

    // The end is split first so the start offset stays meaningful when both
    // boundaries share a text node.
    let end_ref = reference_after(tree, ancestor, range.end)?;
    let start_ref = reference_after(tree, ancestor, range.start)?;

    let children = tree.children(ancestor).to_vec();
    let index_of = |reference: Option<NodeId>| {
        reference
            .and_then(|node| children.iter().position(|&child| child == node))
            .unwrap_or(children.len())
    };
    let first = index_of(start_ref);
    let last = index_of(end_ref).max(first);
    let moved = children[first..last].to_vec();

    tree.insert_before(ancestor, wrapper, start_ref)?;
    for node in moved {
        tree.append_child(wrapper, node)?;
    }
    Ok(())
}

/// First child of `parent` that lies after `boundary`, splitting text if needed.
fn reference_after(tree: &mut DomTree, parent: NodeId, boundary: Boundary) -> DomResult<Option<NodeId>> {
    if boundary.node == parent {
        return Ok(tree.children(parent).get(boundary.offset).copied());
    }
    let length = tree.node_length(boundary.node);
    if boundary.offset == 0 {
        Ok(Some(boundary.node))
    } else if boundary.offset >= length {
        Ok(tree.next_sibling(boundary.node))
    } else {
        tree.split_text(boundary.node, boundary.offset).map(Some)
    }
}
