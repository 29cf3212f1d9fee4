//! Native rich-text command engine.
//!
//! Implements the editing commands the toolbar relies on against a
//! [`DomTree`] and its selection ranges. Commands operate on the first
//! selection range. Undo, redo and `styleWithCSS` need document-level state
//! and are handled by [`ContentDocument`](super::ContentDocument).

use std::iter;

use super::range::{Boundary, Range, TextSegment};
use super::tree::{DomTree, NodeId};
use crate::error::{DomError, DomResult};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "div", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "li", "ol", "p", "pre", "section", "td", "th", "ul",
];

const INDENT_STEP_PX: i32 = 40;

/// A command understood by the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCommand {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    JustifyFull,
    Indent,
    Outdent,
    InsertOrderedList,
    InsertUnorderedList,
    CreateLink,
    Unlink,
    InsertImage,
    Undo,
    Redo,
    StyleWithCss,
}

impl NativeCommand {
    /// Parse a command name; matching is case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "strikethrough" => Self::StrikeThrough,
            "justifyleft" => Self::JustifyLeft,
            "justifycenter" => Self::JustifyCenter,
            "justifyright" => Self::JustifyRight,
            "justifyfull" => Self::JustifyFull,
            "indent" => Self::Indent,
            "outdent" => Self::Outdent,
            "insertorderedlist" => Self::InsertOrderedList,
            "insertunorderedlist" => Self::InsertUnorderedList,
            "createlink" => Self::CreateLink,
            "unlink" => Self::Unlink,
            "insertimage" => Self::InsertImage,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "stylewithcss" => Self::StyleWithCss,
            _ => return None,
        })
    }

    /// Whether the command needs a value argument.
    pub fn requires_value(self) -> bool {
        matches!(self, Self::CreateLink | Self::InsertImage)
    }

    /// Whether the command edits the document and belongs in the undo history.
    pub fn records_history(self) -> bool {
        !matches!(self, Self::Undo | Self::Redo | Self::StyleWithCss)
    }

    fn inline_format(self) -> Option<InlineFormat> {
        match self {
            Self::Bold => Some(InlineFormat::Bold),
            Self::Italic => Some(InlineFormat::Italic),
            Self::Underline => Some(InlineFormat::Underline),
            Self::StrikeThrough => Some(InlineFormat::StrikeThrough),
            _ => None,
        }
    }

    fn alignment(self) -> Option<&'static str> {
        match self {
            Self::JustifyLeft => Some("left"),
            Self::JustifyCenter => Some("center"),
            Self::JustifyRight => Some("right"),
            Self::JustifyFull => Some("justify"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineFormat {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
}

impl InlineFormat {
    fn tags(self) -> &'static [&'static str] {
        match self {
            Self::Bold => &["b", "strong"],
            Self::Italic => &["i", "em"],
            Self::Underline => &["u"],
            Self::StrikeThrough => &["s", "strike", "del"],
        }
    }

    fn wrapper_tag(self) -> &'static str {
        self.tags()[0]
    }

    fn css(self) -> (&'static str, &'static str) {
        match self {
            Self::Bold => ("font-weight", "bold"),
            Self::Italic => ("font-style", "italic"),
            Self::Underline => ("text-decoration", "underline"),
            Self::StrikeThrough => ("text-decoration", "line-through"),
        }
    }

    fn matches_css(self, value: &str) -> bool {
        match self {
            Self::Bold => {
                value == "bold"
                    || value == "bolder"
                    || value.parse::<u32>().is_ok_and(|weight| weight >= 600)
            }
            Self::Italic => value == "italic" || value == "oblique",
            Self::Underline | Self::StrikeThrough => {
                value.split_whitespace().any(|word| word == self.css().1)
            }
        }
    }

    fn is_applied_by(self, tree: &DomTree, element: NodeId) -> bool {
        let by_tag = tree
            .tag(element)
            .is_some_and(|tag| self.tags().contains(&tag));
        by_tag
            || tree
                .style(element, self.css().0)
                .is_some_and(|value| self.matches_css(&value))
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Run a document-editing command against the first selection range.
///
/// `ranges` is updated to cover the edited content.
pub(crate) fn execute(
    tree: &mut DomTree,
    ranges: &mut Vec<Range>,
    style_with_css: bool,
    command: NativeCommand,
    value: Option<&str>,
) -> DomResult<()> {
    let Some(range) = ranges.first().map(|range| range.ordered(tree)) else {
        return Ok(());
    };
    if !range.is_valid(tree) {
        return Ok(());
    }

    if let Some(format) = command.inline_format() {
        return toggle_inline(tree, ranges, range, format, style_with_css);
    }
    if let Some(align) = command.alignment() {
        for block in selected_blocks(tree, range)? {
            tree.set_style(block, "text-align", align)?;
        }
        return Ok(());
    }

    match command {
        NativeCommand::Indent => indent(tree, range, INDENT_STEP_PX),
        NativeCommand::Outdent => indent(tree, range, -INDENT_STEP_PX),
        NativeCommand::InsertOrderedList => toggle_list(tree, range, "ol"),
        NativeCommand::InsertUnorderedList => toggle_list(tree, range, "ul"),
        NativeCommand::CreateLink => match value.filter(|href| !href.is_empty()) {
            Some(href) => create_link(tree, ranges, range, href),
            None => Ok(()),
        },
        NativeCommand::Unlink => unlink(tree, ranges, range),
        NativeCommand::InsertImage => match value.filter(|src| !src.is_empty()) {
            Some(src) => {
                delete_contents(tree, range)?;
                let image = tree.create_element("img");
                tree.set_attribute(image, "src", src)?;
                let caret = insert_at(tree, range.start, image)?;
                *ranges = vec![Range::caret(caret)];
                Ok(())
            }
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Whether the command is in effect for the first selection range.
pub(crate) fn query_state(tree: &DomTree, ranges: &[Range], command: NativeCommand) -> bool {
    let Some(range) = ranges.first().map(|range| range.ordered(tree)) else {
        return false;
    };
    if !range.is_valid(tree) {
        return false;
    }

    if let Some(format) = command.inline_format() {
        let segments = range.text_segments(tree);
        if segments.is_empty() {
            return has_format(tree, range.start.node, format);
        }
        return segments
            .iter()
            .all(|segment| has_format(tree, segment.node, format));
    }

    let anchor = boundary_node(tree, range.start);
    if let Some(align) = command.alignment() {
        let current = block_of(tree, anchor).and_then(|block| tree.style(block, "text-align"));
        return match current.as_deref() {
            None | Some("start") => align == "left",
            Some(value) => value == align,
        };
    }

    let list_tag = match command {
        NativeCommand::InsertOrderedList => "ol",
        NativeCommand::InsertUnorderedList => "ul",
        _ => return false,
    };
    nearest_list(tree, anchor).is_some_and(|list| tree.has_tag(list, list_tag))
}

/// Replace the selected text with `text` and leave a caret after it.
pub(crate) fn insert_text(tree: &mut DomTree, ranges: &mut Vec<Range>, text: &str) -> DomResult<()> {
    let Some(range) = ranges.first().map(|range| range.ordered(tree)) else {
        return Ok(());
    };
    if !range.is_valid(tree) {
        return Ok(());
    }

    delete_contents(tree, range)?;
    let start = range.start;
    let caret = match tree.text(start.node).map(str::to_string) {
        Some(existing) => {
            tree.set_text(start.node, splice_chars(&existing, start.offset, start.offset, text))?;
            Boundary::new(start.node, start.offset + text.chars().count())
        }
        None => {
            let node = tree.create_text(text);
            insert_at(tree, start, node)?;
            Boundary::new(node, tree.node_length(node))
        }
    };
    *ranges = vec![Range::caret(caret)];
    Ok(())
}

// =============================================================================
// Inline formatting
// =============================================================================

fn has_format(tree: &DomTree, node: NodeId, format: InlineFormat) -> bool {
    inline_chain(tree, node).any(|id| tree.is_element(id) && format.is_applied_by(tree, id))
}

/// The node and its ancestors below the body.
fn inline_chain(tree: &DomTree, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    let body = tree.body();
    iter::once(node)
        .chain(tree.ancestors(node))
        .take_while(move |&id| id != body)
}

fn toggle_inline(
    tree: &mut DomTree,
    ranges: &mut Vec<Range>,
    range: Range,
    format: InlineFormat,
    style_with_css: bool,
) -> DomResult<()> {
    let segments = range.text_segments(tree);
    if segments.is_empty() {
        return Ok(());
    }
    let active = segments
        .iter()
        .all(|segment| has_format(tree, segment.node, format));

    let nodes = isolate_segments(tree, &segments)?;
    for &node in &nodes {
        if active {
            remove_format(tree, node, format)?;
        } else if !has_format(tree, node, format) {
            apply_format(tree, node, format, style_with_css)?;
        }
    }
    select_text_nodes(tree, ranges, &nodes);
    Ok(())
}

fn apply_format(
    tree: &mut DomTree,
    node: NodeId,
    format: InlineFormat,
    style_with_css: bool,
) -> DomResult<()> {
    if style_with_css {
        let span = tree.wrap(node, "span")?;
        let (property, value) = format.css();
        tree.set_style(span, property, value)
    } else {
        tree.wrap(node, format.wrapper_tag()).map(|_| ())
    }
}

fn remove_format(tree: &mut DomTree, node: NodeId, format: InlineFormat) -> DomResult<()> {
    let formatted: Vec<NodeId> = inline_chain(tree, node)
        .skip(1)
        .filter(|&id| format.is_applied_by(tree, id))
        .collect();
    let Some(&outermost) = formatted.last() else {
        return Ok(());
    };
    split_out(tree, node, outermost)?;

    for element in formatted {
        let by_tag = tree
            .tag(element)
            .is_some_and(|tag| format.tags().contains(&tag));
        if by_tag {
            tree.unwrap_element(element)?;
            continue;
        }
        let (property, keyword) = format.css();
        let remaining = tree.style(element, property).map(|value| {
            value
                .split_whitespace()
                .filter(|word| *word != keyword && !format.matches_css(word))
                .collect::<Vec<_>>()
                .join(" ")
        });
        match remaining {
            Some(rest) if !rest.is_empty() && property == "text-decoration" => {
                tree.set_style(element, property, &rest)?;
            }
            _ => tree.remove_style(element, property)?,
        }
        if tree.has_tag(element, "span") && tree.attributes(element).is_empty() {
            tree.unwrap_element(element)?;
        }
    }
    Ok(())
}

/// Split text nodes so every segment covers a whole node.
fn isolate_segments(tree: &mut DomTree, segments: &[TextSegment]) -> DomResult<Vec<NodeId>> {
    let mut nodes = Vec::with_capacity(segments.len());
    for segment in segments {
        let mut node = segment.node;
        if segment.end < tree.node_length(node) {
            tree.split_text(node, segment.end)?;
        }
        if segment.start > 0 {
            node = tree.split_text(node, segment.start)?;
        }
        nodes.push(node);
    }
    Ok(nodes)
}

/// Split every element from `node`'s parent up to `ancestor` so each of them
/// holds only the branch leading to `node`.
fn split_out(tree: &mut DomTree, node: NodeId, ancestor: NodeId) -> DomResult<()> {
    let mut child = node;
    while let Some(parent) = tree.parent(child) {
        let Some(grandparent) = tree.parent(parent) else {
            break;
        };
        let siblings = tree.children(parent).to_vec();
        let index = siblings
            .iter()
            .position(|&sibling| sibling == child)
            .ok_or(DomError::NotAChild { parent, child })?;

        let before = &siblings[..index];
        if !before.is_empty() {
            let clone = clone_shallow(tree, parent)?;
            tree.insert_before(grandparent, clone, Some(parent))?;
            for &sibling in before {
                tree.append_child(clone, sibling)?;
            }
        }
        let after = &siblings[index + 1..];
        if !after.is_empty() {
            let clone = clone_shallow(tree, parent)?;
            let reference = tree.next_sibling(parent);
            tree.insert_before(grandparent, clone, reference)?;
            for &sibling in after {
                tree.append_child(clone, sibling)?;
            }
        }

        if parent == ancestor {
            break;
        }
        child = parent;
    }
    Ok(())
}

fn clone_shallow(tree: &mut DomTree, element: NodeId) -> DomResult<NodeId> {
    let tag = tree
        .tag(element)
        .ok_or(DomError::NotAnElement(element))?
        .to_string();
    let attributes = tree.attributes(element).to_vec();
    let clone = tree.create_element(&tag);
    for (name, value) in attributes {
        tree.set_attribute(clone, &name, value)?;
    }
    Ok(clone)
}

fn select_text_nodes(tree: &DomTree, ranges: &mut Vec<Range>, nodes: &[NodeId]) {
    if let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) {
        *ranges = vec![Range::new(
            Boundary::new(first, 0),
            Boundary::new(last, tree.node_length(last)),
        )];
    }
}

// =============================================================================
// Block commands
// =============================================================================

fn is_block(tree: &DomTree, node: NodeId) -> bool {
    tree.tag(node).is_some_and(|tag| BLOCK_TAGS.contains(&tag))
}

fn block_of(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    inline_chain(tree, node).find(|&id| is_block(tree, id) && !matches!(tree.tag(id), Some("ul" | "ol")))
}

fn nearest_list(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    inline_chain(tree, node).find(|&id| matches!(tree.tag(id), Some("ul" | "ol")))
}

/// The node a boundary points at: the child at the offset for elements.
fn boundary_node(tree: &DomTree, boundary: Boundary) -> NodeId {
    if tree.is_text(boundary.node) {
        return boundary.node;
    }
    let children = tree.children(boundary.node);
    children
        .get(boundary.offset)
        .or_else(|| children.last())
        .copied()
        .unwrap_or(boundary.node)
}

/// Block elements touched by the range, wrapping bare inline content in a
/// `div` first.
fn selected_blocks(tree: &mut DomTree, range: Range) -> DomResult<Vec<NodeId>> {
    let body = tree.body();
    let mut anchors: Vec<NodeId> = range
        .text_segments(tree)
        .iter()
        .map(|segment| segment.node)
        .collect();
    if anchors.is_empty() {
        anchors.push(boundary_node(tree, range.start));
    }

    let mut blocks = Vec::new();
    for node in anchors {
        if node == body {
            continue;
        }
        let block = match block_of(tree, node) {
            Some(block) => block,
            None => wrap_inline_run(tree, node)?,
        };
        if !blocks.contains(&block) {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

fn wrap_inline_run(tree: &mut DomTree, node: NodeId) -> DomResult<NodeId> {
    let body = tree.body();
    let top = iter::once(node)
        .chain(tree.ancestors(node))
        .find(|&id| tree.parent(id) == Some(body))
        .ok_or(DomError::NotAChild {
            parent: body,
            child: node,
        })?;

    let siblings = tree.children(body).to_vec();
    let index = siblings
        .iter()
        .position(|&id| id == top)
        .ok_or(DomError::NotAChild {
            parent: body,
            child: top,
        })?;
    let mut first = index;
    while first > 0 && !is_block(tree, siblings[first - 1]) {
        first -= 1;
    }
    let mut last = index;
    while last + 1 < siblings.len() && !is_block(tree, siblings[last + 1]) {
        last += 1;
    }

    let div = tree.create_element("div");
    tree.insert_before(body, div, Some(siblings[first]))?;
    for &id in &siblings[first..=last] {
        tree.append_child(div, id)?;
    }
    Ok(div)
}

fn indent(tree: &mut DomTree, range: Range, delta: i32) -> DomResult<()> {
    for block in selected_blocks(tree, range)? {
        let current = tree
            .style(block, "margin-left")
            .and_then(|value| value.trim_end_matches("px").trim().parse::<i32>().ok())
            .unwrap_or(0);
        let margin = current + delta;
        if margin > 0 {
            tree.set_style(block, "margin-left", &format!("{margin}px"))?;
        } else {
            tree.remove_style(block, "margin-left")?;
        }
    }
    Ok(())
}

fn toggle_list(tree: &mut DomTree, range: Range, tag: &str) -> DomResult<()> {
    let anchor = boundary_node(tree, range.start);
    if let Some(list) = nearest_list(tree, anchor) {
        if tree.has_tag(list, tag) {
            for item in tree.children(list).to_vec() {
                if tree.has_tag(item, "li") {
                    rename_element(tree, item, "p")?;
                }
            }
            return tree.unwrap_element(list);
        }
        rename_element(tree, list, tag)?;
        return Ok(());
    }

    let blocks = selected_blocks(tree, range)?;
    let Some(&first) = blocks.first() else {
        return Ok(());
    };
    let parent = tree.parent(first).ok_or(DomError::NotAChild {
        parent: tree.body(),
        child: first,
    })?;
    let list = tree.create_element(tag);
    tree.insert_before(parent, list, Some(first))?;
    for block in blocks {
        let item = tree.create_element("li");
        tree.append_child(list, item)?;
        for child in tree.children(block).to_vec() {
            tree.append_child(item, child)?;
        }
        tree.remove_subtree(block);
    }
    Ok(())
}

fn rename_element(tree: &mut DomTree, element: NodeId, tag: &str) -> DomResult<NodeId> {
    let parent = tree.parent(element).ok_or(DomError::NotAChild {
        parent: tree.body(),
        child: element,
    })?;
    let attributes = tree.attributes(element).to_vec();
    let renamed = tree.create_element(tag);
    for (name, value) in attributes {
        tree.set_attribute(renamed, &name, value)?;
    }
    tree.insert_before(parent, renamed, Some(element))?;
    for child in tree.children(element).to_vec() {
        tree.append_child(renamed, child)?;
    }
    tree.remove_subtree(element);
    Ok(renamed)
}

// =============================================================================
// Links, images and text
// =============================================================================

fn anchors_of(tree: &DomTree, node: NodeId) -> Vec<NodeId> {
    inline_chain(tree, node)
        .filter(|&id| tree.has_tag(id, "a"))
        .collect()
}

fn create_link(tree: &mut DomTree, ranges: &mut Vec<Range>, range: Range, href: &str) -> DomResult<()> {
    if range.is_collapsed() {
        let anchor = tree.create_element("a");
        tree.set_attribute(anchor, "href", href)?;
        let text = tree.create_text(href);
        tree.append_child(anchor, text)?;
        let caret = insert_at(tree, range.start, anchor)?;
        *ranges = vec![Range::caret(caret)];
        return Ok(());
    }

    let segments = range.text_segments(tree);
    let nodes = isolate_segments(tree, &segments)?;
    for &node in &nodes {
        match anchors_of(tree, node).first() {
            Some(&anchor) => tree.set_attribute(anchor, "href", href)?,
            None => {
                let anchor = tree.wrap(node, "a")?;
                tree.set_attribute(anchor, "href", href)?;
            }
        }
    }
    select_text_nodes(tree, ranges, &nodes);
    Ok(())
}

fn unlink(tree: &mut DomTree, ranges: &mut Vec<Range>, range: Range) -> DomResult<()> {
    if range.is_collapsed() {
        for anchor in anchors_of(tree, boundary_node(tree, range.start)) {
            tree.unwrap_element(anchor)?;
        }
        return Ok(());
    }

    let segments = range.text_segments(tree);
    let nodes = isolate_segments(tree, &segments)?;
    for &node in &nodes {
        let anchors = anchors_of(tree, node);
        let Some(&outermost) = anchors.last() else {
            continue;
        };
        split_out(tree, node, outermost)?;
        for anchor in anchors {
            tree.unwrap_element(anchor)?;
        }
    }
    select_text_nodes(tree, ranges, &nodes);
    Ok(())
}

/// Remove the selected characters. Elements are left in place.
fn delete_contents(tree: &mut DomTree, range: Range) -> DomResult<()> {
    for segment in range.text_segments(tree) {
        let Some(text) = tree.text(segment.node) else {
            continue;
        };
        let remaining = splice_chars(text, segment.start, segment.end, "");
        tree.set_text(segment.node, remaining)?;
    }
    Ok(())
}

/// Insert `node` at the boundary, splitting text if needed.
///
/// Returns the boundary right after the inserted node.
fn insert_at(tree: &mut DomTree, at: Boundary, node: NodeId) -> DomResult<Boundary> {
    let (parent, reference) = if tree.is_text(at.node) {
        let parent = tree.parent(at.node).ok_or(DomError::NotAChild {
            parent: tree.body(),
            child: at.node,
        })?;
        let reference = if at.offset == 0 {
            Some(at.node)
        } else if at.offset >= tree.node_length(at.node) {
            tree.next_sibling(at.node)
        } else {
            Some(tree.split_text(at.node, at.offset)?)
        };
        (parent, reference)
    } else {
        (at.node, tree.children(at.node).get(at.offset).copied())
    };

    tree.insert_before(parent, node, reference)?;
    let index = tree.child_index(node).unwrap_or(0);
    Ok(Boundary::new(parent, index + 1))
}

fn splice_chars(text: &str, start: usize, end: usize, insert: &str) -> String {
    let mut out: String = text.chars().take(start).collect();
    out.push_str(insert);
    out.extend(text.chars().skip(end));
    out
}
