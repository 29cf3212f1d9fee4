//! The editable document hosted by a content surface.
//!
//! A [`ContentDocument`] owns a [`DomTree`], the live selection, the native
//! command engine state and its undo history. Handles are cheap clones of one
//! shared document. Listeners attached to [`ContentDocument::input`] and
//! [`ContentDocument::selection_changed`] are invoked after the document lock
//! is released, so they may freely read or edit the document again.

use std::fmt;
use std::sync::Arc;

use horizon_rte_core::Signal;
use horizon_rte_core::logging::targets;
use parking_lot::Mutex;

use super::editing::{self, NativeCommand};
use super::range::{Boundary, Range, surround_contents};
use super::tree::{DetachedContent, DomTree, NodeId};
use crate::error::DomResult;

/// Maximum number of undo steps kept per document.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Default)]
struct History {
    undo: Vec<String>,
    redo: Vec<String>,
}

impl History {
    fn record(&mut self, before: String) {
        self.undo.push(before);
        if self.undo.len() > HISTORY_LIMIT {
            self.undo.remove(0);
        }
        self.redo.clear();
    }
}

struct DocumentState {
    tree: DomTree,
    ranges: Vec<Range>,
    content_editable: bool,
    style_with_css: bool,
    history: History,
}

impl DocumentState {
    fn body_html(&self) -> String {
        self.tree.inner_html(self.tree.body())
    }

    fn fix_ranges(&mut self) {
        let tree = &self.tree;
        self.ranges.retain_mut(|range| match range.clamped(tree) {
            Some(clamped) => {
                *range = clamped;
                true
            }
            None => false,
        });
    }

    fn caret_at_body_end(&mut self) {
        let body = self.tree.body();
        self.ranges = vec![Range::caret(Boundary::new(body, self.tree.node_length(body)))];
    }

    /// Replace the body with a history entry.
    fn restore(&mut self, html: &str) -> DomResult<()> {
        let body = self.tree.body();
        self.tree.set_inner_html(body, html)?;
        self.caret_at_body_end();
        Ok(())
    }
}

struct DocumentShared {
    stub: bool,
    state: Mutex<DocumentState>,
    input: Signal<()>,
    selection_changed: Signal<()>,
}

/// Shared handle to an editable document.
#[derive(Clone)]
pub struct ContentDocument {
    shared: Arc<DocumentShared>,
}

/// What an operation changed; signals are emitted from this after unlocking.
#[derive(Debug, Default, Clone, Copy)]
struct Changes {
    content: bool,
    selection: bool,
}

impl ContentDocument {
    /// Create an empty, non-editable document.
    pub fn new() -> Self {
        Self::with_stub_flag(false)
    }

    /// A placeholder document handed out while no live document exists.
    ///
    /// It never holds ranges, ignores `add_range`, and every native command is
    /// a no-op returning `false`.
    pub fn stub() -> Self {
        Self::with_stub_flag(true)
    }

    fn with_stub_flag(stub: bool) -> Self {
        Self {
            shared: Arc::new(DocumentShared {
                stub,
                state: Mutex::new(DocumentState {
                    tree: DomTree::new(),
                    ranges: Vec::new(),
                    content_editable: false,
                    style_with_css: false,
                    history: History::default(),
                }),
                input: Signal::new(),
                selection_changed: Signal::new(),
            }),
        }
    }

    /// Whether this is the placeholder document.
    pub fn is_stub(&self) -> bool {
        self.shared.stub
    }

    /// Whether both handles refer to the same document.
    pub fn ptr_eq(&self, other: &ContentDocument) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// The document's selection.
    pub fn selection(&self) -> Selection {
        Selection {
            document: self.clone(),
        }
    }

    /// Emitted after user input or a native command changed the content.
    pub fn input(&self) -> &Signal<()> {
        &self.shared.input
    }

    /// Emitted after the selection changed.
    pub fn selection_changed(&self) -> &Signal<()> {
        &self.shared.selection_changed
    }

    fn emit(&self, changes: Changes) {
        if changes.content {
            self.shared.input.emit(());
        }
        if changes.selection {
            self.shared.selection_changed.emit(());
        }
    }

    /// The body element.
    pub fn body(&self) -> NodeId {
        self.shared.state.lock().tree.body()
    }

    /// Read access to the node tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&DomTree) -> R) -> R {
        f(&self.shared.state.lock().tree)
    }

    /// Direct structural edits; the selection is clamped afterwards and
    /// ranges whose nodes left the document are dropped.
    pub fn with_tree_mut<R>(&self, f: impl FnOnce(&mut DomTree) -> R) -> R {
        let mut state = self.shared.state.lock();
        let result = f(&mut state.tree);
        state.fix_ranges();
        result
    }

    /// Turn editing on or off.
    pub fn set_content_editable(&self, editable: bool) {
        self.shared.state.lock().content_editable = editable;
    }

    /// Whether the document accepts edits.
    pub fn is_content_editable(&self) -> bool {
        self.shared.state.lock().content_editable
    }

    /// Whether inline formatting is written as styled spans.
    pub fn style_with_css(&self) -> bool {
        self.shared.state.lock().style_with_css
    }

    /// Run a native command by name.
    ///
    /// Returns `false` for unknown commands, for commands missing a required
    /// value, and when the document is not editable or is the stub.
    pub fn exec_command(&self, name: &str, value: Option<&str>) -> bool {
        let Some(command) = NativeCommand::parse(name) else {
            tracing::debug!(target: targets::DOM, command = name, "unsupported native command");
            return false;
        };
        if self.is_stub() {
            return false;
        }

        let (executed, changes) = {
            let mut state = self.shared.state.lock();
            if !state.content_editable {
                return false;
            }
            Self::run_command(&mut state, command, value)
        };
        self.emit(changes);
        executed
    }

    fn run_command(
        state: &mut DocumentState,
        command: NativeCommand,
        value: Option<&str>,
    ) -> (bool, Changes) {
        let ranges_before = state.ranges.clone();
        match command {
            NativeCommand::StyleWithCss => {
                state.style_with_css = value.is_none_or(|flag| !flag.eq_ignore_ascii_case("false"));
                return (true, Changes::default());
            }
            NativeCommand::Undo | NativeCommand::Redo => {
                let current = state.body_html();
                let entry = if command == NativeCommand::Undo {
                    state.history.undo.pop()
                } else {
                    state.history.redo.pop()
                };
                let Some(entry) = entry else {
                    return (false, Changes::default());
                };
                if command == NativeCommand::Undo {
                    state.history.redo.push(current);
                } else {
                    state.history.undo.push(current);
                }
                if let Err(err) = state.restore(&entry) {
                    tracing::warn!(target: targets::DOM, error = %err, "failed to restore history entry");
                }
                return (true, Changes { content: true, selection: true });
            }
            _ => {}
        }

        if command.requires_value() && value.is_none() {
            return (false, Changes::default());
        }

        let before = state.body_html();
        let style_with_css = state.style_with_css;
        let DocumentState { tree, ranges, .. } = &mut *state;
        if let Err(err) = editing::execute(tree, ranges, style_with_css, command, value) {
            tracing::warn!(target: targets::DOM, ?command, error = %err, "native command failed");
        }
        state.fix_ranges();

        let content = state.body_html() != before;
        if content {
            state.history.record(before);
        }
        tracing::trace!(target: targets::DOM, ?command, changed = content, "native command");
        (
            true,
            Changes {
                content,
                selection: state.ranges != ranges_before,
            },
        )
    }

    /// Whether a native command is in effect at the current selection.
    pub fn query_command_state(&self, name: &str) -> bool {
        let Some(command) = NativeCommand::parse(name) else {
            return false;
        };
        let state = self.shared.state.lock();
        match command {
            NativeCommand::StyleWithCss => state.style_with_css,
            _ => editing::query_state(&state.tree, &state.ranges, command),
        }
    }

    /// Merge adjacent text nodes; boundaries inside merged nodes move along.
    pub fn normalize(&self) {
        if self.is_stub() {
            return;
        }
        let mut state = self.shared.state.lock();
        let body = state.tree.body();
        let merges = state.tree.normalize(body);
        for merge in merges {
            for range in &mut state.ranges {
                for boundary in [&mut range.start, &mut range.end] {
                    if boundary.node != merge.removed {
                        continue;
                    }
                    if let Some(into) = merge.into {
                        *boundary = Boundary::new(into, merge.offset + boundary.offset);
                    }
                }
            }
        }
        state.fix_ranges();
    }

    /// Serialized markup of the body's children.
    pub fn body_inner_html(&self) -> String {
        self.shared.state.lock().body_html()
    }

    /// Replace the body content. The selection is cleared.
    pub fn set_body_inner_html(&self, html: &str) -> DomResult<()> {
        let had_ranges = {
            let mut state = self.shared.state.lock();
            let body = state.tree.body();
            state.tree.set_inner_html(body, html)?;
            let had_ranges = !state.ranges.is_empty();
            state.ranges.clear();
            had_ranges
        };
        self.emit(Changes {
            content: false,
            selection: had_ranges,
        });
        Ok(())
    }

    /// Remove the body's top-level children, keeping their node handles.
    pub fn detach_body_children(&self) -> DetachedContent {
        let mut state = self.shared.state.lock();
        let body = state.tree.body();
        let content = state.tree.detach_children(body);
        state.fix_ranges();
        content
    }

    /// Append previously detached nodes to the body, in order.
    pub fn adopt_into_body(&self, content: DetachedContent) -> DomResult<()> {
        let mut state = self.shared.state.lock();
        let body = state.tree.body();
        state.tree.adopt_children(body, content)
    }

    /// Wrap the contents of `range` in the detached element `wrapper`.
    pub fn surround_contents(&self, range: Range, wrapper: NodeId) -> DomResult<()> {
        self.with_tree_mut(|tree| surround_contents(tree, range, wrapper))
    }

    /// Simulate the user typing `text` over the current selection.
    pub fn type_text(&self, text: &str) {
        if self.is_stub() {
            return;
        }
        let changes = {
            let mut state = self.shared.state.lock();
            if !state.content_editable || state.ranges.is_empty() {
                return;
            }
            let before = state.body_html();
            let DocumentState { tree, ranges, .. } = &mut *state;
            if let Err(err) = editing::insert_text(tree, ranges, text) {
                tracing::warn!(target: targets::DOM, error = %err, "text insertion failed");
            }
            let content = state.body_html() != before;
            if content {
                state.history.record(before);
            }
            Changes {
                content,
                selection: true,
            }
        };
        self.emit(changes);
    }

    /// Number of undo steps available.
    pub fn undo_depth(&self) -> usize {
        self.shared.state.lock().history.undo.len()
    }
}

impl Default for ContentDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContentDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentDocument")
            .field("stub", &self.is_stub())
            .finish_non_exhaustive()
    }
}

/// The selection of a [`ContentDocument`].
#[derive(Clone, Debug)]
pub struct Selection {
    document: ContentDocument,
}

impl Selection {
    /// The document this selection belongs to.
    pub fn document(&self) -> &ContentDocument {
        &self.document
    }

    /// Number of ranges.
    pub fn range_count(&self) -> usize {
        self.document.shared.state.lock().ranges.len()
    }

    /// The range at `index`.
    pub fn range_at(&self, index: usize) -> Option<Range> {
        self.document.shared.state.lock().ranges.get(index).copied()
    }

    /// All ranges, in order.
    pub fn ranges(&self) -> Vec<Range> {
        self.document.shared.state.lock().ranges.clone()
    }

    /// Add a range. Ignored on the stub document and for ranges that do not
    /// point into the attached document.
    pub fn add_range(&self, range: Range) {
        if self.document.is_stub() {
            return;
        }
        {
            let mut state = self.document.shared.state.lock();
            if !range.is_valid(&state.tree) {
                tracing::debug!(target: targets::DOM, ?range, "ignoring range outside the document");
                return;
            }
            state.ranges.push(range);
        }
        self.document.emit(Changes {
            content: false,
            selection: true,
        });
    }

    /// Remove every range.
    pub fn remove_all_ranges(&self) {
        let removed = {
            let mut state = self.document.shared.state.lock();
            let removed = !state.ranges.is_empty();
            state.ranges.clear();
            removed
        };
        if removed {
            self.document.emit(Changes {
                content: false,
                selection: true,
            });
        }
    }

    /// Replace the selection with a caret.
    pub fn collapse(&self, at: Boundary) {
        self.remove_all_ranges();
        self.add_range(Range::caret(at));
    }
}

static_assertions::assert_impl_all!(ContentDocument: Send, Sync);
static_assertions::assert_impl_all!(Selection: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn editable(html: &str) -> ContentDocument {
        let document = ContentDocument::new();
        document.set_content_editable(true);
        document.set_body_inner_html(html).unwrap();
        document
    }

    fn select_all(document: &ContentDocument) {
        let body = document.body();
        let range = document.with_tree(|tree| Range::selecting_contents(tree, body));
        let selection = document.selection();
        selection.remove_all_ranges();
        selection.add_range(range);
    }

    #[test]
    fn test_stub_is_inert() {
        let stub = ContentDocument::stub();
        let body = stub.body();
        stub.selection().add_range(Range::caret(Boundary::new(body, 0)));

        assert!(stub.is_stub());
        assert_eq!(stub.selection().range_count(), 0);
        assert!(!stub.exec_command("bold", None));
        stub.normalize();
        stub.type_text("x");
        assert_eq!(stub.body_inner_html(), "");
    }

    #[test]
    fn test_exec_requires_editable() {
        let document = ContentDocument::new();
        document.set_body_inner_html("<p>x</p>").unwrap();
        select_all(&document);
        assert!(!document.exec_command("bold", None));

        document.set_content_editable(true);
        assert!(document.exec_command("bold", None));
        assert_eq!(document.body_inner_html(), "<p><b>x</b></p>");
        assert!(!document.exec_command("frobnicate", None));
    }

    #[test]
    fn test_exec_emits_input_and_records_history() {
        let document = editable("<p>abc</p>");
        let inputs = Arc::new(AtomicUsize::new(0));
        let inputs_clone = inputs.clone();
        document.input().connect(move |_| {
            inputs_clone.fetch_add(1, Ordering::SeqCst);
        });
        select_all(&document);

        assert!(document.exec_command("italic", None));
        assert_eq!(document.body_inner_html(), "<p><i>abc</i></p>");
        assert_eq!(inputs.load(Ordering::SeqCst), 1);
        assert_eq!(document.undo_depth(), 1);

        assert!(document.exec_command("undo", None));
        assert_eq!(document.body_inner_html(), "<p>abc</p>");
        assert!(document.exec_command("redo", None));
        assert_eq!(document.body_inner_html(), "<p><i>abc</i></p>");
        assert!(!document.exec_command("redo", None));
    }

    #[test]
    fn test_style_with_css_flag() {
        let document = editable("<p>abc</p>");
        assert!(document.exec_command("styleWithCSS", Some("true")));
        assert!(document.query_command_state("styleWithCSS"));

        select_all(&document);
        document.exec_command("bold", None);
        assert_eq!(
            document.body_inner_html(),
            r#"<p><span style="font-weight: bold;">abc</span></p>"#
        );

        document.exec_command("styleWithCSS", Some("false"));
        assert!(!document.style_with_css());
    }

    #[test]
    fn test_normalize_moves_boundaries() {
        let document = editable("<p>ab</p>");
        let (p, first) = document.with_tree(|tree| {
            let p = tree.children(tree.body())[0];
            (p, tree.children(p)[0])
        });
        let second = document.with_tree_mut(|tree| tree.split_text(first, 1).unwrap());
        document
            .selection()
            .add_range(Range::caret(Boundary::new(second, 1)));

        document.normalize();
        assert_eq!(document.with_tree(|tree| tree.children(p).len()), 1);
        assert_eq!(
            document.selection().range_at(0),
            Some(Range::caret(Boundary::new(first, 2)))
        );
    }

    #[test]
    fn test_selection_changed_emitted_outside_lock() {
        let document = editable("<p>abc</p>");
        let doc = document.clone();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        document.selection_changed().connect(move |_| {
            seen_clone.store(doc.selection().range_count(), Ordering::SeqCst);
        });

        select_all(&document);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_type_text_over_selection() {
        let document = editable("<p>abc</p>");
        let text = document.with_tree(|tree| tree.children(tree.children(tree.body())[0])[0]);
        document.selection().collapse(Boundary::new(text, 3));

        document.type_text("def");
        assert_eq!(document.body_inner_html(), "<p>abcdef</p>");
        assert_eq!(document.undo_depth(), 1);
    }
}
