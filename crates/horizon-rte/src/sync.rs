//! Content and selection preservation across structural re-renders.
//!
//! A structural render replaces the editable surface and with it the live
//! document. Before the render, [`ContentSync::capture`] records every
//! selection range and detaches the body's top-level nodes. After the new
//! surface has loaded, [`ContentSync::restore`] adopts those nodes into the
//! new document and rebuilds the ranges. Node handles survive the move, so a
//! range recorded against a text node points into the same text afterwards.
//!
//! When nothing was captured, the new document is populated from the
//! persisted value instead.

use std::fmt;

use horizon_rte_core::logging::targets;
use parking_lot::Mutex;

use crate::dom::{Boundary, ContentDocument, DetachedContent, NodeId, Range};
use crate::error::DomResult;

/// One selection range, recorded by node handle and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSnapshot {
    /// Whether the range was a caret.
    pub collapsed: bool,
    /// Node of the start boundary.
    pub start_container: NodeId,
    /// Offset of the start boundary.
    pub start_offset: usize,
    /// Node of the end boundary.
    pub end_container: NodeId,
    /// Offset of the end boundary.
    pub end_offset: usize,
}

impl RangeSnapshot {
    /// Record `range`.
    pub fn of(range: &Range) -> Self {
        Self {
            collapsed: range.is_collapsed(),
            start_container: range.start.node,
            start_offset: range.start.offset,
            end_container: range.end.node,
            end_offset: range.end.offset,
        }
    }

    /// Rebuild the range, mapping `old_body` to `new_body`.
    ///
    /// The body element is recreated with every document, so boundaries that
    /// sat directly in it are moved to the new one.
    pub fn to_range(&self, old_body: NodeId, new_body: NodeId) -> Range {
        let map = |node: NodeId| if node == old_body { new_body } else { node };
        let start = Boundary::new(map(self.start_container), self.start_offset);
        if self.collapsed {
            return Range::caret(start);
        }
        Range::new(start, Boundary::new(map(self.end_container), self.end_offset))
    }
}

/// Everything captured before one structural render.
#[derive(Debug)]
pub struct RenderSnapshot {
    /// The recorded selection ranges, in order.
    pub ranges: Vec<RangeSnapshot>,
    /// The detached body content; `None` when the body was empty.
    pub content: Option<DetachedContent>,
    body: NodeId,
}

/// Result of a [`ContentSync::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreOutcome {
    /// Whether detached nodes were re-adopted (otherwise the persisted value
    /// was parsed).
    pub adopted: bool,
    /// Ranges rebuilt.
    pub restored_ranges: usize,
    /// Ranges dropped because their nodes no longer exist.
    pub dropped_ranges: usize,
}

/// Holds the pending snapshot between capture and restore.
#[derive(Default)]
pub struct ContentSync {
    pending: Mutex<Option<RenderSnapshot>>,
}

impl ContentSync {
    /// Create an instance with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the selection of `document` and detach its body content.
    ///
    /// Any snapshot still pending from an earlier capture is replaced.
    pub fn capture(&self, document: &ContentDocument) {
        let ranges: Vec<RangeSnapshot> = document
            .selection()
            .ranges()
            .iter()
            .map(RangeSnapshot::of)
            .collect();
        let body = document.body();
        let detached = document.detach_body_children();
        let content = (!detached.is_empty()).then_some(detached);

        tracing::debug!(
            target: targets::SYNC,
            ranges = ranges.len(),
            nodes = content.as_ref().map_or(0, |content| content.roots().len()),
            "captured content before render"
        );
        let previous = self.pending.lock().replace(RenderSnapshot {
            ranges,
            content,
            body,
        });
        if previous.is_some() {
            tracing::debug!(target: targets::SYNC, "replaced a snapshot that was never restored");
        }
    }

    /// Populate a freshly loaded `document` and rebuild the captured selection.
    ///
    /// Enables editing and CSS styling first. Detached nodes are re-adopted
    /// when available; otherwise the body is parsed from `value`.
    pub fn restore(&self, document: &ContentDocument, value: &str) -> DomResult<RestoreOutcome> {
        document.set_content_editable(true);
        document.exec_command("styleWithCSS", Some("true"));

        let snapshot = self.pending.lock().take();
        let mut outcome = RestoreOutcome::default();
        let (ranges, content, old_body) = match snapshot {
            Some(RenderSnapshot { ranges, content, body }) => (ranges, content, Some(body)),
            None => (Vec::new(), None, None),
        };

        match content {
            Some(content) => {
                document.adopt_into_body(content)?;
                outcome.adopted = true;
            }
            None => document.set_body_inner_html(value)?,
        }

        let new_body = document.body();
        let selection = document.selection();
        for snapshot in &ranges {
            let range = snapshot.to_range(old_body.unwrap_or(new_body), new_body);
            let valid = document.with_tree(|tree| range.is_valid(tree));
            if valid {
                selection.add_range(range);
                outcome.restored_ranges += 1;
            } else {
                tracing::debug!(target: targets::SYNC, ?snapshot, "dropping range whose nodes no longer exist");
                outcome.dropped_ranges += 1;
            }
        }

        tracing::debug!(
            target: targets::SYNC,
            adopted = outcome.adopted,
            restored = outcome.restored_ranges,
            dropped = outcome.dropped_ranges,
            "restored content after render"
        );
        Ok(outcome)
    }

    /// Forget the pending snapshot so a later restore uses the persisted value.
    pub fn discard(&self) {
        if self.pending.lock().take().is_some() {
            tracing::debug!(target: targets::SYNC, "pending snapshot discarded");
        }
    }

    /// Whether a snapshot is waiting to be restored.
    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl fmt::Debug for ContentSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSync")
            .field("pending", &self.has_pending())
            .finish()
    }
}

static_assertions::assert_impl_all!(ContentSync: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn live(html: &str) -> ContentDocument {
        let document = ContentDocument::new();
        document.set_content_editable(true);
        document.set_body_inner_html(html).unwrap();
        document
    }

    fn first_text(document: &ContentDocument) -> NodeId {
        document.with_tree(|tree| {
            tree.descendants(tree.body())
                .into_iter()
                .find(|&id| tree.is_text(id))
                .unwrap()
        })
    }

    #[test]
    fn test_round_trip_keeps_nodes_and_selection() {
        let old = live("<p>hello <b>world</b></p>");
        let text = first_text(&old);
        let selected = Range::new(Boundary::new(text, 1), Boundary::new(text, 4));
        old.selection().add_range(selected);

        let sync = ContentSync::new();
        sync.capture(&old);
        assert!(sync.has_pending());
        assert_eq!(old.body_inner_html(), "");

        let new = ContentDocument::new();
        let outcome = sync.restore(&new, "<p>ignored</p>").unwrap();

        assert!(outcome.adopted);
        assert_eq!(outcome.restored_ranges, 1);
        assert_eq!(new.body_inner_html(), "<p>hello <b>world</b></p>");
        assert_eq!(new.selection().ranges(), vec![selected]);
        assert!(new.is_content_editable());
        assert!(new.style_with_css());
        assert!(!sync.has_pending());
    }

    #[test]
    fn test_caret_in_body_is_remapped() {
        let old = live("<p>a</p>");
        let body = old.body();
        old.selection().add_range(Range::caret(Boundary::new(body, 1)));

        let sync = ContentSync::new();
        sync.capture(&old);
        let new = ContentDocument::new();
        sync.restore(&new, "").unwrap();

        assert_eq!(
            new.selection().ranges(),
            vec![Range::caret(Boundary::new(new.body(), 1))]
        );
    }

    #[test]
    fn test_restore_without_capture_parses_value() {
        let sync = ContentSync::new();
        let document = ContentDocument::new();
        let outcome = sync.restore(&document, "<p>from value</p>").unwrap();

        assert!(!outcome.adopted);
        assert_eq!(document.body_inner_html(), "<p>from value</p>");
        assert_eq!(document.selection().range_count(), 0);
    }

    #[test]
    fn test_discard_falls_back_to_value() {
        let old = live("<p>stale</p>");
        let sync = ContentSync::new();
        sync.capture(&old);
        sync.discard();
        assert!(!sync.has_pending());

        let new = ContentDocument::new();
        sync.restore(&new, "<p>fresh</p>").unwrap();
        assert_eq!(new.body_inner_html(), "<p>fresh</p>");
    }

    #[test]
    fn test_ranges_into_missing_nodes_are_dropped() {
        let old = live("");
        let orphan = live("<p>elsewhere</p>");
        let foreign = first_text(&orphan);

        let sync = ContentSync::new();
        sync.capture(&old);
        {
            let mut pending = sync.pending.lock();
            let snapshot = pending.as_mut().unwrap();
            snapshot.ranges.push(RangeSnapshot::of(&Range::caret(Boundary::new(foreign, 0))));
        }

        let new = ContentDocument::new();
        let outcome = sync.restore(&new, "<p>x</p>").unwrap();
        assert_eq!(outcome.dropped_ranges, 1);
        assert_eq!(new.selection().range_count(), 0);
    }
}
