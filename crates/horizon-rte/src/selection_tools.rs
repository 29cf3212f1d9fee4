//! Stateless selection helpers handed to toolbar commands.

use crate::dom::{NodeId, Range, Selection};

/// Selection helpers shared by built-in and custom toolbar items.
///
/// A caret (collapsed range) is not something most formatting commands can act
/// on, so commands usually start with [`SelectionTools::select_or_expand`] to
/// grow it to the surrounding node first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionTools;

impl SelectionTools {
    /// Create the helper set.
    pub const fn new() -> Self {
        Self
    }

    /// Return `range`, or, if it is collapsed, select the full contents of its
    /// end container and return that instead.
    ///
    /// The live selection is only replaced in the collapsed case.
    pub fn select_or_expand(&self, range: Range, selection: &Selection) -> Range {
        if !range.is_collapsed() {
            return range;
        }
        let expanded = selection
            .document()
            .with_tree(|tree| Range::selecting_contents(tree, range.end.node));
        selection.remove_all_ranges();
        selection.add_range(expanded);
        expanded
    }

    /// Replace the live selection with a range spanning all contents of `node`.
    ///
    /// `current_range` is the range the command started from; only its
    /// document matters, so any range of the same document will do.
    pub fn select_node_contents(&self, selection: &Selection, current_range: Option<Range>, node: NodeId) {
        let range = selection
            .document()
            .with_tree(|tree| Range::selecting_contents(tree, node));
        tracing::trace!(
            target: horizon_rte_core::logging::targets::COMMAND,
            %node,
            from = ?current_range,
            "selecting node contents"
        );
        selection.remove_all_ranges();
        selection.add_range(range);
    }
}
