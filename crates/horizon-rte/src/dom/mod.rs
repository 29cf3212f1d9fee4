//! Editable document model.
//!
//! This module provides the sub-document the editor edits: a node tree with
//! stable [`NodeId`] handles, boundary points and ranges, a selection, a
//! markup parser and serializer, and the native command engine behind
//! [`ContentDocument::exec_command`].
//!
//! # Example
//!
//! ```
//! use horizon_rte::dom::{ContentDocument, Range};
//!
//! let document = ContentDocument::new();
//! document.set_content_editable(true);
//! document.set_body_inner_html("<p>Hello</p>").unwrap();
//!
//! let body = document.body();
//! let all = document.with_tree(|tree| Range::selecting_contents(tree, body));
//! document.selection().add_range(all);
//!
//! assert!(document.exec_command("bold", None));
//! assert_eq!(document.body_inner_html(), "<p><b>Hello</b></p>");
//! assert!(document.query_command_state("bold"));
//! ```

mod document;
mod editing;
pub mod markup;
mod range;
mod tree;

pub use document::{ContentDocument, HISTORY_LIMIT, Selection};
pub use editing::NativeCommand;
pub use range::{Boundary, Range, TextSegment, surround_contents};
pub use tree::{DetachedContent, DomTree, NodeId, NodeKind, TextMerge};
