//! Error types for the editor subsystem.

use std::path::PathBuf;

use crate::dom::NodeId;

/// Result type alias for editor operations.
pub type Result<T> = std::result::Result<T, RteError>;

/// Result type alias for document model operations.
pub type DomResult<T> = std::result::Result<T, DomError>;

/// Errors raised by the editable document model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node handle does not belong to this document.
    #[error("node {0} does not exist in this document")]
    NodeNotFound(NodeId),

    /// An element-only operation was applied to another node kind.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// A text-only operation was applied to another node kind.
    #[error("node {0} is not a text node")]
    NotAText(NodeId),

    /// Inserting the node would make it its own ancestor, or the parent is a text node.
    #[error("cannot insert node {child} into {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// The node is not a child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// A boundary offset exceeds the node length.
    #[error("offset {offset} is out of bounds for node {node} (length {length})")]
    IndexSize {
        node: NodeId,
        offset: usize,
        length: usize,
    },

    /// The range partially selects a non-text node and cannot be surrounded.
    #[error("range partially selects non-text node {0}")]
    PartiallySelected(NodeId),

    /// Surround targets must be childless, detached elements.
    #[error("surround target {0} must be an empty, detached element")]
    InvalidSurroundTarget(NodeId),
}

/// The main error type for the editor subsystem.
#[derive(Debug, thiserror::Error)]
pub enum RteError {
    /// Toolbar items must be registered under a non-empty name.
    #[error("toolbar item name must not be empty")]
    InvalidItemName,

    /// Document model error.
    #[error("document operation failed: {0}")]
    Dom(#[from] DomError),

    /// Settings could not be parsed.
    #[error("invalid editor settings: {0}")]
    Settings(#[from] toml::de::Error),

    /// Settings file could not be read.
    #[error("failed to read editor settings '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Framework core error.
    #[error(transparent)]
    Core(#[from] horizon_rte_core::CoreError),
}

impl RteError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
