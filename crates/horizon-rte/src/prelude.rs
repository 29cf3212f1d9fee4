//! Prelude module for Horizon RTE.
//!
//! ```ignore
//! use horizon_rte::prelude::*;
//! ```
//!
//! This provides access to:
//! - The editor control and its settings (`SimpleEditor`, `EditorSettings`)
//! - Toolbar extension (`ToolbarItem`, `CommandRegistry`, `CustomElement`)
//! - The command-facing editor view (`EditorFacade`, `SelectionTools`)
//! - Framework primitives (`Signal`, `Property`, `RenderManager`)

// ============================================================================
// Editor
// ============================================================================

pub use crate::editor::SimpleEditor;
pub use crate::settings::EditorSettings;
pub use crate::surface::SurfaceState;

// ============================================================================
// Toolbar Extension
// ============================================================================

pub use crate::item::{GlyphId, ItemCheck, ItemCommand, ItemElement, ToolbarItem};
pub use crate::registry::{CommandRegistry, RegistryOptions};
pub use crate::toolbar::{CustomElement, ToolbarElement, ToolbarSpec};

// ============================================================================
// Command Facade
// ============================================================================

pub use crate::dom::{Boundary, ContentDocument, Range, Selection};
pub use crate::facade::{EditorFacade, EditorHandle, Prompt};
pub use crate::selection_tools::SelectionTools;

// ============================================================================
// Errors
// ============================================================================

pub use crate::error::RteError;

// ============================================================================
// Framework Primitives
// ============================================================================

pub use horizon_rte_core::{Control, Property, RenderManager, ResizeHandler, Signal, Size};
