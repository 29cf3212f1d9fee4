//! Horizon RTE - a toolbar-driven rich-text editor control.
//!
//! The editor is a toolbar above an editable surface. This crate provides the
//! pieces that make it extensible and keep it stable across re-renders:
//!
//! - **Command registry** ([`CommandRegistry`]): toolbar items by name, seeded
//!   with the built-in formatting, alignment, list, link, image, font and
//!   history items
//! - **Toolbar construction** ([`ToolbarBuilder`]): turns a configuration
//!   string such as `"bold italic | undo redo"` into elements, click handlers
//!   and active-state checks
//! - **Editor facade** ([`EditorFacade`]): the capability-scoped view of an
//!   editor that commands receive
//! - **Content sync** ([`ContentSync`]): preserves content and selection across
//!   structural re-renders
//! - **Editable document model** ([`dom`]): node tree, ranges, selection and
//!   native editing commands
//!
//! # Example
//!
//! ```
//! use horizon_rte::prelude::*;
//!
//! let editor = SimpleEditor::new(EditorSettings {
//!     menu_items: "bold | undo".into(),
//!     ..EditorSettings::default()
//! });
//!
//! let manager = RenderManager::new();
//! let id = manager.add(&editor.control());
//! manager.render(id).unwrap();
//! editor.surface().complete_load();
//!
//! editor.set_value("<p>Hello</p>");
//! assert_eq!(editor.document().body_inner_html(), "<p>Hello</p>");
//! ```

pub mod dom;
mod editor;
pub mod error;
pub mod facade;
pub mod item;
pub mod items;
pub mod prelude;
pub mod registry;
pub mod sanitize;
pub mod selection_tools;
pub mod settings;
pub mod surface;
pub mod sync;
pub mod toolbar;

pub use editor::{EditorBuilder, SimpleEditor};
pub use error::{DomError, Result, RteError};
pub use facade::{CancelPrompt, CommandTarget, EditorFacade, EditorHandle, Prompt};
pub use item::{GlyphId, ItemCheck, ItemCommand, ItemElement, ToolbarItem};
pub use registry::{CommandRegistry, RegistryOptions};
pub use sanitize::{AllowList, AllowListSanitizer, Sanitizer};
pub use selection_tools::SelectionTools;
pub use settings::EditorSettings;
pub use surface::{ContentSurface, SurfaceState};
pub use sync::{ContentSync, RangeSnapshot, RenderSnapshot, RestoreOutcome};
pub use toolbar::{CustomElement, Toolbar, ToolbarBuilder, ToolbarElement, ToolbarSpec};
