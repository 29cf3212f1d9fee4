//! Editor configuration.
//!
//! [`EditorSettings`] collects the editor's initial property values and the
//! options its registry is built with. Every field has a default, so a
//! settings file only needs the keys it changes:
//!
//! ```toml
//! height = "300px"
//! menu_items = "bold italic | undo redo"
//! debug = true
//! ```

use std::path::Path;

use horizon_rte_core::logging::targets;
use serde::Deserialize;

use crate::error::{Result, RteError};

/// The toolbar shown when no configuration is given.
pub const DEFAULT_MENU_ITEMS: &str = "bold italic underline | alignLeft alignCenter alignRight alignJustify | font | link unlink | image | indent outdent orderedlist unorderedlist | undo redo";

/// Height of one toolbar row in logical pixels.
pub const DEFAULT_TOOLBAR_ROW_HEIGHT: f32 = 32.0;

/// Initial configuration of a [`SimpleEditor`](crate::SimpleEditor).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Control width as a CSS size.
    pub width: String,
    /// Control height as a CSS size.
    pub height: String,
    /// Initial markup.
    pub value: String,
    /// Pass the value through the sanitizer.
    pub sanitize_value: bool,
    /// Toolbar configuration string.
    pub menu_items: String,
    /// Register the `debug-rerender` item.
    pub debug: bool,
    /// Height of one toolbar row in logical pixels.
    pub toolbar_row_height: f32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            height: "100%".to_string(),
            value: String::new(),
            sanitize_value: true,
            menu_items: DEFAULT_MENU_ITEMS.to_string(),
            debug: false,
            toolbar_row_height: DEFAULT_TOOLBAR_ROW_HEIGHT,
        }
    }
}

impl EditorSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RteError::io(path, source))?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(target: targets::SETTINGS, path = %path.display(), "editor settings loaded");
        Ok(settings)
    }
}
