//! Toolbar item descriptors.
//!
//! A [`ToolbarItem`] describes one entry a toolbar configuration string may
//! name: how its element looks, what it does when clicked and how its active
//! state is determined. Each of those is a tagged union fixed at registration
//! time, so the builder never inspects runtime types.
//!
//! # Example
//!
//! ```
//! use horizon_rte::item::{GlyphId, ItemCheck, ItemCommand, ItemElement, ToolbarItem};
//!
//! let item = ToolbarItem::new("bold", ItemElement::Glyph(GlyphId(0xf032)))
//!     .with_title("Make selection bold")
//!     .with_command(ItemCommand::native("bold"));
//!
//! assert_eq!(item.name(), "bold");
//! assert!(matches!(item.check(), ItemCheck::Native));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::facade::{EditorFacade, EditorHandle};
use crate::selection_tools::SelectionTools;
use crate::toolbar::ToolbarElement;

/// A code point in the toolbar icon font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphId(pub u32);

impl GlyphId {
    /// Parse a hexadecimal code point such as `"f032"`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        u32::from_str_radix(hex, 16).ok().map(Self)
    }

    /// The glyph as a character, if it is a valid code point.
    pub fn as_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

impl fmt::Display for GlyphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// Builds a custom toolbar element for one editor.
pub type ElementFactory = Arc<dyn Fn(&EditorHandle, &SelectionTools) -> ToolbarElement + Send + Sync>;

/// A command implemented in code rather than by the native engine.
pub type CustomCommand = Arc<dyn Fn(&dyn EditorFacade, &SelectionTools) + Send + Sync>;

/// An active-state predicate. The element is the one being checked.
pub type CustomCheck = Arc<dyn Fn(&dyn EditorFacade, &ToolbarElement) -> bool + Send + Sync>;

/// How a toolbar item is displayed.
#[derive(Clone)]
pub enum ItemElement {
    /// An icon-font glyph button.
    Glyph(GlyphId),
    /// A visual separator.
    Separator,
    /// A factory producing a complete element. The item's command is ignored.
    Custom(ElementFactory),
}

/// What clicking a toolbar item does.
#[derive(Clone)]
pub enum ItemCommand {
    /// Run a native editing command by name.
    Native(String),
    /// Run custom code.
    Custom(CustomCommand),
}

impl ItemCommand {
    /// A native command.
    pub fn native(name: impl Into<String>) -> Self {
        Self::Native(name.into())
    }

    /// A custom command.
    pub fn custom<F>(command: F) -> Self
    where
        F: Fn(&dyn EditorFacade, &SelectionTools) + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(command))
    }
}

/// How a toolbar item's active state is determined.
#[derive(Clone, Default)]
pub enum ItemCheck {
    /// Never highlighted.
    Disabled,
    /// Query native command state for the item's native command.
    #[default]
    Native,
    /// Custom predicate.
    Custom(CustomCheck),
}

impl ItemCheck {
    /// A custom predicate.
    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&dyn EditorFacade, &ToolbarElement) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(check))
    }
}

/// A registered toolbar item.
#[derive(Clone)]
pub struct ToolbarItem {
    name: String,
    title: Option<String>,
    element: ItemElement,
    command: Option<ItemCommand>,
    check: ItemCheck,
}

impl ToolbarItem {
    /// Create an item with no title, no command and a native check.
    pub fn new(name: impl Into<String>, element: ItemElement) -> Self {
        Self {
            name: name.into(),
            title: None,
            element,
            command: None,
            check: ItemCheck::default(),
        }
    }

    /// Set the tooltip.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the click command.
    pub fn with_command(mut self, command: ItemCommand) -> Self {
        self.command = Some(command);
        self
    }

    /// Set the active-state check.
    pub fn with_check(mut self, check: ItemCheck) -> Self {
        self.check = check;
        self
    }

    /// The unique registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tooltip.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The element kind.
    pub fn element(&self) -> &ItemElement {
        &self.element
    }

    /// The click command.
    pub fn command(&self) -> Option<&ItemCommand> {
        self.command.as_ref()
    }

    /// The active-state check.
    pub fn check(&self) -> &ItemCheck {
        &self.check
    }

    /// The native command name, if the item runs one.
    pub fn native_command(&self) -> Option<&str> {
        match &self.command {
            Some(ItemCommand::Native(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Debug for ToolbarItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let element = match &self.element {
            ItemElement::Glyph(glyph) => format!("Glyph({glyph})"),
            ItemElement::Separator => "Separator".to_string(),
            ItemElement::Custom(_) => "Custom(..)".to_string(),
        };
        let command = match &self.command {
            Some(ItemCommand::Native(name)) => Some(name.as_str()),
            Some(ItemCommand::Custom(_)) => Some(".."),
            None => None,
        };
        let check = match &self.check {
            ItemCheck::Disabled => "Disabled",
            ItemCheck::Native => "Native",
            ItemCheck::Custom(_) => "Custom(..)",
        };
        f.debug_struct("ToolbarItem")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("element", &element)
            .field("command", &command)
            .field("check", &check)
            .finish()
    }
}

static_assertions::assert_impl_all!(ToolbarItem: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_hex() {
        assert_eq!(GlyphId::from_hex("f032"), Some(GlyphId(0xf032)));
        assert_eq!(GlyphId::from_hex("nope"), None);
        assert_eq!(GlyphId(0xf032).to_string(), "f032");
        assert_eq!(GlyphId(0xf032).as_char(), Some('\u{f032}'));
    }

    #[test]
    fn test_builder_and_native_command() {
        let item = ToolbarItem::new("alignLeft", ItemElement::Glyph(GlyphId(0xf036)))
            .with_title("Align left")
            .with_command(ItemCommand::native("justifyLeft"))
            .with_check(ItemCheck::Disabled);

        assert_eq!(item.title(), Some("Align left"));
        assert_eq!(item.native_command(), Some("justifyLeft"));
        assert!(matches!(item.check(), ItemCheck::Disabled));

        let custom = ToolbarItem::new("x", ItemElement::Separator)
            .with_command(ItemCommand::custom(|_, _| {}));
        assert_eq!(custom.native_command(), None);
        assert!(format!("{custom:?}").contains("Separator"));
    }
}
