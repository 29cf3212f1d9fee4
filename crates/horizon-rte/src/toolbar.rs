//! Toolbar construction.
//!
//! A toolbar is built from a whitespace-separated configuration string such as
//! `"bold italic | undo redo"`. Every name is resolved against a
//! [`CommandRegistry`]; `|` produces a separator and unknown names are skipped
//! with a warning.
//!
//! # Example
//!
//! ```
//! use horizon_rte::facade::EditorHandle;
//! use horizon_rte::registry::{CommandRegistry, RegistryOptions};
//! use horizon_rte::toolbar::{ToolbarBuilder, ToolbarSpec};
//!
//! let registry = CommandRegistry::with_defaults(RegistryOptions::default());
//! let spec = ToolbarSpec::parse("bold | nonexistent undo");
//! let toolbar = ToolbarBuilder::new(&registry).build(&spec, &EditorHandle::detached());
//!
//! assert_eq!(toolbar.len(), 3);
//! assert_eq!(toolbar.skipped(), ["nonexistent"]);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_rte_core::Signal;
use horizon_rte_core::logging::targets;

use crate::facade::{EditorFacade, EditorHandle};
use crate::item::{CustomCheck, GlyphId, ItemCheck, ItemCommand, ItemElement, ToolbarItem};
use crate::registry::CommandRegistry;
use crate::selection_tools::SelectionTools;

/// Class carried by every toolbar element.
pub const ICON_CLASS: &str = "simpleRteIcon";
/// Additional class of separators.
pub const SEPARATOR_CLASS: &str = "simpleRteSeparatorIcon";
/// Class marking an element whose check currently holds.
pub const ACTIVE_CLASS: &str = "simpleRteActiveElement";
/// Class of the toolbar container.
pub const TOOLBAR_CLASS: &str = "simpleRteToolbar";

/// Width of a glyph button in logical pixels.
pub const GLYPH_WIDTH: f32 = 24.0;
/// Width of a separator in logical pixels.
pub const SEPARATOR_WIDTH: f32 = 8.0;

// ============================================================================
// ToolbarSpec
// ============================================================================

/// One entry of a toolbar configuration string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarToken {
    /// `|`
    Separator,
    /// A registry item name.
    Item(String),
}

/// A parsed toolbar configuration; order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolbarSpec {
    tokens: Vec<ToolbarToken>,
}

impl ToolbarSpec {
    /// Parse a whitespace-separated list of item names and `|` separators.
    pub fn parse(spec: &str) -> Self {
        let tokens = spec
            .split_whitespace()
            .map(|token| match token {
                "|" => ToolbarToken::Separator,
                name => ToolbarToken::Item(name.to_string()),
            })
            .collect();
        Self { tokens }
    }

    /// The parsed tokens.
    pub fn tokens(&self) -> &[ToolbarToken] {
        &self.tokens
    }

    /// Whether the configuration names nothing.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<&str> for ToolbarSpec {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

impl fmt::Display for ToolbarSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, token) in self.tokens.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            match token {
                ToolbarToken::Separator => f.write_str("|")?,
                ToolbarToken::Item(name) => f.write_str(name)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// ToolbarElement
// ============================================================================

/// A control embedded in the toolbar by a custom element factory.
pub trait CustomElement: Any + Send + Sync {
    /// Deliver a user input value, e.g. the option picked in a drop-down.
    fn input(&self, value: &str);

    /// Width in logical pixels.
    fn width(&self) -> f32 {
        128.0
    }

    /// Downcasting support for checks that update the element's display.
    fn as_any(&self) -> &dyn Any;
}

/// What a toolbar element shows.
#[derive(Clone)]
pub enum ElementKind {
    /// An icon-font glyph.
    Glyph(GlyphId),
    /// A separator.
    Separator,
    /// A custom control.
    Custom(Arc<dyn CustomElement>),
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Glyph(glyph) => f.debug_tuple("Glyph").field(glyph).finish(),
            Self::Separator => f.write_str("Separator"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// An interactive element of a built toolbar.
pub struct ToolbarElement {
    kind: ElementKind,
    tooltip: Option<String>,
    active: AtomicBool,
    /// Emitted when the user clicks the element.
    pub clicked: Signal<()>,
}

impl ToolbarElement {
    fn with_kind(kind: ElementKind) -> Self {
        Self {
            kind,
            tooltip: None,
            active: AtomicBool::new(false),
            clicked: Signal::new(),
        }
    }

    /// A glyph button.
    pub fn glyph(glyph: GlyphId) -> Self {
        Self::with_kind(ElementKind::Glyph(glyph))
    }

    /// A separator.
    pub fn separator() -> Self {
        Self::with_kind(ElementKind::Separator)
    }

    /// An element wrapping a custom control.
    pub fn custom(control: Arc<dyn CustomElement>) -> Self {
        Self::with_kind(ElementKind::Custom(control))
    }

    /// Set the tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// The element kind.
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// The tooltip.
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Whether the element is highlighted as active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Set the active highlight.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Simulate a click. Returns the number of handlers that ran.
    pub fn click(&self) -> usize {
        self.clicked.emit(())
    }

    /// Deliver user input to a custom control; ignored for other kinds.
    pub fn input(&self, value: &str) {
        if let ElementKind::Custom(control) = &self.kind {
            control.input(value);
        }
    }

    /// The custom control, downcast to its concrete type.
    pub fn custom_control<T: CustomElement>(&self) -> Option<&T> {
        match &self.kind {
            ElementKind::Custom(control) => control.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Style classes of the element's current state.
    pub fn class_names(&self) -> Vec<&'static str> {
        let mut classes = vec![ICON_CLASS];
        if matches!(self.kind, ElementKind::Separator) {
            classes.push(SEPARATOR_CLASS);
        }
        if self.is_active() {
            classes.push(ACTIVE_CLASS);
        }
        classes
    }

    /// Width in logical pixels.
    pub fn width(&self) -> f32 {
        match &self.kind {
            ElementKind::Glyph(_) => GLYPH_WIDTH,
            ElementKind::Separator => SEPARATOR_WIDTH,
            ElementKind::Custom(control) => control.width(),
        }
    }
}

impl fmt::Debug for ToolbarElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolbarElement")
            .field("kind", &self.kind)
            .field("tooltip", &self.tooltip)
            .field("active", &self.is_active())
            .finish()
    }
}

// ============================================================================
// Toolbar
// ============================================================================

struct ActiveCheck {
    test: CustomCheck,
    element: Arc<ToolbarElement>,
}

/// A built toolbar: ordered elements plus their active-state checks.
#[derive(Default)]
pub struct Toolbar {
    elements: Vec<(String, Arc<ToolbarElement>)>,
    checks: Vec<ActiveCheck>,
    skipped: Vec<String>,
}

impl Toolbar {
    /// Elements in display order.
    pub fn elements(&self) -> impl Iterator<Item = &Arc<ToolbarElement>> {
        self.elements.iter().map(|(_, element)| element)
    }

    /// The element at `index`.
    pub fn element(&self, index: usize) -> Option<&Arc<ToolbarElement>> {
        self.elements.get(index).map(|(_, element)| element)
    }

    /// The first element built from the item `name` (`"|"` for separators).
    pub fn element_named(&self, name: &str) -> Option<&Arc<ToolbarElement>> {
        self.elements
            .iter()
            .find(|(item, _)| item == name)
            .map(|(_, element)| element)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the toolbar has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of registered active-state checks.
    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Names from the configuration that did not resolve to an item.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Re-evaluate every check and update each element's active flag.
    pub fn refresh_active_states(&self, editor: &dyn EditorFacade) {
        for check in &self.checks {
            let active = (check.test)(editor, &check.element);
            check.element.set_active(active);
        }
    }

    /// Height needed to lay the elements out in rows no wider than `width`.
    pub fn layout_height(&self, width: f32, row_height: f32) -> f32 {
        if self.elements.is_empty() {
            return 0.0;
        }
        let mut rows = 1u32;
        let mut used = 0.0f32;
        for element in self.elements() {
            let element_width = element.width();
            if width > 0.0 && used > 0.0 && used + element_width > width {
                rows += 1;
                used = 0.0;
            }
            used += element_width;
        }
        rows as f32 * row_height
    }
}

impl fmt::Debug for Toolbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolbar")
            .field(
                "elements",
                &self.elements.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("checks", &self.checks.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}

// ============================================================================
// ToolbarBuilder
// ============================================================================

/// Builds toolbars from a registry.
pub struct ToolbarBuilder<'a> {
    registry: &'a CommandRegistry,
    tools: SelectionTools,
}

impl<'a> ToolbarBuilder<'a> {
    /// Create a builder resolving names against `registry`.
    pub fn new(registry: &'a CommandRegistry) -> Self {
        Self {
            registry,
            tools: SelectionTools::new(),
        }
    }

    /// Build the toolbar for the editor behind `editor`.
    pub fn build(&self, spec: &ToolbarSpec, editor: &EditorHandle) -> Toolbar {
        let mut toolbar = Toolbar::default();

        for token in spec.tokens() {
            let name = match token {
                ToolbarToken::Separator => {
                    toolbar
                        .elements
                        .push(("|".to_string(), Arc::new(ToolbarElement::separator())));
                    continue;
                }
                ToolbarToken::Item(name) => name,
            };

            let Some(item) = self.registry.resolve(name) else {
                tracing::warn!(target: targets::TOOLBAR, item = %name, "item not found in registry, skipping");
                toolbar.skipped.push(name.clone());
                continue;
            };

            let element = Arc::new(self.build_element(&item, editor));
            if let Some(test) = self.active_check(&item) {
                toolbar.checks.push(ActiveCheck {
                    test,
                    element: element.clone(),
                });
            }
            toolbar.elements.push((name.clone(), element));
        }

        tracing::debug!(
            target: targets::TOOLBAR,
            elements = toolbar.len(),
            checks = toolbar.check_count(),
            skipped = toolbar.skipped.len(),
            "toolbar built"
        );
        toolbar
    }

    fn build_element(&self, item: &ToolbarItem, editor: &EditorHandle) -> ToolbarElement {
        let element = match item.element() {
            ItemElement::Custom(factory) => factory(editor, &self.tools),
            ItemElement::Glyph(glyph) => {
                let element = ToolbarElement::glyph(*glyph);
                self.connect_command(&element, item, editor);
                element
            }
            ItemElement::Separator => {
                let element = ToolbarElement::separator();
                self.connect_command(&element, item, editor);
                element
            }
        };

        match item.title() {
            Some(title) => element.with_tooltip(title),
            None => element,
        }
    }

    fn connect_command(&self, element: &ToolbarElement, item: &ToolbarItem, editor: &EditorHandle) {
        let editor = editor.clone();
        match item.command() {
            Some(ItemCommand::Native(name)) => {
                let name = name.clone();
                element.clicked.connect(move |_| editor.execute_command(&name));
            }
            Some(ItemCommand::Custom(command)) => {
                let command = command.clone();
                let tools = self.tools;
                element.clicked.connect(move |_| {
                    command(&editor, &tools);
                    editor.normalize();
                    editor.request_focus();
                });
            }
            None => {}
        }
    }

    fn active_check(&self, item: &ToolbarItem) -> Option<CustomCheck> {
        match item.check() {
            ItemCheck::Disabled => None,
            ItemCheck::Custom(check) => Some(check.clone()),
            ItemCheck::Native => {
                let command = item.native_command().map(str::to_string);
                let check: CustomCheck = Arc::new(move |editor: &dyn EditorFacade, _: &ToolbarElement| {
                    command
                        .as_deref()
                        .is_some_and(|name| editor.document().query_command_state(name))
                });
                Some(check)
            }
        }
    }
}

static_assertions::assert_impl_all!(ToolbarElement: Send, Sync);
static_assertions::assert_impl_all!(Toolbar: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;

    use super::*;
    use crate::dom::ContentDocument;
    use crate::facade::CommandTarget;
    use crate::registry::RegistryOptions;

    struct Recorder {
        document: ContentDocument,
        commands: Mutex<Vec<String>>,
        focus_requests: AtomicUsize,
    }

    impl EditorFacade for Recorder {
        fn document(&self) -> ContentDocument {
            self.document.clone()
        }

        fn request_focus(&self) {
            self.focus_requests.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CommandTarget for Recorder {
        fn execute_command(&self, name: &str) {
            self.commands.lock().push(name.to_string());
        }
    }

    fn recorder() -> Arc<Recorder> {
        Arc::new(Recorder {
            document: ContentDocument::new(),
            commands: Mutex::new(Vec::new()),
            focus_requests: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_parse_spec() {
        let spec = ToolbarSpec::parse("  bold italic |\tundo  ");
        assert_eq!(
            spec.tokens(),
            &[
                ToolbarToken::Item("bold".into()),
                ToolbarToken::Item("italic".into()),
                ToolbarToken::Separator,
                ToolbarToken::Item("undo".into()),
            ]
        );
        assert_eq!(spec.to_string(), "bold italic | undo");
        assert!(ToolbarSpec::parse("   ").is_empty());
    }

    #[test]
    fn test_unknown_items_are_skipped() {
        let registry = CommandRegistry::with_defaults(RegistryOptions::default());
        let spec = ToolbarSpec::parse("bold nope italic | missing");
        let toolbar = ToolbarBuilder::new(&registry).build(&spec, &EditorHandle::detached());

        assert_eq!(toolbar.len(), 3);
        assert_eq!(toolbar.skipped(), ["nope", "missing"]);
        assert_eq!(toolbar.check_count(), 2);
    }

    #[test]
    fn test_native_click_routes_through_editor() {
        let registry = CommandRegistry::with_defaults(RegistryOptions::default());
        let editor = recorder();
        let toolbar = ToolbarBuilder::new(&registry)
            .build(&ToolbarSpec::parse("bold | undo"), &EditorHandle::new(&editor));

        assert_eq!(toolbar.len(), 3);
        toolbar.element(0).unwrap().click();
        assert_eq!(toolbar.element(1).unwrap().click(), 0);
        toolbar.element(2).unwrap().click();

        assert_eq!(*editor.commands.lock(), vec!["bold".to_string(), "undo".to_string()]);
        assert_eq!(toolbar.element(0).unwrap().tooltip(), Some("Make selection bold"));
        assert_eq!(
            toolbar.element(1).unwrap().class_names(),
            vec![ICON_CLASS, SEPARATOR_CLASS]
        );
        assert_eq!(toolbar.check_count(), 1);
    }

    #[test]
    fn test_custom_command_normalizes_and_focuses() {
        let registry = CommandRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        registry
            .register(
                ToolbarItem::new("ping", ItemElement::Glyph(GlyphId(0xf111))).with_command(
                    ItemCommand::custom(move |_, _| {
                        calls_clone.fetch_add(1, Ordering::SeqCst);
                    }),
                ),
            )
            .unwrap();

        let editor = recorder();
        let toolbar =
            ToolbarBuilder::new(&registry).build(&ToolbarSpec::parse("ping"), &EditorHandle::new(&editor));
        toolbar.element_named("ping").unwrap().click();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(editor.focus_requests.load(Ordering::SeqCst), 1);
        assert!(editor.commands.lock().is_empty());
    }

    #[test]
    fn test_refresh_active_states() {
        let registry = CommandRegistry::new();
        registry
            .register(
                ToolbarItem::new("always", ItemElement::Glyph(GlyphId(1)))
                    .with_check(ItemCheck::custom(|_, _| true)),
            )
            .unwrap();
        registry
            .register(ToolbarItem::new("native-less", ItemElement::Glyph(GlyphId(2))))
            .unwrap();

        let editor = recorder();
        let toolbar = ToolbarBuilder::new(&registry)
            .build(&ToolbarSpec::parse("always native-less"), &EditorHandle::new(&editor));
        toolbar.refresh_active_states(editor.as_ref());

        assert!(toolbar.element(0).unwrap().is_active());
        assert!(toolbar.element(0).unwrap().class_names().contains(&ACTIVE_CLASS));
        assert!(!toolbar.element(1).unwrap().is_active());
    }

    #[test]
    fn test_layout_height_wraps_rows() {
        let registry = CommandRegistry::with_defaults(RegistryOptions::default());
        let toolbar = ToolbarBuilder::new(&registry)
            .build(&ToolbarSpec::parse("bold italic | underline"), &EditorHandle::detached());

        // 24 + 24 + 8 + 24 = 80
        assert_eq!(toolbar.layout_height(100.0, 32.0), 32.0);
        assert_eq!(toolbar.layout_height(50.0, 32.0), 64.0);
        assert_eq!(toolbar.layout_height(0.0, 32.0), 32.0);
        assert_eq!(Toolbar::default().layout_height(100.0, 32.0), 0.0);
    }
}
