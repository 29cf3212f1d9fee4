//! The rich-text editor control.
//!
//! [`SimpleEditor`] is a toolbar above an editable surface. It implements the
//! host lifecycle hooks ([`Control`]) and keeps its markup in a persisted
//! `value` property that outlives every structural render:
//!
//! 1. `on_before_rendering` flushes the live body into `value`, captures the
//!    selection, detaches the body content and rebuilds the toolbar when its
//!    configuration or the registry changed.
//! 2. `on_after_rendering` replaces the surface, which starts loading.
//! 3. When the host reports the load through
//!    [`ContentSurface::complete_load`], the captured content and selection are
//!    restored into the new document and its listeners are connected.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_rte::{EditorSettings, SimpleEditor};
//! use horizon_rte_core::RenderManager;
//!
//! let editor = SimpleEditor::new(EditorSettings {
//!     value: "<p>Hello</p>".into(),
//!     menu_items: "bold italic | undo redo".into(),
//!     ..EditorSettings::default()
//! });
//!
//! let manager = RenderManager::new();
//! let id = manager.add(&editor.control());
//! manager.render(id).unwrap();
//! editor.surface().complete_load();
//!
//! assert_eq!(editor.document().body_inner_html(), "<p>Hello</p>");
//! assert_eq!(editor.toolbar().len(), 5);
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use horizon_rte_core::logging::targets;
use horizon_rte_core::{
    ConnectionId, Control, ControlBase, Property, ResizeHandler, ResizeListenerId, Signal, Size,
};
use parking_lot::{Mutex, RwLock};

use crate::dom::ContentDocument;
use crate::error::Result;
use crate::facade::{CommandTarget, EditorFacade, EditorHandle, Prompt};
use crate::item::ToolbarItem;
use crate::items::RERENDER_COMMAND;
use crate::registry::{CommandRegistry, RegistryOptions};
use crate::sanitize::{AllowList, AllowListSanitizer, Sanitizer};
use crate::settings::EditorSettings;
use crate::surface::ContentSurface;
use crate::sync::ContentSync;
use crate::toolbar::{Toolbar, ToolbarBuilder, ToolbarSpec};

/// Listener connections on the live document.
struct DocumentListeners {
    document: ContentDocument,
    input: ConnectionId,
    selection_changed: ConnectionId,
}

impl DocumentListeners {
    fn disconnect(self) {
        self.document.input().disconnect(self.input);
        self.document.selection_changed().disconnect(self.selection_changed);
    }
}

struct EditorInner {
    this: Weak<EditorInner>,
    base: ControlBase,

    width: Property<String>,
    height: Property<String>,
    value: Property<String>,
    sanitize_value: Property<bool>,
    menu_items: Property<String>,
    toolbar_row_height: f32,

    registry: Arc<CommandRegistry>,
    sanitizer: Arc<dyn Sanitizer>,
    allow_list: AllowList,

    resize: Arc<ResizeHandler>,
    resize_listener: Mutex<Option<ResizeListenerId>>,
    size: Mutex<Option<Size>>,

    surface: ContentSurface,
    toolbar: RwLock<Arc<Toolbar>>,
    toolbar_key: Mutex<Option<(String, u64)>>,
    sync: ContentSync,
    listeners: Mutex<Option<DocumentListeners>>,
}

impl EditorInner {
    fn handle(&self) -> EditorHandle {
        match self.this.upgrade() {
            Some(this) => EditorHandle::new(&this),
            None => EditorHandle::detached(),
        }
    }

    fn sanitized(&self, markup: String) -> String {
        if self.sanitize_value.get() {
            self.sanitizer.sanitize(&markup, &self.allow_list)
        } else {
            markup
        }
    }

    /// Copy the live body into the persisted value.
    fn flush_value(&self) {
        if !self.surface.is_ready() {
            return;
        }
        let markup = self.sanitized(self.surface.document().body_inner_html());
        if self.value.set(markup) {
            tracing::trace!(target: targets::SYNC, "persisted value updated from live document");
        }
    }

    fn set_value(&self, value: String) -> bool {
        let value = self.sanitized(value);
        if self.value.is(&value) {
            tracing::trace!(target: targets::SYNC, "value unchanged, ignoring set");
            return false;
        }

        self.value.set_quiet(value.clone());
        if self.surface.is_ready()
            && let Err(err) = self.surface.document().set_body_inner_html(&value)
        {
            tracing::warn!(target: targets::SYNC, error = %err, "failed to write value into live document");
        }
        self.sync.discard();
        self.value.changed.emit(value);
        true
    }

    /// Store a property value, re-rendering when a structural one changed.
    fn update<T>(&self, property: &Property<T>, value: T)
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        if property.set(value) && property.is_invalidating() {
            tracing::debug!(target: targets::LIFECYCLE, property = property.name(), "structural property changed");
            self.base.invalidate();
        }
    }

    fn refresh_checks(&self) {
        let toolbar = self.toolbar.read().clone();
        toolbar.refresh_active_states(self);
    }

    fn rebuild_toolbar_if_needed(&self) {
        let menu_items = self.menu_items.get();
        let key = (menu_items, self.registry.generation());
        if self.toolbar_key.lock().as_ref() == Some(&key) {
            return;
        }

        let spec = ToolbarSpec::parse(&key.0);
        let toolbar = ToolbarBuilder::new(&self.registry).build(&spec, &self.handle());
        *self.toolbar.write() = Arc::new(toolbar);
        *self.toolbar_key.lock() = Some(key);
    }

    fn apply_size(&self) {
        let Some(size) = *self.size.lock() else {
            return;
        };
        let toolbar_height = self
            .toolbar
            .read()
            .layout_height(size.width, self.toolbar_row_height);
        self.surface.set_height(size.height - toolbar_height);
        tracing::trace!(
            target: targets::RESIZE,
            width = size.width,
            height = size.height,
            toolbar_height,
            "surface resized"
        );
    }

    fn on_resize(&self, size: Size) {
        *self.size.lock() = Some(size);
        self.apply_size();
    }

    fn disconnect_document(&self) {
        if let Some(listeners) = self.listeners.lock().take() {
            listeners.disconnect();
        }
    }

    fn on_surface_loaded(&self, document: &ContentDocument) {
        let value = self.value.get();
        if let Err(err) = self.sync.restore(document, &value) {
            tracing::warn!(target: targets::SYNC, error = %err, "failed to restore content after render");
        }

        let weak = self.this.clone();
        let input = document.input().connect(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.flush_value();
            }
        });
        let weak = self.this.clone();
        let selection_changed = document.selection_changed().connect(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.refresh_checks();
            }
        });

        let previous = self.listeners.lock().replace(DocumentListeners {
            document: document.clone(),
            input,
            selection_changed,
        });
        if let Some(previous) = previous {
            previous.disconnect();
        }
        self.refresh_checks();
    }
}

impl Control for EditorInner {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn init(&self) {
        let weak = self.this.clone();
        let id = self.resize.register(move |size| {
            if let Some(inner) = weak.upgrade() {
                inner.on_resize(size);
            }
        });
        *self.resize_listener.lock() = Some(id);
        tracing::debug!(target: targets::LIFECYCLE, control = %self.base.id(), "editor initialized");
    }

    fn on_before_rendering(&self) {
        if self.surface.is_ready() {
            self.flush_value();
            self.disconnect_document();
            self.sync.capture(&self.surface.document());
        }
        self.rebuild_toolbar_if_needed();
        horizon_rte_core::rte_debug!(control = %self.base.id(), "editor prepared for render");
    }

    fn on_after_rendering(&self) {
        self.surface.reload();
        self.apply_size();
    }

    fn exit(&self) {
        if let Some(id) = self.resize_listener.lock().take()
            && let Err(err) = self.resize.deregister(id)
        {
            horizon_rte_core::rte_warn!(error = %err, "failed to deregister resize listener");
        }
        self.disconnect_document();
        self.sync.discard();
        tracing::debug!(target: targets::LIFECYCLE, control = %self.base.id(), "editor torn down");
    }
}

impl EditorFacade for EditorInner {
    fn document(&self) -> ContentDocument {
        self.surface.document()
    }

    /// Also flushes the result into the persisted value, since structural
    /// edits made by custom commands raise no input event.
    fn normalize(&self) {
        self.surface.document().normalize();
        self.flush_value();
    }

    fn request_focus(&self) {
        self.surface.request_focus();
    }
}

impl CommandTarget for EditorInner {
    fn execute_command(&self, name: &str) {
        if name == RERENDER_COMMAND {
            self.base.invalidate();
            return;
        }
        if !self.surface.is_ready() {
            tracing::debug!(target: targets::COMMAND, command = name, "surface not ready, dropping command");
            return;
        }

        let document = self.surface.document();
        let executed = document.exec_command(name, None);
        tracing::debug!(target: targets::COMMAND, command = name, executed, "command executed");
        document.normalize();
        self.surface.request_focus();
        self.refresh_checks();
    }
}

// ============================================================================
// SimpleEditor
// ============================================================================

/// Collaborators of a [`SimpleEditor`], configured before construction.
pub struct EditorBuilder {
    settings: EditorSettings,
    registry: Option<Arc<CommandRegistry>>,
    prompt: Option<Arc<dyn Prompt>>,
    resize: Option<Arc<ResizeHandler>>,
    sanitizer: Arc<dyn Sanitizer>,
    allow_list: AllowList,
}

impl EditorBuilder {
    /// Share an existing registry instead of seeding a new one.
    pub fn registry(mut self, registry: Arc<CommandRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The prompt used by the link and image items of a seeded registry.
    pub fn prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// The host's resize-notification service.
    pub fn resize_handler(mut self, resize: Arc<ResizeHandler>) -> Self {
        self.resize = Some(resize);
        self
    }

    /// Replace the sanitizer.
    pub fn sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Replace the allow list handed to the sanitizer.
    pub fn allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Create the editor.
    pub fn build(self) -> SimpleEditor {
        let Self {
            settings,
            registry,
            prompt,
            resize,
            sanitizer,
            allow_list,
        } = self;

        let registry = registry.unwrap_or_else(|| {
            let mut options = RegistryOptions {
                debug: settings.debug,
                ..RegistryOptions::default()
            };
            if let Some(prompt) = prompt {
                options.prompt = prompt;
            }
            Arc::new(CommandRegistry::with_defaults(options))
        });

        let inner = Arc::new_cyclic(|this| EditorInner {
            this: this.clone(),
            base: ControlBase::new(),
            width: Property::invalidating("width", settings.width),
            height: Property::invalidating("height", settings.height),
            value: Property::new("value", String::new()),
            sanitize_value: Property::new("sanitizeValue", settings.sanitize_value),
            menu_items: Property::invalidating("menuItems", settings.menu_items),
            toolbar_row_height: settings.toolbar_row_height,
            registry,
            sanitizer,
            allow_list,
            resize: resize.unwrap_or_default(),
            resize_listener: Mutex::new(None),
            size: Mutex::new(None),
            surface: ContentSurface::new(),
            toolbar: RwLock::new(Arc::new(Toolbar::default())),
            toolbar_key: Mutex::new(None),
            sync: ContentSync::new(),
            listeners: Mutex::new(None),
        });
        inner.value.set_quiet(inner.sanitized(settings.value));
        inner
            .surface
            .loaded
            .connect_weak(&inner, |inner, document| inner.on_surface_loaded(document));

        SimpleEditor { inner }
    }
}

/// A toolbar-driven rich-text editor control.
///
/// Cloning yields another handle to the same control.
#[derive(Clone)]
pub struct SimpleEditor {
    inner: Arc<EditorInner>,
}

impl SimpleEditor {
    /// Create an editor with its own registry and resize handler.
    pub fn new(settings: EditorSettings) -> Self {
        Self::builder(settings).build()
    }

    /// Configure an editor's collaborators before creating it.
    pub fn builder(settings: EditorSettings) -> EditorBuilder {
        EditorBuilder {
            settings,
            registry: None,
            prompt: None,
            resize: None,
            sanitizer: Arc::new(AllowListSanitizer),
            allow_list: AllowList::default(),
        }
    }

    /// The control, for registration with the host's render manager.
    pub fn control(&self) -> Arc<dyn Control> {
        self.inner.clone()
    }

    /// A weak facade handle to this editor.
    pub fn handle(&self) -> EditorHandle {
        EditorHandle::new(&self.inner)
    }

    /// Run a command by name; `"rerender"` requests a structural re-render.
    pub fn execute_command(&self, name: &str) {
        self.inner.execute_command(name);
    }

    /// Register an item with this editor's registry and re-render so the
    /// toolbar picks it up.
    pub fn add_toolbar_element(&self, item: ToolbarItem) -> Result<()> {
        self.inner.registry.register(item)?;
        self.inner.base.invalidate();
        Ok(())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// The persisted markup.
    pub fn value(&self) -> String {
        self.inner.value.get()
    }

    /// Replace the markup. Returns `false` when the (sanitized) value equals
    /// the current one.
    pub fn set_value(&self, value: impl Into<String>) -> bool {
        self.inner.set_value(value.into())
    }

    /// Emitted with the new markup whenever the persisted value changes.
    pub fn value_changed(&self) -> &Signal<String> {
        &self.inner.value.changed
    }

    /// Whether values are sanitized.
    pub fn sanitize_value(&self) -> bool {
        self.inner.sanitize_value.get()
    }

    /// Turn sanitization on or off. Applies to later value changes.
    pub fn set_sanitize_value(&self, sanitize: bool) {
        self.inner.update(&self.inner.sanitize_value, sanitize);
    }

    /// The toolbar configuration string.
    pub fn menu_items(&self) -> String {
        self.inner.menu_items.get()
    }

    /// Change the toolbar configuration; takes effect on the next render.
    pub fn set_menu_items(&self, menu_items: impl Into<String>) {
        self.inner.update(&self.inner.menu_items, menu_items.into());
    }

    /// The control width as a CSS size.
    pub fn width(&self) -> String {
        self.inner.width.get()
    }

    /// Set the control width.
    pub fn set_width(&self, width: impl Into<String>) {
        self.inner.update(&self.inner.width, width.into());
    }

    /// The control height as a CSS size.
    pub fn height(&self) -> String {
        self.inner.height.get()
    }

    /// Set the control height.
    pub fn set_height(&self, height: impl Into<String>) {
        self.inner.update(&self.inner.height, height.into());
    }

    // =========================================================================
    // Parts
    // =========================================================================

    /// The live document, or the stub document while the surface is not ready.
    pub fn document(&self) -> ContentDocument {
        self.inner.surface.document()
    }

    /// The editable surface.
    pub fn surface(&self) -> &ContentSurface {
        &self.inner.surface
    }

    /// The toolbar built by the last render.
    pub fn toolbar(&self) -> Arc<Toolbar> {
        self.inner.toolbar.read().clone()
    }

    /// The registry toolbar names are resolved against.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.inner.registry
    }

    /// The resize-notification service the editor listens to.
    pub fn resize_handler(&self) -> &Arc<ResizeHandler> {
        &self.inner.resize
    }

    /// The resize listener registered by `init`, if the editor is live.
    pub fn resize_listener(&self) -> Option<ResizeListenerId> {
        *self.inner.resize_listener.lock()
    }

    /// Whether a render snapshot is waiting for the surface to load.
    pub fn has_pending_snapshot(&self) -> bool {
        self.inner.sync.has_pending()
    }
}

impl fmt::Debug for SimpleEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleEditor")
            .field("id", &self.inner.base.id())
            .field("surface", &self.inner.surface.state())
            .field("menu_items", &self.inner.menu_items.get())
            .field("value_len", &self.inner.value.with(String::len))
            .finish()
    }
}

static_assertions::assert_impl_all!(SimpleEditor: Send, Sync);
