//! Capability-scoped editor access for toolbar commands.
//!
//! Commands, checks and custom element factories never see the editor
//! control itself. They receive an [`EditorFacade`], which exposes only the
//! editable document, its selection and a focus request. Until the editable
//! surface has loaded, the facade hands out [`ContentDocument::stub`], so
//! commands that run too early are harmless no-ops.
//!
//! # Example
//!
//! ```
//! use horizon_rte::facade::{EditorFacade, EditorHandle};
//!
//! let handle = EditorHandle::detached();
//! assert!(handle.document().is_stub());
//! assert!(handle.current_range().is_none());
//! handle.request_focus();
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use crate::dom::{ContentDocument, Range, Selection};

/// The operations a command may perform on its editor.
pub trait EditorFacade: Send + Sync {
    /// The live document, or the stub document while the surface is not ready.
    fn document(&self) -> ContentDocument;

    /// The selection of [`EditorFacade::document`].
    fn selection(&self) -> Selection {
        self.document().selection()
    }

    /// The first selection range, if any.
    fn current_range(&self) -> Option<Range> {
        self.selection().range_at(0)
    }

    /// Merge adjacent text nodes of the live document.
    fn normalize(&self) {
        self.document().normalize();
    }

    /// Move keyboard focus to the editable surface; no-op before it exists.
    fn request_focus(&self);
}

/// An editor that can also run commands by name.
///
/// Implemented by the editor control. Toolbar wiring uses it to route native
/// commands through the editor so the post-command work (normalize, focus,
/// active-state refresh) happens in one place.
pub trait CommandTarget: EditorFacade {
    /// Run a command by name; `"rerender"` requests a structural re-render.
    fn execute_command(&self, name: &str);
}

/// A weak, cloneable handle to an editor.
///
/// Toolbar closures hold this instead of the editor so they never keep it
/// alive. Once the editor is dropped the handle behaves like an editor whose
/// surface never loaded.
#[derive(Clone)]
pub struct EditorHandle {
    target: Weak<dyn CommandTarget>,
}

struct NoEditor;

impl EditorFacade for NoEditor {
    fn document(&self) -> ContentDocument {
        ContentDocument::stub()
    }

    fn request_focus(&self) {}
}

impl CommandTarget for NoEditor {
    fn execute_command(&self, _name: &str) {}
}

impl EditorHandle {
    /// Create a handle to `target`.
    pub fn new<T: CommandTarget + 'static>(target: &Arc<T>) -> Self {
        let target: Weak<dyn CommandTarget> = Arc::downgrade(target) as Weak<dyn CommandTarget>;
        Self { target }
    }

    /// A handle that is not connected to any editor.
    pub fn detached() -> Self {
        let target: Weak<dyn CommandTarget> = Weak::<NoEditor>::new();
        Self { target }
    }

    /// Whether the editor is still alive.
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Run a command on the editor; ignored once it is gone.
    pub fn execute_command(&self, name: &str) {
        if let Some(target) = self.target.upgrade() {
            target.execute_command(name);
        }
    }
}

impl EditorFacade for EditorHandle {
    fn document(&self) -> ContentDocument {
        match self.target.upgrade() {
            Some(target) => target.document(),
            None => ContentDocument::stub(),
        }
    }

    fn normalize(&self) {
        if let Some(target) = self.target.upgrade() {
            target.normalize();
        }
    }

    fn request_focus(&self) {
        if let Some(target) = self.target.upgrade() {
            target.request_focus();
        }
    }
}

impl fmt::Debug for EditorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Asks the user for a line of text.
///
/// Returning `None` means the user cancelled.
pub trait Prompt: Send + Sync {
    /// Show `message` and wait for an answer.
    fn prompt(&self, message: &str) -> Option<String>;
}

impl<F> Prompt for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn prompt(&self, message: &str) -> Option<String> {
        self(message)
    }
}

/// A prompt that always cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelPrompt;

impl Prompt for CancelPrompt {
    fn prompt(&self, message: &str) -> Option<String> {
        tracing::debug!(target: horizon_rte_core::logging::targets::COMMAND, message, "no prompt installed, cancelling");
        None
    }
}

static_assertions::assert_impl_all!(EditorHandle: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;

    struct FakeEditor {
        document: ContentDocument,
        focus_requests: AtomicUsize,
        commands: Mutex<Vec<String>>,
    }

    impl EditorFacade for FakeEditor {
        fn document(&self) -> ContentDocument {
            self.document.clone()
        }

        fn request_focus(&self) {
            self.focus_requests.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CommandTarget for FakeEditor {
        fn execute_command(&self, name: &str) {
            self.commands.lock().push(name.to_string());
        }
    }

    fn fake() -> Arc<FakeEditor> {
        Arc::new(FakeEditor {
            document: ContentDocument::new(),
            focus_requests: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_handle_forwards_to_editor() {
        let editor = fake();
        let handle = EditorHandle::new(&editor);

        assert!(handle.is_alive());
        assert!(handle.document().ptr_eq(&editor.document));
        handle.request_focus();
        handle.execute_command("bold");

        assert_eq!(editor.focus_requests.load(Ordering::SeqCst), 1);
        assert_eq!(*editor.commands.lock(), vec!["bold".to_string()]);
    }

    #[test]
    fn test_handle_degrades_to_stub() {
        let editor = fake();
        let handle = EditorHandle::new(&editor);
        drop(editor);

        assert!(!handle.is_alive());
        assert!(handle.document().is_stub());
        assert_eq!(handle.selection().range_count(), 0);
        handle.execute_command("bold");
        handle.normalize();
    }

    #[test]
    fn test_closure_prompt() {
        let prompt = |message: &str| (message == "Link target:").then(|| "https://a.b".to_string());
        assert_eq!(prompt.prompt("Link target:"), Some("https://a.b".to_string()));
        assert_eq!(prompt.prompt("Image URL:"), None);
        assert_eq!(CancelPrompt.prompt("Image URL:"), None);
    }
}
