//! The isolated editable surface.
//!
//! Every structural render of the editor replaces the surface, and the new
//! surface loads asynchronously. [`ContentSurface`] models that as a small
//! state machine:
//!
//! ```text
//! Unloaded --reload--> Loading --complete_load--> Ready
//!                         ^                         |
//!                         +---------reload----------+
//! ```
//!
//! A fresh [`ContentDocument`] is created on every load and announced through
//! [`ContentSurface::loaded`]. While the surface is not ready,
//! [`ContentSurface::document`] returns the stub document.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_rte_core::Signal;
use horizon_rte_core::logging::targets;
use parking_lot::Mutex;

use crate::dom::ContentDocument;

/// Load state of a [`ContentSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceState {
    /// Never rendered.
    #[default]
    Unloaded,
    /// Rendered, waiting for the host to report load completion.
    Loading,
    /// Loaded; the live document is available.
    Ready,
}

struct SurfaceInner {
    state: SurfaceState,
    document: Option<ContentDocument>,
    height: f32,
    loads: u64,
}

/// The editable surface hosting the live document.
pub struct ContentSurface {
    inner: Mutex<SurfaceInner>,
    stub: ContentDocument,
    focused: AtomicBool,
    /// Emitted with the new live document when a load completes.
    pub loaded: Signal<ContentDocument>,
}

impl ContentSurface {
    /// Create an unloaded surface.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SurfaceInner {
                state: SurfaceState::Unloaded,
                document: None,
                height: 0.0,
                loads: 0,
            }),
            stub: ContentDocument::stub(),
            focused: AtomicBool::new(false),
            loaded: Signal::new(),
        }
    }

    /// The current load state.
    pub fn state(&self) -> SurfaceState {
        self.inner.lock().state
    }

    /// Whether the live document is available.
    pub fn is_ready(&self) -> bool {
        self.state() == SurfaceState::Ready
    }

    /// Replace the surface; the previous live document is dropped.
    pub fn reload(&self) {
        let previous = {
            let mut inner = self.inner.lock();
            inner.document = None;
            std::mem::replace(&mut inner.state, SurfaceState::Loading)
        };
        self.focused.store(false, Ordering::SeqCst);
        tracing::debug!(target: targets::SURFACE, from = ?previous, "surface reloading");
    }

    /// Report load completion and create the live document.
    ///
    /// Returns `false`, and does nothing, unless the surface is loading.
    pub fn complete_load(&self) -> bool {
        let document = {
            let mut inner = self.inner.lock();
            if inner.state != SurfaceState::Loading {
                tracing::warn!(
                    target: targets::SURFACE,
                    state = ?inner.state,
                    "load completion reported for a surface that is not loading"
                );
                return false;
            }
            let document = ContentDocument::new();
            inner.state = SurfaceState::Ready;
            inner.document = Some(document.clone());
            inner.loads += 1;
            document
        };
        tracing::debug!(target: targets::SURFACE, loads = self.load_count(), "surface ready");
        self.loaded.emit(document);
        true
    }

    /// The live document, or the stub document while not ready.
    pub fn document(&self) -> ContentDocument {
        self.inner
            .lock()
            .document
            .clone()
            .unwrap_or_else(|| self.stub.clone())
    }

    /// Number of completed loads.
    pub fn load_count(&self) -> u64 {
        self.inner.lock().loads
    }

    /// Give the surface keyboard focus; ignored while not ready.
    pub fn request_focus(&self) {
        if !self.is_ready() {
            tracing::trace!(target: targets::SURFACE, "focus requested before surface is ready");
            return;
        }
        self.focused.store(true, Ordering::SeqCst);
    }

    /// Whether the surface holds keyboard focus.
    pub fn has_focus(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    /// Drop keyboard focus.
    pub fn blur(&self) {
        self.focused.store(false, Ordering::SeqCst);
    }

    /// Height of the surface in logical pixels.
    pub fn height(&self) -> f32 {
        self.inner.lock().height
    }

    /// Set the surface height; negative values are clamped to zero.
    pub fn set_height(&self, height: f32) {
        self.inner.lock().height = height.max(0.0);
    }
}

impl Default for ContentSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContentSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ContentSurface")
            .field("state", &inner.state)
            .field("loads", &inner.loads)
            .field("height", &inner.height)
            .field("focused", &self.has_focus())
            .finish()
    }
}

static_assertions::assert_impl_all!(ContentSurface: Send, Sync);
