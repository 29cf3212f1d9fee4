//! Control lifecycle contract.
//!
//! The host framework owns the control lifecycle; controls only implement the
//! hooks. The [`RenderManager`] plays the host side: it initializes controls,
//! runs structural renders (before hook, rebuild, after hook), re-renders
//! controls that invalidated themselves, and tears them down.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_rte_core::{Control, ControlBase, RenderManager};
//!
//! struct Label {
//!     base: ControlBase,
//! }
//!
//! impl Control for Label {
//!     fn base(&self) -> &ControlBase {
//!         &self.base
//!     }
//! }
//!
//! let manager = RenderManager::new();
//! let label: Arc<dyn Control> = Arc::new(Label { base: ControlBase::new() });
//! let id = manager.add(&label);
//!
//! label.base().invalidate();
//! assert_eq!(manager.flush(), 1);
//! manager.destroy(id).unwrap();
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::logging::{PerfSpan, targets};
use crate::signal::Signal;

static CONTROL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a control instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

impl ControlId {
    fn next() -> Self {
        Self(CONTROL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hooks a control implements; invoked by the host framework.
pub trait Control: Send + Sync {
    /// Shared per-control state.
    fn base(&self) -> &ControlBase;

    /// Called once when the control is added to the host.
    fn init(&self) {}

    /// Called before every structural render.
    fn on_before_rendering(&self) {}

    /// Called after every structural render.
    fn on_after_rendering(&self) {}

    /// Called once when the control is torn down.
    fn exit(&self) {}
}

/// State every control carries: identity, invalidation and teardown flags.
pub struct ControlBase {
    id: ControlId,
    needs_render: AtomicBool,
    destroyed: AtomicBool,
    render_count: AtomicU64,
    /// Emitted with the control ID whenever the control invalidates itself.
    pub invalidated: Signal<ControlId>,
}

impl ControlBase {
    /// Create the base for a new, never rendered control.
    pub fn new() -> Self {
        Self {
            id: ControlId::next(),
            needs_render: AtomicBool::new(true),
            destroyed: AtomicBool::new(false),
            render_count: AtomicU64::new(0),
            invalidated: Signal::new(),
        }
    }

    /// The control's identifier.
    pub fn id(&self) -> ControlId {
        self.id
    }

    /// Request a structural re-render on the next [`RenderManager::flush`].
    pub fn invalidate(&self) {
        if self.is_destroyed() {
            return;
        }
        self.needs_render.store(true, Ordering::SeqCst);
        tracing::debug!(target: targets::LIFECYCLE, control = %self.id, "control invalidated");
        self.invalidated.emit(self.id);
    }

    /// Whether a structural render is pending.
    pub fn needs_render(&self) -> bool {
        self.needs_render.load(Ordering::SeqCst)
    }

    /// Number of completed structural renders.
    pub fn render_count(&self) -> u64 {
        self.render_count.load(Ordering::SeqCst)
    }

    /// Whether the control has been torn down.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn mark_rendered(&self) {
        self.needs_render.store(false, Ordering::SeqCst);
        self.render_count.fetch_add(1, Ordering::SeqCst);
    }

    fn mark_destroyed(&self) -> Result<()> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Err(CoreError::ControlDestroyed(self.id));
        }
        Ok(())
    }
}

impl Default for ControlBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ControlBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlBase")
            .field("id", &self.id)
            .field("needs_render", &self.needs_render())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Host-side driver of control lifecycles.
///
/// Controls are held weakly; dropping the last strong reference removes the
/// control from the next flush.
#[derive(Default)]
pub struct RenderManager {
    controls: Mutex<HashMap<ControlId, Weak<dyn Control>>>,
}

impl RenderManager {
    /// Create an empty render manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a control and run its construction hook.
    pub fn add(&self, control: &Arc<dyn Control>) -> ControlId {
        let id = control.base().id();
        self.controls.lock().insert(id, Arc::downgrade(control));
        control.init();
        id
    }

    fn get(&self, id: ControlId) -> Result<Arc<dyn Control>> {
        let control = self
            .controls
            .lock()
            .get(&id)
            .and_then(Weak::upgrade)
            .ok_or(CoreError::UnknownControl(id))?;
        if control.base().is_destroyed() {
            return Err(CoreError::ControlDestroyed(id));
        }
        Ok(control)
    }

    /// Run one structural render of the control.
    pub fn render(&self, id: ControlId) -> Result<()> {
        let control = self.get(id)?;
        let _span = PerfSpan::new("structural_render");

        control.on_before_rendering();
        control.on_after_rendering();
        control.base().mark_rendered();

        tracing::debug!(
            target: targets::LIFECYCLE,
            control = %id,
            renders = control.base().render_count(),
            "structural render complete"
        );
        Ok(())
    }

    /// Re-render every live control with a pending invalidation.
    ///
    /// Returns the number of controls rendered.
    pub fn flush(&self) -> usize {
        let pending: Vec<ControlId> = {
            let mut controls = self.controls.lock();
            controls.retain(|_, control| control.strong_count() > 0);
            controls
                .iter()
                .filter_map(|(id, control)| {
                    let control = control.upgrade()?;
                    let base = control.base();
                    (base.needs_render() && !base.is_destroyed()).then_some(*id)
                })
                .collect()
        };

        pending
            .into_iter()
            .filter(|id| self.render(*id).is_ok())
            .count()
    }

    /// Tear the control down: run its exit hook and forget it.
    pub fn destroy(&self, id: ControlId) -> Result<()> {
        let control = self.get(id)?;
        control.base().mark_destroyed()?;
        control.exit();
        self.controls.lock().remove(&id);
        Ok(())
    }

    /// Number of controls currently managed.
    pub fn control_count(&self) -> usize {
        self.controls.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        base: ControlBase,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Control for Recorder {
        fn base(&self) -> &ControlBase {
            &self.base
        }

        fn init(&self) {
            self.calls.lock().push("init");
        }

        fn on_before_rendering(&self) {
            self.calls.lock().push("before");
        }

        fn on_after_rendering(&self) {
            self.calls.lock().push("after");
        }

        fn exit(&self) {
            self.calls.lock().push("exit");
        }
    }

    #[test]
    fn test_hook_order() {
        let manager = RenderManager::new();
        let recorder = Arc::new(Recorder::default());
        let control: Arc<dyn Control> = recorder.clone();

        let id = manager.add(&control);
        manager.render(id).unwrap();
        manager.destroy(id).unwrap();

        assert_eq!(*recorder.calls.lock(), vec!["init", "before", "after", "exit"]);
        assert_eq!(recorder.base.render_count(), 1);
    }

    #[test]
    fn test_flush_renders_only_invalidated() {
        let manager = RenderManager::new();
        let recorder = Arc::new(Recorder::default());
        let control: Arc<dyn Control> = recorder.clone();
        let id = manager.add(&control);

        manager.render(id).unwrap();
        assert_eq!(manager.flush(), 0);

        recorder.base.invalidate();
        assert!(recorder.base.needs_render());
        assert_eq!(manager.flush(), 1);
        assert!(!recorder.base.needs_render());
        assert_eq!(recorder.base.render_count(), 2);
    }

    #[test]
    fn test_destroy_twice_fails() {
        let manager = RenderManager::new();
        let control: Arc<dyn Control> = Arc::new(Recorder::default());
        let id = manager.add(&control);

        manager.destroy(id).unwrap();
        assert_eq!(manager.destroy(id), Err(CoreError::UnknownControl(id)));
        assert!(control.base().is_destroyed());
    }

    #[test]
    fn test_dropped_control_is_forgotten() {
        let manager = RenderManager::new();
        let control: Arc<dyn Control> = Arc::new(Recorder::default());
        let id = manager.add(&control);
        drop(control);

        assert_eq!(manager.flush(), 0);
        assert_eq!(manager.control_count(), 0);
        assert_eq!(manager.render(id), Err(CoreError::UnknownControl(id)));
    }
}
