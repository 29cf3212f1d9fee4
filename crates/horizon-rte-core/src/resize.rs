//! Resize-notification service.
//!
//! Controls register a callback that is invoked whenever the host reports a new
//! rendered box size for them. Registration returns a [`ResizeListenerId`] that
//! must be handed back on teardown.

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{CoreError, Result};
use crate::logging::targets;

new_key_type! {
    /// Identifier of a registered resize listener.
    pub struct ResizeListenerId;
}

/// A rendered box size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

type ResizeCallback = Arc<dyn Fn(Size) + Send + Sync>;

/// Dispatches size changes to registered listeners.
#[derive(Default)]
pub struct ResizeHandler {
    listeners: Mutex<SlotMap<ResizeListenerId, ResizeCallback>>,
}

impl ResizeHandler {
    /// Create a handler with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked on every size notification.
    pub fn register<F>(&self, callback: F) -> ResizeListenerId
    where
        F: Fn(Size) + Send + Sync + 'static,
    {
        let id = self.listeners.lock().insert(Arc::new(callback));
        tracing::trace!(target: targets::RESIZE, ?id, "resize listener registered");
        id
    }

    /// Remove a previously registered callback.
    pub fn deregister(&self, id: ResizeListenerId) -> Result<()> {
        self.listeners
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or(CoreError::UnknownResizeListener(id))
    }

    /// Report a new size to one listener.
    pub fn notify(&self, id: ResizeListenerId, size: Size) -> Result<()> {
        let callback = self
            .listeners
            .lock()
            .get(id)
            .cloned()
            .ok_or(CoreError::UnknownResizeListener(id))?;
        callback(size);
        Ok(())
    }

    /// Report a new size to every listener.
    pub fn notify_all(&self, size: Size) {
        let callbacks: Vec<ResizeCallback> = self.listeners.lock().values().cloned().collect();
        for callback in callbacks {
            callback(size);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_notify_deregister() {
        let handler = ResizeHandler::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let id = handler.register(move |size| seen_clone.lock().push(size));

        handler.notify(id, Size::new(400.0, 300.0)).unwrap();
        handler.notify_all(Size::new(200.0, 100.0));
        assert_eq!(
            *seen.lock(),
            vec![Size::new(400.0, 300.0), Size::new(200.0, 100.0)]
        );

        handler.deregister(id).unwrap();
        assert_eq!(handler.listener_count(), 0);
        assert_eq!(
            handler.deregister(id),
            Err(CoreError::UnknownResizeListener(id))
        );
        assert!(handler.notify(id, Size::default()).is_err());
    }
}
