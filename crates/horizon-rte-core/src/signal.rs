//! Synchronous notifications.
//!
//! A [`Signal`] is how the editor learns about everything it reacts to:
//! surface load completion, live input, selection changes, invalidation and
//! value changes. Slots run on the emitting thread, in no particular order.
//!
//! Emission snapshots the slot table and releases its lock before running any
//! slot, so a slot may connect, disconnect or emit on the same signal. A slot
//! removed by another slot during an emission still receives that emission.
//!
//! Slots owned by a long-lived object usually should not keep it alive. Use
//! [`Signal::connect_weak`] for those; the slot turns into a no-op once the
//! receiver is dropped.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use horizon_rte_core::Signal;
//!
//! let selection_changed = Signal::<()>::new();
//! let refreshes = Arc::new(AtomicUsize::new(0));
//!
//! let id = selection_changed.connect_weak(&refreshes, |refreshes, _| {
//!     refreshes.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! selection_changed.emit(());
//! assert_eq!(refreshes.load(Ordering::SeqCst), 1);
//! assert!(selection_changed.disconnect(id));
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of one connected slot, used to disconnect it.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A notification with payload `Args` (`()` for none).
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a signal with no slots.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connect a slot.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.slots.lock().insert(Arc::new(slot))
    }

    /// Connect a slot that holds `receiver` weakly.
    ///
    /// The slot runs only while the receiver is alive.
    pub fn connect_weak<T, F>(&self, receiver: &Arc<T>, slot: F) -> ConnectionId
    where
        T: Send + Sync + ?Sized + 'static,
        F: Fn(&T, &Args) + Send + Sync + 'static,
    {
        let receiver: Weak<T> = Arc::downgrade(receiver);
        self.connect(move |args| {
            if let Some(receiver) = receiver.upgrade() {
                slot(&receiver, args);
            }
        })
    }

    /// Remove a slot. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    /// Remove every slot.
    pub fn disconnect_all(&self) {
        self.slots.lock().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Run every connected slot with `args`. Returns how many ran.
    pub fn emit(&self, args: Args) -> usize {
        let slots: Vec<Slot<Args>> = self.slots.lock().values().cloned().collect();
        if slots.is_empty() {
            return 0;
        }
        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "emitting signal");
        for slot in &slots {
            slot(&args);
        }
        slots.len()
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
