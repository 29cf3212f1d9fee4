//! Control property store entries.
//!
//! A [`Property`] is one named, change-detecting value of a control, such as
//! `value` or `menuItems`. Setting it to an equal value is a no-op; a real
//! change is announced through [`Property::changed`] after the value lock is
//! released. Properties marked [`invalidating`](Property::invalidating)
//! affect the control's structure, and their owner re-renders when they
//! change.
//!
//! # Example
//!
//! ```
//! use horizon_rte_core::Property;
//!
//! let value = Property::new("value", String::new());
//! value.changed.connect(|markup| println!("value is now {markup}"));
//!
//! assert!(value.set("<p>Hello</p>".to_string()));
//! assert!(!value.set("<p>Hello</p>".to_string()));
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::signal::Signal;

/// A named, change-detecting control property.
pub struct Property<T> {
    name: &'static str,
    invalidating: bool,
    value: RwLock<T>,
    /// Emitted with the new value after every change made through
    /// [`Property::set`].
    pub changed: Signal<T>,
}

impl<T> Property<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// A property whose changes do not affect the control's structure.
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            invalidating: false,
            value: RwLock::new(value),
            changed: Signal::new(),
        }
    }

    /// A property whose changes require a structural re-render.
    pub fn invalidating(name: &'static str, value: T) -> Self {
        Self {
            invalidating: true,
            ..Self::new(name, value)
        }
    }

    /// The property name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether changes require a structural re-render.
    pub fn is_invalidating(&self) -> bool {
        self.invalidating
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Read the value in place.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Whether the current value equals `other`.
    pub fn is(&self, other: &T) -> bool {
        *self.value.read() == *other
    }

    /// Store `value` and emit [`Property::changed`]. Returns `false`, without
    /// emitting, when the value is unchanged.
    pub fn set(&self, value: T) -> bool {
        if !self.store(value.clone()) {
            return false;
        }
        tracing::trace!(target: crate::logging::targets::CORE, property = self.name, "property changed");
        self.changed.emit(value);
        true
    }

    /// Store `value` without emitting. Returns whether it changed.
    pub fn set_quiet(&self, value: T) -> bool {
        self.store(value)
    }

    fn store(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &*self.value.read())
            .field("invalidating", &self.invalidating)
            .finish()
    }
}

static_assertions::assert_impl_all!(Property<String>: Send, Sync);
