//! The command registry.
//!
//! Maps item names to [`ToolbarItem`] descriptors. Editors resolve their
//! toolbar configuration against a registry and watch its
//! [`generation`](CommandRegistry::generation) to rebuild the toolbar after
//! items are added or replaced.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use horizon_rte_core::logging::targets;
use parking_lot::RwLock;

use crate::error::{Result, RteError};
use crate::facade::{CancelPrompt, Prompt};
use crate::item::ToolbarItem;
use crate::items;

/// Explicit construction parameters of the default item set.
#[derive(Clone)]
pub struct RegistryOptions {
    /// Add the `debug-rerender` item.
    pub debug: bool,
    /// Asks the user for link targets and image URLs.
    pub prompt: Arc<dyn Prompt>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            debug: false,
            prompt: Arc::new(CancelPrompt),
        }
    }
}

impl fmt::Debug for RegistryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryOptions")
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Name-keyed store of toolbar items.
#[derive(Default)]
pub struct CommandRegistry {
    items: RwLock<HashMap<String, Arc<ToolbarItem>>>,
    generation: AtomicU64,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in items.
    pub fn with_defaults(options: RegistryOptions) -> Self {
        let registry = Self::new();
        {
            let mut map = registry.items.write();
            for item in items::default_items(&options) {
                map.insert(item.name().to_string(), Arc::new(item));
            }
        }
        tracing::debug!(
            target: targets::COMMAND,
            items = registry.len(),
            debug = options.debug,
            "registry seeded with built-in items"
        );
        registry
    }

    /// Register an item, replacing any item of the same name.
    pub fn register(&self, item: ToolbarItem) -> Result<()> {
        if item.name().is_empty() {
            return Err(RteError::InvalidItemName);
        }
        let name = item.name().to_string();
        let replaced = self
            .items
            .write()
            .insert(name.clone(), Arc::new(item))
            .is_some();
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(target: targets::COMMAND, item = %name, replaced, "toolbar item registered");
        Ok(())
    }

    /// Look up an item.
    pub fn resolve(&self, name: &str) -> Option<Arc<ToolbarItem>> {
        self.items.read().get(name).cloned()
    }

    /// Whether an item is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.items.read().contains_key(name)
    }

    /// Registered item names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.items.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether no items are registered.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Incremented on every registration.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("items", &self.names())
            .field("generation", &self.generation())
            .finish()
    }
}

static_assertions::assert_impl_all!(CommandRegistry: Send, Sync);
