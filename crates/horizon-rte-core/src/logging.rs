//! Logging facilities for Horizon RTE.
//!
//! Horizon RTE is instrumented with the `tracing` crate. To see logs, install a
//! subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_rte::toolbar=warn,horizon_rte::sync=debug")
//!     .init();
//! ```
//!
//! Every subsystem logs under one of the [`targets`] so hosts can filter them
//! individually.

/// Target names for log filtering.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_rte_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_rte_core::signal";
    /// Control lifecycle and render manager target.
    pub const LIFECYCLE: &str = "horizon_rte_core::lifecycle";
    /// Resize notification target.
    pub const RESIZE: &str = "horizon_rte_core::resize";
    /// Toolbar construction and active-state checks.
    pub const TOOLBAR: &str = "horizon_rte::toolbar";
    /// Command registry and command execution.
    pub const COMMAND: &str = "horizon_rte::command";
    /// Content capture/restore across structural re-renders.
    pub const SYNC: &str = "horizon_rte::sync";
    /// Editable surface state machine.
    pub const SURFACE: &str = "horizon_rte::surface";
    /// Editable document model and native command engine.
    pub const DOM: &str = "horizon_rte::dom";
    /// Editor settings loading.
    pub const SETTINGS: &str = "horizon_rte::settings";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used around render passes to measure their duration.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_rte::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[macro_export]
macro_rules! rte_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "horizon_rte", $($arg)*)
    };
}

#[macro_export]
macro_rules! rte_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "horizon_rte", $($arg)*)
    };
}
