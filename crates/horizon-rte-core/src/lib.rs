//! Core systems for Horizon RTE.
//!
//! This crate provides the framework-side primitives the rich-text editor
//! control is built on:
//!
//! - **Signal/Slot System**: synchronous, re-entrancy safe notifications
//! - **Property System**: change-detecting property store values
//! - **Control Lifecycle**: the hook contract between host and control, and a
//!   [`RenderManager`] that drives it
//! - **Resize Notification**: per-control size change callbacks
//! - **Logging**: `tracing` targets and macros shared by all subsystems
//!
//! # Example
//!
//! ```
//! use horizon_rte_core::{Property, ResizeHandler, Size};
//!
//! let resize = ResizeHandler::new();
//! let surface_height = std::sync::Arc::new(Property::new("height", 0.0_f32));
//!
//! let height = surface_height.clone();
//! resize.register(move |size: Size| {
//!     height.set(size.height - 32.0);
//! });
//!
//! resize.notify_all(Size::new(640.0, 480.0));
//! assert_eq!(surface_height.get(), 448.0);
//! ```

mod error;
pub mod lifecycle;
pub mod logging;
pub mod property;
pub mod resize;
pub mod signal;

pub use error::{CoreError, Result};
pub use lifecycle::{Control, ControlBase, ControlId, RenderManager};
pub use logging::PerfSpan;
pub use property::Property;
pub use resize::{ResizeHandler, ResizeListenerId, Size};
pub use signal::{ConnectionId, Signal};
