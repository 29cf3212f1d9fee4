//! Error types for Horizon RTE core.

use std::fmt;

use crate::lifecycle::ControlId;
use crate::resize::ResizeListenerId;

/// The error type for core framework operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The resize listener ID is invalid or was already deregistered.
    UnknownResizeListener(ResizeListenerId),
    /// The control has already been torn down.
    ControlDestroyed(ControlId),
    /// The control is not registered with the render manager.
    UnknownControl(ControlId),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownResizeListener(id) => {
                write!(f, "Invalid or already deregistered resize listener {id:?}")
            }
            Self::ControlDestroyed(id) => write!(f, "Control {id} has already been destroyed"),
            Self::UnknownControl(id) => {
                write!(f, "Control {id} is not registered with the render manager")
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
