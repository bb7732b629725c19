//! UI surfaces consumed by the drivers
//!
//! The accessibility tree and the raw window-message transport are provided
//! by the hosting application as trait objects. Both report failures as
//! [`UiError`]; the helpers in [`query`] flatten those into "not found" and
//! `false` so driver code never has to reason about surface faults.

pub mod accessibility;
pub mod message;
pub mod query;

#[cfg(test)]
pub(crate) mod fake;

pub use accessibility::{Accessibility, Condition, ControlType, ElementInfo, ElementRef, ExpandState};
pub use message::{VirtualKey, WindowMessaging};

/// Opaque native window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    /// Handle value that never names a window
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Failures reported by the accessibility layer or the message transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UiError {
    #[error("Element or window is no longer available")]
    NotAvailable,

    #[error("Pattern not supported: {0}")]
    PatternNotSupported(&'static str),

    #[error("Control is read-only")]
    ReadOnly,

    #[error("Operation timed out")]
    Timeout,

    #[error("Platform error: {0}")]
    Platform(String),
}

pub type UiResult<T> = std::result::Result<T, UiError>;
