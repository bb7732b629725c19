use std::time::Duration;

use super::{UiResult, WindowHandle};

/// Keys the drivers synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualKey {
    Enter,
    Escape,
    Space,
    End,
    Home,
}

/// Raw window-message transport for targets without a usable
/// accessibility tree
///
/// Text access is bounded by a timeout because a hung target would
/// otherwise block the caller indefinitely.
pub trait WindowMessaging: Send + Sync {
    /// Every descendant control of a window, depth-first
    fn descendants(&self, window: WindowHandle) -> UiResult<Vec<WindowHandle>>;

    /// Window class name
    fn class_name(&self, window: WindowHandle) -> UiResult<String>;

    /// Dialog control identifier
    fn control_id(&self, window: WindowHandle) -> UiResult<i32>;

    /// Window text (WM_GETTEXT)
    fn text(&self, window: WindowHandle, timeout: Duration) -> UiResult<String>;

    /// Assign window text (WM_SETTEXT)
    fn set_text(&self, window: WindowHandle, text: &str, timeout: Duration) -> UiResult<()>;

    fn is_enabled(&self, window: WindowHandle) -> UiResult<bool>;

    /// Whether the handle still names a live window
    fn is_window(&self, window: WindowHandle) -> bool;

    /// Post a button click (BM_CLICK)
    fn post_click(&self, button: WindowHandle) -> UiResult<()>;

    fn post_key_down(&self, window: WindowHandle, key: VirtualKey) -> UiResult<()>;

    fn post_key_up(&self, window: WindowHandle, key: VirtualKey) -> UiResult<()>;

    /// Visible top-level windows owned by `owner` (its dialogs)
    fn owned_windows(&self, owner: WindowHandle) -> UiResult<Vec<WindowHandle>>;

    /// Bring a top-level window to the foreground
    fn activate(&self, window: WindowHandle) -> UiResult<()>;
}
