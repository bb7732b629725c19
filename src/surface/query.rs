//! Fault-flattening helpers over the UI surfaces
//!
//! Every function here converts surface failures into `None` or `false`.
//! A target exiting mid-query is indistinguishable from a control that was
//! never there, which is exactly how the drivers want to treat it.

use std::time::Duration;

use super::{Accessibility, Condition, ElementRef, UiResult, VirtualKey, WindowHandle, WindowMessaging};

fn ok_or_trace<T>(what: &str, result: UiResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::trace!("{} failed: {}", what, e);
            None
        }
    }
}

/// Root element of a window
pub fn window_root(acc: &dyn Accessibility, window: WindowHandle) -> Option<ElementRef> {
    ok_or_trace("element_from_window", acc.element_from_window(window))
}

/// First descendant of `root` matching `condition`
pub fn find_first(acc: &dyn Accessibility, root: &ElementRef, condition: &Condition) -> Option<ElementRef> {
    ok_or_trace("find_first", acc.find_first(root, condition)).flatten()
}

/// All descendants of `root` matching `condition`
pub fn find_all(acc: &dyn Accessibility, root: &ElementRef, condition: &Condition) -> Vec<ElementRef> {
    ok_or_trace("find_all", acc.find_all(root, condition)).unwrap_or_default()
}

/// Text of a value-pattern control
pub fn read_text(acc: &dyn Accessibility, element: &ElementRef) -> Option<String> {
    ok_or_trace("value", acc.value(element))
}

/// Assign text to a value-pattern control and confirm it took
///
/// Some targets accept the call but leave the value unchanged; reading it
/// back catches that.
pub fn write_text(acc: &dyn Accessibility, element: &ElementRef, text: &str) -> bool {
    if ok_or_trace("is_read_only", acc.is_read_only(element)) != Some(false) {
        return false;
    }
    if ok_or_trace("set_value", acc.set_value(element, text)).is_none() {
        return false;
    }
    read_text(acc, element).as_deref() == Some(text)
}

/// Invoke a clickable control
pub fn invoke(acc: &dyn Accessibility, element: &ElementRef) -> bool {
    ok_or_trace("invoke", acc.invoke(element)).is_some()
}

/// Enabled state of an element
pub fn is_enabled(acc: &dyn Accessibility, element: &ElementRef) -> Option<bool> {
    ok_or_trace("info", acc.info(element)).map(|info| info.is_enabled)
}

/// Name of the first selected item of a list-like control
pub fn selected_name(acc: &dyn Accessibility, list: &ElementRef) -> Option<String> {
    let selected = ok_or_trace("selection", acc.selection(list))?;
    let first = selected.first()?;
    ok_or_trace("info", acc.info(first))
        .map(|info| info.name)
        .filter(|name| !name.is_empty())
}

/// Modal windows owned by `owner`
pub fn modal_windows(acc: &dyn Accessibility, owner: WindowHandle) -> Vec<ElementRef> {
    ok_or_trace("modal_windows", acc.modal_windows(owner)).unwrap_or_default()
}

/// Descendant controls of `root` whose class name contains `class_fragment`
///
/// Class names of framework-hosted controls carry per-build suffixes, so
/// matching is by substring.
pub fn controls_of_class(msg: &dyn WindowMessaging, root: WindowHandle, class_fragment: &str) -> Vec<WindowHandle> {
    ok_or_trace("descendants", msg.descendants(root))
        .unwrap_or_default()
        .into_iter()
        .filter(|&w| {
            ok_or_trace("class_name", msg.class_name(w)).is_some_and(|c| c.contains(class_fragment))
        })
        .collect()
}

/// Text of a native control
pub fn control_text(msg: &dyn WindowMessaging, window: WindowHandle, timeout: Duration) -> Option<String> {
    ok_or_trace("text", msg.text(window, timeout))
}

/// Assign text to a native control and confirm it took
pub fn set_control_text(msg: &dyn WindowMessaging, window: WindowHandle, text: &str, timeout: Duration) -> bool {
    if ok_or_trace("set_text", msg.set_text(window, text, timeout)).is_none() {
        return false;
    }
    control_text(msg, window, timeout).as_deref() == Some(text)
}

/// Enabled state of a native control
pub fn control_enabled(msg: &dyn WindowMessaging, window: WindowHandle) -> Option<bool> {
    ok_or_trace("is_enabled", msg.is_enabled(window))
}

/// Post a click to a native button
pub fn click(msg: &dyn WindowMessaging, button: WindowHandle) -> bool {
    ok_or_trace("post_click", msg.post_click(button)).is_some()
}

/// Post key-down then key-up
pub fn press_key(msg: &dyn WindowMessaging, window: WindowHandle, key: VirtualKey) -> bool {
    ok_or_trace("post_key_down", msg.post_key_down(window, key)).is_some()
        && ok_or_trace("post_key_up", msg.post_key_up(window, key)).is_some()
}

/// Windows owned by `owner`
pub fn owned_windows(msg: &dyn WindowMessaging, owner: WindowHandle) -> Vec<WindowHandle> {
    ok_or_trace("owned_windows", msg.owned_windows(owner)).unwrap_or_default()
}
