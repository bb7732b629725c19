use std::path::Path;

use super::controls::{Context, Controls};
use super::dialog::{self, Dialog, DialogHandle};
use crate::surface::{WindowHandle, query};
use crate::target::LegacyLayout;

/// Controls of a target driven through window messages
///
/// These targets expose no useful accessibility tree. Controls are found by
/// class name and caption, and driven with posted messages.
#[derive(Debug, Clone)]
pub(crate) struct LegacyRefs {
    window: WindowHandle,
    text: WindowHandle,
    play: WindowHandle,
    stop: WindowHandle,
    save: WindowHandle,
}

impl LegacyRefs {
    pub fn resolve(cx: &Context, window: WindowHandle, layout: &LegacyLayout) -> Option<Self> {
        let msg = cx.msg();
        let timeout = cx.timing.control_timeout();

        let text = query::controls_of_class(msg, window, layout.text_class)
            .into_iter()
            .next()?;
        let buttons: Vec<(WindowHandle, String)> = query::controls_of_class(msg, window, layout.button_class)
            .into_iter()
            .filter_map(|button| {
                query::control_text(msg, button, timeout).map(|caption| (button, caption.trim().to_string()))
            })
            .collect();
        let button = |caption: &str| {
            buttons
                .iter()
                .find(|(_, text)| text == caption)
                .map(|(button, _)| *button)
        };

        Some(LegacyRefs {
            window,
            text,
            play: button(layout.play_caption)?,
            stop: button(layout.stop_caption)?,
            save: button(layout.save_caption)?,
        })
    }

    /// File-name field of a common file dialog
    fn file_name_field(cx: &Context, dialog: WindowHandle) -> Option<WindowHandle> {
        let msg = cx.msg();
        let edits = query::controls_of_class(msg, dialog, "Edit");
        edits
            .iter()
            .copied()
            .find(|&edit| msg.control_id(edit).ok() == Some(1001))
            .or_else(|| edits.first().copied())
    }
}

impl Controls for LegacyRefs {
    fn read_text(&self, cx: &Context) -> Option<String> {
        query::control_text(cx.msg(), self.text, cx.timing.control_timeout())
    }

    fn write_text(&self, cx: &Context, text: &str) -> bool {
        query::set_control_text(cx.msg(), self.text, text, cx.timing.control_timeout())
    }

    fn press_play(&self, cx: &Context) -> bool {
        query::click(cx.msg(), self.play)
    }

    fn press_stop(&self, cx: &Context) -> bool {
        query::click(cx.msg(), self.stop)
    }

    fn save_enabled(&self, cx: &Context) -> Option<bool> {
        query::control_enabled(cx.msg(), self.save)
    }

    fn dialogs(&self, cx: &Context) -> Vec<Dialog> {
        let msg = cx.msg();
        let timeout = cx.timing.control_timeout();
        query::owned_windows(msg, self.window)
            .into_iter()
            .filter_map(|window| Dialog::from_window(msg, window, timeout))
            .collect()
    }

    fn press_save(&self, cx: &Context) -> bool {
        query::click(cx.msg(), self.save)
    }

    fn confirm_dialog(&self, cx: &Context, dialog: &Dialog) -> bool {
        match &dialog.handle {
            DialogHandle::Window(window) => dialog::confirm_window(cx.msg(), *window),
            DialogHandle::Element(element) => dialog::confirm_element(cx.acc(), element),
        }
    }

    fn enter_file_name(&self, cx: &Context, dialog: &Dialog, path: &Path) -> bool {
        let DialogHandle::Window(window) = &dialog.handle else {
            return false;
        };
        let Some(edit) = Self::file_name_field(cx, *window) else {
            log::debug!("No file name field in {}", dialog.describe());
            return false;
        };
        query::set_control_text(cx.msg(), edit, &path.to_string_lossy(), cx.timing.control_timeout())
    }

    fn dialog_open(&self, cx: &Context, dialog: &Dialog) -> bool {
        match &dialog.handle {
            DialogHandle::Window(window) => query::owned_windows(cx.msg(), self.window).contains(window),
            DialogHandle::Element(element) => query::modal_windows(cx.acc(), self.window).contains(element),
        }
    }

    /// Buttons stay greyed out after a save until the window is activated
    /// again; a stop press brings them back
    fn after_save(&self, cx: &Context) {
        let msg = cx.msg();
        if let Err(e) = msg.activate(self.window) {
            log::debug!("Could not activate window {}: {}", self.window, e);
        }
        query::click(msg, self.stop);
    }
}
