use std::path::Path;

use super::controls::{Context, Controls};
use super::dialog::{self, Dialog, DialogHandle, FILE_NAME_EDIT_ID};
use crate::surface::{Condition, ControlType, ElementRef, VirtualKey, WindowHandle, query};
use crate::target::TreeLayout;

/// Controls of a target driven through the accessibility tree
#[derive(Debug, Clone)]
pub(crate) struct TreeRefs {
    window: WindowHandle,
    text_box: ElementRef,
    play: ElementRef,
    stop: ElementRef,
    save: ElementRef,
    presets: Option<ElementRef>,
}

impl TreeRefs {
    pub fn resolve(cx: &Context, window: WindowHandle, layout: &TreeLayout) -> Option<Self> {
        let acc = cx.acc();
        let root = query::window_root(acc, window)?;
        let find = |condition: Condition| query::find_first(acc, &root, &condition);

        let refs = TreeRefs {
            window,
            text_box: find(layout.text_box.condition(ControlType::Edit))?,
            play: find(layout.play_button.condition(ControlType::Button))?,
            stop: find(layout.stop_button.condition(ControlType::Button))?,
            save: find(layout.save_button.condition(ControlType::Button))?,
            presets: layout
                .preset_list
                .and_then(|locator| find(locator.condition(ControlType::List))),
        };
        log::debug!("Resolved {} controls under window {}", cx.descriptor.display_name, window);
        Some(refs)
    }

    /// Accessibility write, then a raw text set on the native edit
    ///
    /// Some file dialogs ignore programmatic value changes until they have
    /// seen keyboard input; the End key stands in for it.
    fn write_file_name(cx: &Context, edit: &ElementRef, text: &str) -> bool {
        let acc = cx.acc();
        if query::write_text(acc, edit, text) {
            return true;
        }

        let Some(native) = acc.info(edit).ok().and_then(|info| info.native_window) else {
            return false;
        };
        log::debug!("File name rejected by accessibility write, setting window text");
        let msg = cx.msg();
        let timeout = cx.timing.control_timeout();
        query::set_control_text(msg, native, text, timeout)
            && query::press_key(msg, native, VirtualKey::End)
            && query::control_text(msg, native, timeout).as_deref() == Some(text)
    }
}

impl Controls for TreeRefs {
    fn read_text(&self, cx: &Context) -> Option<String> {
        query::read_text(cx.acc(), &self.text_box)
    }

    fn write_text(&self, cx: &Context, text: &str) -> bool {
        query::write_text(cx.acc(), &self.text_box, text)
    }

    fn press_play(&self, cx: &Context) -> bool {
        query::invoke(cx.acc(), &self.play)
    }

    fn press_stop(&self, cx: &Context) -> bool {
        query::invoke(cx.acc(), &self.stop)
    }

    fn save_enabled(&self, cx: &Context) -> Option<bool> {
        query::is_enabled(cx.acc(), &self.save)
    }

    fn character_name(&self, cx: &Context) -> Option<String> {
        let presets = self.presets.as_ref()?;
        query::selected_name(cx.acc(), presets)
    }

    fn dialogs(&self, cx: &Context) -> Vec<Dialog> {
        let acc = cx.acc();
        query::modal_windows(acc, self.window)
            .into_iter()
            .filter_map(|element| Dialog::from_element(acc, element))
            .collect()
    }

    fn press_save(&self, cx: &Context) -> bool {
        query::invoke(cx.acc(), &self.save)
    }

    fn confirm_dialog(&self, cx: &Context, dialog: &Dialog) -> bool {
        match &dialog.handle {
            DialogHandle::Element(element) => dialog::confirm_element(cx.acc(), element),
            DialogHandle::Window(window) => dialog::confirm_window(cx.msg(), *window),
        }
    }

    fn enter_file_name(&self, cx: &Context, dialog: &Dialog, path: &Path) -> bool {
        let DialogHandle::Element(element) = &dialog.handle else {
            return false;
        };
        let condition = Condition::new()
            .automation_id(FILE_NAME_EDIT_ID)
            .control_type(ControlType::Edit);
        let Some(edit) = query::find_first(cx.acc(), element, &condition) else {
            log::debug!("No file name field in {}", dialog.describe());
            return false;
        };
        Self::write_file_name(cx, &edit, &path.to_string_lossy())
    }

    /// Closed dialogs can keep answering property reads for a while, so
    /// liveness is judged by the owner's modal list
    fn dialog_open(&self, cx: &Context, dialog: &Dialog) -> bool {
        match &dialog.handle {
            DialogHandle::Element(element) => query::modal_windows(cx.acc(), self.window).contains(element),
            DialogHandle::Window(window) => query::owned_windows(cx.msg(), self.window).contains(window),
        }
    }
}
