use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::controls::{Context, Controls};
use super::dialog::Dialog;
use super::save::{self, SaveError, SaveFailure};
use super::tree::TreeRefs;
use crate::retry::wait_until;
use crate::talk_api::TalkApi;

/// Tree controls plus the target's own talk API, when it loaded
///
/// The API is preferred for everything it covers. Without it (not
/// installed, or not connected to this host) the tree controls do the work.
#[derive(Clone)]
pub(crate) struct HybridRefs {
    tree: TreeRefs,
    api: Option<Arc<dyn TalkApi>>,
}

impl HybridRefs {
    pub fn new(tree: TreeRefs, api: Option<Arc<dyn TalkApi>>) -> Self {
        HybridRefs { tree, api }
    }

    fn api(&self) -> Option<&dyn TalkApi> {
        self.api.as_deref().filter(|api| api.is_connected())
    }

    fn save_through_api(&self, api: &dyn TalkApi, cx: &Context, path: &Path) -> Result<Option<PathBuf>, SaveFailure> {
        let text = self.tree.read_text(cx).unwrap_or_default();
        save::prepare_destination(path)?;
        if !api.output_wave_to_file(&text, path) {
            return Err(SaveError::ApiFailed.into());
        }
        if wait_until(|| path.exists(), cx.timing.save_wait()) {
            Ok(Some(path.to_path_buf()))
        } else {
            Err(SaveFailure::with_extra(
                SaveError::Timeout,
                format!("{} not written", path.display()),
            ))
        }
    }
}

impl Controls for HybridRefs {
    fn read_text(&self, cx: &Context) -> Option<String> {
        self.tree.read_text(cx)
    }

    fn write_text(&self, cx: &Context, text: &str) -> bool {
        self.tree.write_text(cx, text)
    }

    fn press_play(&self, cx: &Context) -> bool {
        match self.api() {
            Some(api) => self.tree.read_text(cx).is_some_and(|text| api.speak(&text)),
            None => self.tree.press_play(cx),
        }
    }

    fn press_stop(&self, cx: &Context) -> bool {
        match self.api() {
            Some(api) => api.stop(),
            None => self.tree.press_stop(cx),
        }
    }

    fn save_enabled(&self, cx: &Context) -> Option<bool> {
        self.tree.save_enabled(cx)
    }

    fn is_playing(&self, cx: &Context) -> bool {
        match self.api() {
            Some(api) => api.is_speaking(),
            None => self.tree.is_playing(cx),
        }
    }

    fn character_name(&self, cx: &Context) -> Option<String> {
        self.api()
            .and_then(|api| api.cast())
            .filter(|cast| !cast.is_empty())
            .or_else(|| self.tree.character_name(cx))
    }

    fn dialogs(&self, cx: &Context) -> Vec<Dialog> {
        self.tree.dialogs(cx)
    }

    fn press_save(&self, cx: &Context) -> bool {
        self.tree.press_save(cx)
    }

    fn confirm_dialog(&self, cx: &Context, dialog: &Dialog) -> bool {
        self.tree.confirm_dialog(cx, dialog)
    }

    fn enter_file_name(&self, cx: &Context, dialog: &Dialog, path: &Path) -> bool {
        self.tree.enter_file_name(cx, dialog, path)
    }

    fn dialog_open(&self, cx: &Context, dialog: &Dialog) -> bool {
        self.tree.dialog_open(cx, dialog)
    }

    fn save(&self, cx: &Context, path: &Path) -> Result<Option<PathBuf>, SaveFailure> {
        match self.api() {
            Some(api) => {
                log::debug!("Saving {:?} through the talk API", path);
                self.save_through_api(api, cx, path)
            }
            None => save::save_with_dialogs(self, cx, path),
        }
    }
}
