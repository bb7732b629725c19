use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::dialog::Dialog;
use super::hybrid::HybridRefs;
use super::legacy::LegacyRefs;
use super::save::{self, SaveFailure};
use super::tree::TreeRefs;
use crate::platform::Platform;
use crate::storage::TimingConfig;
use crate::surface::{Accessibility, WindowHandle, WindowMessaging};
use crate::talk_api::TalkApi;
use crate::target::{DriverFamily, TargetDescriptor};

/// Everything a family needs to act on its target
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub platform: &'a Platform,
    pub timing: &'a TimingConfig,
    pub descriptor: &'static TargetDescriptor,
}

impl<'a> Context<'a> {
    pub fn acc(&self) -> &'a dyn Accessibility {
        &*self.platform.accessibility
    }

    pub fn msg(&self) -> &'a dyn WindowMessaging {
        &*self.platform.messaging
    }
}

/// Capabilities every driver family provides over its resolved controls
///
/// Methods never fail loudly: a vanished control reads as `None` or `false`.
/// Play and save detection default to the save-control heuristic; families
/// with a better signal override them.
pub(crate) trait Controls: Send + Sync {
    fn read_text(&self, cx: &Context) -> Option<String>;

    fn write_text(&self, cx: &Context, text: &str) -> bool;

    fn press_play(&self, cx: &Context) -> bool;

    fn press_stop(&self, cx: &Context) -> bool;

    fn save_enabled(&self, cx: &Context) -> Option<bool>;

    /// The save control goes disabled while the target speaks
    fn is_playing(&self, cx: &Context) -> bool {
        self.save_enabled(cx) == Some(false)
    }

    /// Live character or voice preset name
    fn character_name(&self, _cx: &Context) -> Option<String> {
        None
    }

    /// Modal dialogs currently owned by the main window
    fn dialogs(&self, cx: &Context) -> Vec<Dialog>;

    fn press_save(&self, cx: &Context) -> bool;

    /// Press a dialog's accept button
    fn confirm_dialog(&self, cx: &Context, dialog: &Dialog) -> bool;

    /// Put `path` into a file dialog's file-name field
    fn enter_file_name(&self, cx: &Context, dialog: &Dialog, path: &Path) -> bool;

    /// Whether a dialog is still on screen
    fn dialog_open(&self, cx: &Context, dialog: &Dialog) -> bool;

    /// Restore the window after a save, whatever its outcome
    fn after_save(&self, _cx: &Context) {}

    /// Save the talk text to `path`
    ///
    /// `Ok(None)` means the target picked the file name itself.
    fn save(&self, cx: &Context, path: &Path) -> Result<Option<PathBuf>, SaveFailure> {
        save::save_with_dialogs(self, cx, path)
    }
}

/// Resolved controls of one family, bound to one main window
#[derive(Clone)]
pub(crate) enum Refs {
    Tree(TreeRefs),
    Legacy(LegacyRefs),
    Hybrid(HybridRefs),
}

impl Refs {
    /// Resolve the family's controls under `window`
    ///
    /// None when any required control is missing; callers treat that target
    /// as absent.
    pub fn resolve(cx: &Context, window: WindowHandle, api: Option<Arc<dyn TalkApi>>) -> Option<Refs> {
        match cx.descriptor.family {
            DriverFamily::Legacy(layout) => LegacyRefs::resolve(cx, window, layout).map(Refs::Legacy),
            DriverFamily::Tree(layout) => TreeRefs::resolve(cx, window, layout).map(Refs::Tree),
            DriverFamily::Hybrid(layout) => {
                TreeRefs::resolve(cx, window, layout).map(|tree| Refs::Hybrid(HybridRefs::new(tree, api)))
            }
        }
    }

    pub fn controls(&self) -> &dyn Controls {
        match self {
            Refs::Tree(refs) => refs,
            Refs::Legacy(refs) => refs,
            Refs::Hybrid(refs) => refs,
        }
    }
}
