//! Modal dialog discovery and classification
//!
//! Targets never say which dialog they opened. Each candidate is reduced to
//! a structural signature and classified from that alone, so the same rules
//! cover dialogs found through the accessibility tree and through window
//! messages.

use std::time::Duration;

use crate::retry::{RetryPolicy, retry_until};
use crate::surface::{
    Accessibility, Condition, ControlType, ElementRef, VirtualKey, WindowHandle, WindowMessaging, query,
};

/// Automation id of the common file dialog's file-name edit
pub(crate) const FILE_NAME_EDIT_ID: &str = "1001";

/// Dialog control ids and automation ids that accept a dialog
const CONFIRM_IDS: [&str; 4] = ["1", "6", "OkButton", "YesButton"];

/// IDOK
const CONFIRM_CONTROL_ID: i32 = 1;

const FILE_NAME_EDIT_CONTROL_ID: i32 = 1001;

/// IDYES and IDNO of a native message box
const YES_NO_IDS: [&str; 2] = ["6", "7"];

/// Automation id of the yes button in framework-built question boxes
const YES_BUTTON_ID: &str = "YesButton";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    FileSave,
    SaveOptions,
    SaveProgress,
    Confirmation,
    Notify,
}

impl DialogKind {
    /// Dialogs that only appear while a save is under way
    pub fn is_save_related(self) -> bool {
        matches!(
            self,
            DialogKind::FileSave | DialogKind::SaveOptions | DialogKind::SaveProgress
        )
    }
}

/// Structural facts about a dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogSignature {
    pub button_count: usize,
    pub automation_ids: Vec<String>,
    pub has_progress_bar: bool,
    pub has_file_name_edit: bool,
    /// Check boxes, radio buttons or drop-downs
    pub has_option_controls: bool,
}

impl DialogSignature {
    /// Classify by signature; order matters, the first rule that applies wins
    pub fn classify(&self) -> DialogKind {
        if self.has_progress_bar {
            DialogKind::SaveProgress
        } else if self.has_file_name_edit {
            DialogKind::FileSave
        } else if self.has_option_controls {
            DialogKind::SaveOptions
        } else if self.asks_yes_no() {
            DialogKind::Confirmation
        } else {
            DialogKind::Notify
        }
    }

    /// Yes/No question rather than an OK/Cancel message
    ///
    /// Error boxes carry two buttons as often as questions do, so the button
    /// ids decide.
    fn asks_yes_no(&self) -> bool {
        let has = |id: &str| self.automation_ids.iter().any(|a| a == id);
        self.button_count >= 2 && (YES_NO_IDS.iter().all(|&id| has(id)) || has(YES_BUTTON_ID))
    }

    /// Signature of a dialog reached through the accessibility tree
    pub fn of_element(acc: &dyn Accessibility, dialog: &ElementRef) -> Self {
        let mut signature = DialogSignature::default();
        for element in query::find_all(acc, dialog, &Condition::new()) {
            let Ok(info) = acc.info(&element) else {
                continue;
            };
            match info.control_type {
                ControlType::Button => signature.button_count += 1,
                ControlType::ProgressBar => signature.has_progress_bar = true,
                ControlType::Edit if info.automation_id == FILE_NAME_EDIT_ID => {
                    signature.has_file_name_edit = true
                }
                ControlType::CheckBox | ControlType::RadioButton | ControlType::ComboBox => {
                    signature.has_option_controls = true
                }
                _ => {}
            }
            if !info.automation_id.is_empty() {
                signature.automation_ids.push(info.automation_id);
            }
        }
        signature
    }

    /// Signature of a dialog reached through window messages
    ///
    /// Only class names and control ids are available here. The file dialog
    /// is recognized by its extended combo box or its file-name edit id.
    pub fn of_window(msg: &dyn WindowMessaging, dialog: WindowHandle) -> Self {
        let mut signature = DialogSignature::default();
        let controls = msg.descendants(dialog).unwrap_or_default();
        for control in controls {
            let Ok(class) = msg.class_name(control) else {
                continue;
            };
            let id = msg.control_id(control).ok();
            if class.eq_ignore_ascii_case("Button") {
                signature.button_count += 1;
            } else if class.contains("msctls_progress32") {
                signature.has_progress_bar = true;
            } else if class.eq_ignore_ascii_case("ComboBoxEx32")
                || (class.eq_ignore_ascii_case("Edit") && id == Some(FILE_NAME_EDIT_CONTROL_ID))
            {
                signature.has_file_name_edit = true;
            }
            if let Some(id) = id {
                signature.automation_ids.push(id.to_string());
            }
        }
        signature
    }
}

/// How a dialog is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogHandle {
    Element(ElementRef),
    Window(WindowHandle),
}

/// A modal dialog owned by a target's main window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub handle: DialogHandle,
    pub title: String,
    pub signature: DialogSignature,
}

impl Dialog {
    pub fn from_element(acc: &dyn Accessibility, element: ElementRef) -> Option<Self> {
        let title = acc.info(&element).ok()?.name;
        let signature = DialogSignature::of_element(acc, &element);
        Some(Dialog {
            handle: DialogHandle::Element(element),
            title,
            signature,
        })
    }

    pub fn from_window(msg: &dyn WindowMessaging, window: WindowHandle, timeout: Duration) -> Option<Self> {
        if !msg.is_window(window) {
            return None;
        }
        let title = query::control_text(msg, window, timeout).unwrap_or_default();
        Some(Dialog {
            handle: DialogHandle::Window(window),
            title,
            signature: DialogSignature::of_window(msg, window),
        })
    }

    pub fn kind(&self) -> DialogKind {
        self.signature.classify()
    }

    /// Title for diagnostics
    pub fn describe(&self) -> String {
        if self.title.is_empty() {
            format!("{:?} dialog", self.kind())
        } else {
            format!("{:?} dialog \"{}\"", self.kind(), self.title)
        }
    }
}

/// Outcome of a dialog search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Found(Dialog, DialogKind),
    /// A message or question nobody asked for; the save cannot go on
    Unexpected(Dialog),
    NotFound,
}

/// Poll `scan` until a dialog of one of the `targets` kinds shows up
///
/// Save-related dialogs of other kinds are ignored. Notify and confirmation
/// dialogs that were not asked for end the search: they report errors or
/// ask questions the caller has no answer to.
pub fn discover(mut scan: impl FnMut() -> Vec<Dialog>, targets: &[DialogKind], policy: RetryPolicy) -> Discovery {
    retry_until(
        || pick(scan(), targets),
        |found| !matches!(found, Discovery::NotFound),
        policy,
    )
}

fn pick(dialogs: Vec<Dialog>, targets: &[DialogKind]) -> Discovery {
    for dialog in dialogs {
        let kind = dialog.kind();
        if targets.contains(&kind) {
            return Discovery::Found(dialog, kind);
        }
        if !kind.is_save_related() {
            return Discovery::Unexpected(dialog);
        }
        log::trace!("Ignoring {} while waiting for {:?}", dialog.describe(), targets);
    }
    Discovery::NotFound
}

/// Press the accept button of a tree dialog
pub(crate) fn confirm_element(acc: &dyn Accessibility, dialog: &ElementRef) -> bool {
    let button = CONFIRM_IDS
        .iter()
        .find_map(|id| {
            query::find_first(
                acc,
                dialog,
                &Condition::new().automation_id(*id).control_type(ControlType::Button),
            )
        })
        .or_else(|| {
            query::find_first(
                acc,
                dialog,
                &Condition::new().name("OK").control_type(ControlType::Button),
            )
        });
    match button {
        Some(button) => query::invoke(acc, &button),
        None => {
            log::debug!("No accept button in dialog");
            false
        }
    }
}

/// Press the accept button of a native dialog, or send Enter to it
pub(crate) fn confirm_window(msg: &dyn WindowMessaging, dialog: WindowHandle) -> bool {
    let ok = msg.descendants(dialog).unwrap_or_default().into_iter().find(|&control| {
        msg.control_id(control).ok() == Some(CONFIRM_CONTROL_ID)
            && msg.class_name(control).is_ok_and(|c| c.eq_ignore_ascii_case("Button"))
    });
    match ok {
        Some(button) => query::click(msg, button),
        None => query::press_key(msg, dialog, VirtualKey::Enter),
    }
}
