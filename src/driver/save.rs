//! The save-to-file sequence
//!
//! Press save, find out which dialog the target answered with, walk it
//! through to a file on disk. Targets answer with a file dialog, with an
//! options dialog followed by a file dialog, or (auto-naming targets) with a
//! confirmation or a progress window and no file dialog at all.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::controls::{Context, Controls};
use super::dialog::{Dialog, DialogKind, Discovery, discover};
use crate::retry::{retry_until, wait_until};

/// Companion files some targets write next to the WAVE file
const COMPANION_EXTENSIONS: [&str; 2] = ["txt", "lab"];

/// Why a save did not produce a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("Target is not running")]
    NotRunning,

    #[error("A save is already in progress")]
    AlreadySaving,

    #[error("A dialog is open in the target")]
    DialogShowing,

    #[error("Talk text is blank")]
    BlankText,

    #[error("Destination must be an absolute .wav path")]
    InvalidPath,

    #[error("Save control could not be pressed")]
    SaveControl,

    #[error("Save dialog did not appear")]
    DialogNotFound,

    #[error("Save options dialog could not be confirmed")]
    OptionsNotConfirmed,

    #[error("File name could not be entered")]
    FileNameNotEntered,

    #[error("Existing file could not be removed")]
    FileNotRemovable,

    #[error("Destination directory could not be created")]
    DirectoryNotCreatable,

    #[error("File dialog could not be confirmed")]
    DialogNotConfirmed,

    #[error("File dialog did not close")]
    DialogStillOpen,

    #[error("An unexpected dialog appeared")]
    UnexpectedDialog,

    #[error("Saving timed out")]
    Timeout,

    #[error("Talk API failed to write the file")]
    ApiFailed,
}

/// A save error plus an optional secondary diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub error: SaveError,
    pub extra: Option<String>,
}

impl SaveFailure {
    pub fn with_extra(error: SaveError, extra: impl Into<String>) -> Self {
        SaveFailure {
            error,
            extra: Some(extra.into()),
        }
    }
}

impl From<SaveError> for SaveFailure {
    fn from(error: SaveError) -> Self {
        SaveFailure { error, extra: None }
    }
}

impl std::fmt::Display for SaveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.extra {
            Some(extra) => write!(f, "{} ({})", self.error, extra),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Outcome of one save invocation
///
/// On success `file_path` is the written file, or `None` when the target
/// chose the file name itself. An auto-named save is still a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSaveResult {
    pub succeeded: bool,
    pub file_path: Option<PathBuf>,
    pub error: Option<String>,
    pub extra_message: Option<String>,
}

impl FileSaveResult {
    pub fn success(file_path: PathBuf) -> Self {
        FileSaveResult {
            succeeded: true,
            file_path: Some(file_path),
            error: None,
            extra_message: None,
        }
    }

    pub fn auto_named() -> Self {
        FileSaveResult {
            succeeded: true,
            file_path: None,
            error: None,
            extra_message: None,
        }
    }

    pub fn is_auto_named(&self) -> bool {
        self.succeeded && self.file_path.is_none()
    }
}

impl From<SaveFailure> for FileSaveResult {
    fn from(failure: SaveFailure) -> Self {
        FileSaveResult {
            succeeded: false,
            file_path: None,
            error: Some(failure.error.to_string()),
            extra_message: failure.extra,
        }
    }
}

impl From<SaveError> for FileSaveResult {
    fn from(error: SaveError) -> Self {
        SaveFailure::from(error).into()
    }
}

/// Whether `path` can name a save destination
pub fn is_valid_destination(path: &Path) -> bool {
    path.is_absolute()
        && path.file_stem().is_some()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

/// Create the destination directory and clear files that would trigger an
/// overwrite prompt
pub(crate) fn prepare_destination(path: &Path) -> Result<(), SaveFailure> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            SaveFailure::with_extra(SaveError::DirectoryNotCreatable, format!("{}: {}", parent.display(), e))
        })?;
    }

    let companions = COMPANION_EXTENSIONS.iter().map(|ext| path.with_extension(ext));
    for file in std::iter::once(path.to_path_buf()).chain(companions) {
        match fs::remove_file(&file) {
            Ok(()) => log::debug!("Removed existing {:?}", file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(SaveFailure::with_extra(
                    SaveError::FileNotRemovable,
                    format!("{}: {}", file.display(), e),
                ));
            }
        }
    }
    Ok(())
}

/// Run the dialog-driven save sequence
///
/// The caller holds the driver's save lock and has already checked every
/// precondition.
pub(crate) fn save_with_dialogs<C: Controls + ?Sized>(
    c: &C,
    cx: &Context,
    path: &Path,
) -> Result<Option<PathBuf>, SaveFailure> {
    if !c.press_save(cx) {
        return Err(SaveError::SaveControl.into());
    }

    let targets: &[DialogKind] = if cx.descriptor.auto_names_on_confirm {
        &[DialogKind::FileSave, DialogKind::SaveOptions, DialogKind::Confirmation]
    } else {
        &[DialogKind::FileSave, DialogKind::SaveOptions]
    };
    let first = discover(|| c.dialogs(cx), targets, cx.timing.dialog_wait());
    match first {
        Discovery::Found(dialog, DialogKind::FileSave) => save_through_file_dialog(c, cx, &dialog, path),
        Discovery::Found(dialog, DialogKind::SaveOptions) => save_after_options(c, cx, &dialog, path),
        Discovery::Found(dialog, _) => {
            log::debug!("Target answered save with {}", dialog.describe());
            if !c.confirm_dialog(cx, &dialog) {
                return Err(SaveFailure::with_extra(SaveError::DialogNotConfirmed, dialog.title));
            }
            await_auto_named(c, cx)
        }
        Discovery::Unexpected(dialog) => Err(unexpected(&dialog)),
        Discovery::NotFound => Err(SaveError::DialogNotFound.into()),
    }
}

fn save_after_options<C: Controls + ?Sized>(
    c: &C,
    cx: &Context,
    options: &Dialog,
    path: &Path,
) -> Result<Option<PathBuf>, SaveFailure> {
    log::debug!("Confirming {}", options.describe());
    if !c.confirm_dialog(cx, options) || !wait_until(|| !c.dialog_open(cx, options), cx.timing.action_wait()) {
        return Err(SaveFailure::with_extra(SaveError::OptionsNotConfirmed, options.title.clone()));
    }

    let next = discover(
        || c.dialogs(cx),
        &[DialogKind::FileSave, DialogKind::SaveProgress],
        cx.timing.dialog_wait(),
    );
    match next {
        Discovery::Found(dialog, DialogKind::FileSave) => save_through_file_dialog(c, cx, &dialog, path),
        Discovery::Found(progress, _) => {
            // Auto-naming target: no file dialog, straight to writing
            await_progress(c, cx, &progress)?;
            accept_completion_notice(c, cx);
            Ok(None)
        }
        Discovery::Unexpected(dialog) => Err(unexpected(&dialog)),
        Discovery::NotFound => Err(SaveError::DialogNotFound.into()),
    }
}

fn save_through_file_dialog<C: Controls + ?Sized>(
    c: &C,
    cx: &Context,
    dialog: &Dialog,
    path: &Path,
) -> Result<Option<PathBuf>, SaveFailure> {
    if !c.enter_file_name(cx, dialog, path) {
        return Err(SaveFailure::with_extra(
            SaveError::FileNameNotEntered,
            path.display().to_string(),
        ));
    }
    prepare_destination(path)?;

    if !c.confirm_dialog(cx, dialog) {
        return Err(SaveFailure::with_extra(SaveError::DialogNotConfirmed, dialog.title.clone()));
    }
    if !wait_until(|| !c.dialog_open(cx, dialog), cx.timing.action_wait()) {
        return Err(SaveFailure::with_extra(SaveError::DialogStillOpen, dialog.title.clone()));
    }

    await_file(c, cx, path).map(Some)
}

enum Completion {
    Written,
    Progress(Dialog),
    Unexpected(Dialog),
    Pending,
}

/// Wait for the file, following a progress window if one shows up
fn await_file<C: Controls + ?Sized>(c: &C, cx: &Context, path: &Path) -> Result<PathBuf, SaveFailure> {
    let completion = retry_until(
        || {
            if path.exists() {
                return Completion::Written;
            }
            let dialogs = c.dialogs(cx);
            match dialogs.into_iter().next() {
                Some(dialog) if dialog.kind() == DialogKind::SaveProgress => Completion::Progress(dialog),
                Some(dialog) => Completion::Unexpected(dialog),
                None => Completion::Pending,
            }
        },
        |completion| !matches!(completion, Completion::Pending),
        cx.timing.save_wait(),
    );

    match completion {
        Completion::Written => Ok(path.to_path_buf()),
        Completion::Progress(progress) => {
            await_progress(c, cx, &progress)?;
            if wait_until(|| path.exists(), cx.timing.action_wait()) {
                Ok(path.to_path_buf())
            } else {
                Err(SaveFailure::with_extra(
                    SaveError::Timeout,
                    format!("{} not written", path.display()),
                ))
            }
        }
        Completion::Unexpected(dialog) => Err(unexpected(&dialog)),
        Completion::Pending => Err(SaveFailure::with_extra(
            SaveError::Timeout,
            format!("{} not written", path.display()),
        )),
    }
}

/// After an auto-naming confirmation the file name is never known, so the
/// target's progress window is the only evidence of a write
fn await_auto_named<C: Controls + ?Sized>(c: &C, cx: &Context) -> Result<Option<PathBuf>, SaveFailure> {
    let state = retry_until(
        || match c.dialogs(cx).into_iter().next() {
            Some(dialog) if dialog.kind() == DialogKind::SaveProgress => Completion::Progress(dialog),
            Some(dialog) if dialog.kind() == DialogKind::Notify => Completion::Unexpected(dialog),
            _ => Completion::Pending,
        },
        |state| !matches!(state, Completion::Pending),
        cx.timing.save_wait(),
    );

    match state {
        Completion::Progress(progress) => {
            await_progress(c, cx, &progress)?;
            accept_completion_notice(c, cx);
            Ok(None)
        }
        Completion::Unexpected(dialog) => Err(unexpected(&dialog)),
        Completion::Written | Completion::Pending => Err(SaveFailure::with_extra(
            SaveError::Timeout,
            "no progress window after confirmation",
        )),
    }
}

fn await_progress<C: Controls + ?Sized>(c: &C, cx: &Context, progress: &Dialog) -> Result<(), SaveFailure> {
    log::debug!("Waiting for {} to close", progress.describe());
    if wait_until(|| !c.dialog_open(cx, progress), cx.timing.progress_wait()) {
        Ok(())
    } else {
        Err(SaveFailure::with_extra(SaveError::Timeout, "progress window still open"))
    }
}

/// Auto-naming targets may report completion in a message box
fn accept_completion_notice<C: Controls + ?Sized>(c: &C, cx: &Context) {
    let notice = c
        .dialogs(cx)
        .into_iter()
        .find(|d| matches!(d.kind(), DialogKind::Notify | DialogKind::Confirmation));
    if let Some(notice) = notice {
        log::debug!("Accepting {}", notice.describe());
        c.confirm_dialog(cx, &notice);
    }
}

fn unexpected(dialog: &Dialog) -> SaveFailure {
    log::warn!("Save interrupted by {}", dialog.describe());
    SaveFailure::with_extra(SaveError::UnexpectedDialog, dialog.describe())
}
