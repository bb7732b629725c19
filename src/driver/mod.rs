//! Per-target drivers
//!
//! A [`Driver`] tracks one target product: whether it is running, whether it
//! is speaking or saving, and how to reach its controls. Hosts call
//! [`Driver::update`] with a fresh process snapshot on a timer and the
//! action methods from any thread.
//!
//! Two locks serialize work on one driver. The update lock covers every
//! action that touches the target's UI. The save lock covers a whole save;
//! while it is held, update cycles are skipped instead of waiting.

mod cache;
mod controls;
pub mod dialog;
mod hybrid;
mod legacy;
pub mod save;
mod state;
mod tree;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use crate::platform::Platform;
use crate::process::{ProcessError, ProcessInfo};
use crate::retry::{retry_until, wait_until};
use crate::storage::TimingConfig;
use crate::surface::WindowHandle;
use crate::talk_api::ApiSlot;
use crate::target::{DriverFamily, TargetDescriptor, TargetId};

use cache::RefCache;
use controls::{Context, Controls, Refs};
use state::DriverState;

pub use dialog::DialogKind;
pub use save::{FileSaveResult, SaveError, SaveFailure};
pub use state::{DriverStatus, Phase};

/// Launch failures
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("A save is in progress")]
    Busy,

    #[error(transparent)]
    Launch(#[from] ProcessError),

    #[error("{path:?} is not {expected} (product: {product:?})")]
    NotTarget {
        path: PathBuf,
        expected: &'static str,
        product: Option<String>,
    },
}

struct Inner {
    state: DriverState,
    refs: RefCache<Refs>,
    api: ApiSlot,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State machine and actions for one target product
pub struct Driver {
    descriptor: &'static TargetDescriptor,
    platform: Platform,
    timing: TimingConfig,
    inner: Mutex<Inner>,
    update_lock: Mutex<()>,
    save_lock: Mutex<()>,
}

impl Driver {
    pub fn new(id: TargetId, platform: Platform, timing: TimingConfig) -> Self {
        Self::with_descriptor(id.descriptor(), platform, timing)
    }

    fn with_descriptor(descriptor: &'static TargetDescriptor, platform: Platform, timing: TimingConfig) -> Self {
        Driver {
            descriptor,
            platform,
            timing,
            inner: Mutex::new(Inner {
                state: DriverState::default(),
                refs: RefCache::default(),
                api: ApiSlot::default(),
            }),
            update_lock: Mutex::new(()),
            save_lock: Mutex::new(()),
        }
    }

    pub fn id(&self) -> TargetId {
        self.descriptor.id
    }

    pub fn descriptor(&self) -> &'static TargetDescriptor {
        self.descriptor
    }

    fn context(&self) -> Context<'_> {
        Context {
            platform: &self.platform,
            timing: &self.timing,
            descriptor: self.descriptor,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    pub fn status(&self) -> DriverStatus {
        self.inner().state.status()
    }

    pub fn is_running(&self) -> bool {
        self.status().is_running()
    }

    pub fn is_starting_up(&self) -> bool {
        self.status().is_starting_up()
    }

    pub fn is_playing(&self) -> bool {
        self.status().is_playing
    }

    pub fn is_saving(&self) -> bool {
        self.status().is_saving
    }

    pub fn is_dialog_showing(&self) -> bool {
        self.status().is_dialog_showing
    }

    pub fn window(&self) -> Option<WindowHandle> {
        self.status().window
    }

    /// Last known executable of the target
    pub fn executable_path(&self) -> Option<PathBuf> {
        self.inner().state.executable_path().map(Path::to_path_buf)
    }

    /// Reconcile with a process snapshot
    ///
    /// Skipped entirely while a save is in flight.
    pub fn update(&self, processes: &[ProcessInfo]) {
        let _save = match self.save_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                log::trace!("{}: save in flight, skipping update", self.descriptor.display_name);
                return;
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        let _update = lock(&self.update_lock);
        self.reconcile(processes);
    }

    fn reconcile(&self, processes: &[ProcessInfo]) {
        let d = self.descriptor;
        let mut candidates = processes.iter().filter(|p| d.matches_process(p)).peekable();
        let Some(&first) = candidates.peek() else {
            let mut inner = self.inner();
            if inner.state.phase() != Phase::Dead {
                log::info!("{} is no longer running", d.display_name);
            }
            inner.state.mark_dead();
            inner.refs.clear();
            return;
        };

        // A splash screen or a busy process means the target is still starting
        let ready = candidates.find_map(|p| {
            p.window()
                .filter(|_| p.is_input_idle && d.matches_main_title(&p.main_window_title))
                .map(|window| (p, window))
        });
        let Some((process, window)) = ready else {
            let mut inner = self.inner();
            if !inner.state.is_running() {
                if inner.state.phase() == Phase::Dead {
                    log::info!("{} is starting (pid {})", d.display_name, first.pid);
                }
                inner.state.mark_starting(first.pid, first.executable_path.clone());
                inner.refs.clear();
            }
            return;
        };

        let cx = self.context();
        let (cached, api) = {
            let mut inner = self.inner();
            if matches!(d.family, DriverFamily::Hybrid(_))
                && inner
                    .api
                    .refresh(&*self.platform.talk_api, process.executable_path.as_deref())
            {
                inner.refs.clear();
            }
            (inner.refs.get_for(window).cloned(), inner.api.api())
        };

        let refs = match cached {
            Some(refs) => refs,
            None => match Refs::resolve(&cx, window, api) {
                Some(refs) => {
                    let generation = self.inner().refs.replace(window, refs.clone());
                    log::info!(
                        "{} is running (pid {}, window {}, resolution #{})",
                        d.display_name,
                        process.pid,
                        window,
                        generation
                    );
                    refs
                }
                None => {
                    log::debug!("{}: controls not found under window {}", d.display_name, window);
                    let mut inner = self.inner();
                    inner.state.mark_dead();
                    inner.refs.clear();
                    return;
                }
            },
        };

        let c = refs.controls();
        let dialogs = c.dialogs(&cx);
        let save_dialog = dialogs.iter().any(|dialog| dialog.kind().is_save_related());
        let playing = c.is_playing(&cx);

        let mut inner = self.inner();
        inner
            .state
            .mark_running(process.pid, window, process.executable_path.clone());
        inner.state.observe(save_dialog, !dialogs.is_empty(), playing);
    }

    /// Resolved controls of a running target that is not saving
    fn live_refs(&self) -> Option<Refs> {
        let inner = self.inner();
        if !inner.state.is_running() || inner.state.is_saving() {
            return None;
        }
        inner.refs.get_for(inner.state.window()?).cloned()
    }

    /// Current talk text; None when not running or while saving
    pub fn talk_text(&self) -> Option<String> {
        let _update = lock(&self.update_lock);
        let refs = self.live_refs()?;
        refs.controls().read_text(&self.context())
    }

    /// Replace the talk text, stopping playback first
    pub fn set_talk_text(&self, text: &str) -> bool {
        let _update = lock(&self.update_lock);
        let Some(refs) = self.live_refs() else {
            return false;
        };
        let cx = self.context();
        let c = refs.controls();

        if !self.stop_playback(c, &cx) {
            return false;
        }
        if c.write_text(&cx, text) {
            return true;
        }
        if !self.descriptor.recovers_read_only_text {
            log::debug!("{}: talk text not writable", self.descriptor.display_name);
            return false;
        }

        // The text box turns read-only after some operations until playback
        // is cycled once
        log::debug!("{}: talk text not writable, cycling playback", self.descriptor.display_name);
        let policy = self.timing.action_wait();
        if c.press_play(&cx) {
            wait_until(|| c.is_playing(&cx) || !c.dialogs(&cx).is_empty(), policy);
        }
        if c.press_stop(&cx) {
            wait_until(|| !c.is_playing(&cx), policy);
        }
        self.inner().state.set_playing(false);
        c.write_text(&cx, text)
    }

    /// Start speaking the talk text
    pub fn play(&self) -> bool {
        let _update = lock(&self.update_lock);
        let Some(refs) = self.live_refs() else {
            return false;
        };
        {
            let inner = self.inner();
            if inner.state.is_playing() {
                return true;
            }
            if inner.state.is_dialog_showing() {
                return false;
            }
        }

        let cx = self.context();
        let c = refs.controls();
        if !self.descriptor.can_play_blank_text
            && c.read_text(&cx).is_none_or(|text| text.trim().is_empty())
        {
            log::debug!("{}: nothing to play", self.descriptor.display_name);
            return false;
        }
        if !c.press_play(&cx) {
            return false;
        }

        // Short texts can finish before a poll sees playback; only a dialog
        // counts as failure
        let (_, dialog) = retry_until(
            || (c.is_playing(&cx), !c.dialogs(&cx).is_empty()),
            |(playing, dialog)| *playing || *dialog,
            self.timing.action_wait(),
        );
        let mut inner = self.inner();
        if dialog {
            log::warn!("{}: dialog appeared on play", self.descriptor.display_name);
            inner.state.set_dialog_showing(true);
            return false;
        }
        inner.state.set_playing(true);
        true
    }

    /// Stop speaking; succeeds without touching the UI when not playing
    pub fn stop(&self) -> bool {
        let _update = lock(&self.update_lock);
        let Some(refs) = self.live_refs() else {
            return false;
        };
        self.stop_playback(refs.controls(), &self.context())
    }

    fn stop_playback(&self, c: &dyn Controls, cx: &Context) -> bool {
        if !self.inner().state.is_playing() {
            return true;
        }
        if !c.press_stop(cx) {
            return false;
        }
        let stopped = wait_until(|| !c.is_playing(cx), self.timing.action_wait());
        if stopped {
            self.inner().state.set_playing(false);
        } else {
            log::warn!("{}: playback did not stop", self.descriptor.display_name);
        }
        stopped
    }

    /// Save the talk text as a WAVE file at `path`
    pub fn save(&self, path: &Path) -> FileSaveResult {
        // Claiming the save under the state lock makes overlapping saves fail fast
        if let Err(error) = self.claim_save(path) {
            log::debug!("{}: save refused: {}", self.descriptor.display_name, error);
            return error.into();
        }

        let _save = lock(&self.save_lock);
        let cx = self.context();
        let refs = {
            let _update = lock(&self.update_lock);
            match self.check_save_text(&cx) {
                Ok(refs) => refs,
                Err(error) => {
                    self.inner().state.end_save();
                    return error.into();
                }
            }
        };

        log::info!("{}: saving to {:?}", self.descriptor.display_name, path);
        let c = refs.controls();
        let outcome = c.save(&cx, path);
        self.inner().state.end_save();

        if self.descriptor.reactivate_after_save {
            let _update = lock(&self.update_lock);
            c.after_save(&cx);
            self.inner().state.set_playing(false);
        }

        match outcome {
            Ok(Some(file)) => {
                log::info!("{}: saved {:?}", self.descriptor.display_name, file);
                FileSaveResult::success(file)
            }
            Ok(None) => {
                log::info!("{}: saved under a name chosen by the target", self.descriptor.display_name);
                FileSaveResult::auto_named()
            }
            Err(failure) => {
                log::warn!("{}: save failed: {}", self.descriptor.display_name, failure);
                failure.into()
            }
        }
    }

    fn claim_save(&self, path: &Path) -> Result<(), SaveError> {
        let mut inner = self.inner();
        let state = &mut inner.state;
        if !state.is_running() {
            return Err(SaveError::NotRunning);
        }
        if state.is_saving() || state.is_save_pending() {
            return Err(SaveError::AlreadySaving);
        }
        if state.is_dialog_showing() {
            return Err(SaveError::DialogShowing);
        }
        if !save::is_valid_destination(path) {
            return Err(SaveError::InvalidPath);
        }
        state.begin_save();
        Ok(())
    }

    fn check_save_text(&self, cx: &Context) -> Result<Refs, SaveError> {
        let refs = {
            let inner = self.inner();
            if !inner.state.is_running() {
                return Err(SaveError::NotRunning);
            }
            let window = inner.state.window().ok_or(SaveError::NotRunning)?;
            inner.refs.get_for(window).cloned().ok_or(SaveError::NotRunning)?
        };
        if !self.descriptor.can_save_blank_text
            && refs
                .controls()
                .read_text(cx)
                .is_none_or(|text| text.trim().is_empty())
        {
            return Err(SaveError::BlankText);
        }
        Ok(refs)
    }

    /// Character name: the live preset when readable, else the product's
    pub fn character_name(&self) -> String {
        if !self.descriptor.has_multiple_characters {
            return self.descriptor.fallback_character.to_string();
        }
        let _update = lock(&self.update_lock);
        self.live_refs()
            .and_then(|refs| refs.controls().character_name(&self.context()))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.descriptor.fallback_character.to_string())
    }

    /// Launch the target from `executable` unless it is already up
    ///
    /// The launched process must identify as this target; anything else
    /// is closed (or killed if it will not close) and reported.
    pub fn run(&self, executable: &Path) -> Result<(), RunError> {
        let _update = lock(&self.update_lock);
        {
            let inner = self.inner();
            if inner.state.is_saving() {
                return Err(RunError::Busy);
            }
            if inner.state.phase() != Phase::Dead {
                return Ok(());
            }
        }

        let processes = &self.platform.processes;
        let pid = processes.spawn(executable)?;
        log::info!("{}: launched {:?} (pid {})", self.descriptor.display_name, executable, pid);
        if !processes.wait_for_input_idle(pid, self.timing.input_idle_timeout()) {
            log::debug!("{}: pid {} not idle yet", self.descriptor.display_name, pid);
        }

        let product = processes.product_name(pid);
        if !product
            .as_deref()
            .is_some_and(|p| self.descriptor.matches_product(p))
        {
            log::warn!(
                "{}: {:?} launched {:?}, shutting it down",
                self.descriptor.display_name,
                executable,
                product
            );
            processes.close_main_window(pid);
            if !wait_until(|| processes.has_exited(pid), self.timing.exit_wait()) {
                processes.kill(pid);
            }
            return Err(RunError::NotTarget {
                path: executable.to_path_buf(),
                expected: self.descriptor.display_name,
                product,
            });
        }

        self.inner()
            .state
            .mark_starting(pid, Some(executable.to_path_buf()));
        Ok(())
    }

    /// Close the target; true once it is gone
    pub fn exit(&self) -> bool {
        let _update = lock(&self.update_lock);
        let pid = {
            let inner = self.inner();
            if inner.state.is_saving() {
                return false;
            }
            match inner.state.pid() {
                Some(pid) => pid,
                None => return true,
            }
        };

        let processes = &self.platform.processes;
        processes.close_main_window(pid);
        if !wait_until(|| processes.has_exited(pid), self.timing.exit_wait()) {
            log::warn!("{}: pid {} did not exit", self.descriptor.display_name, pid);
            return false;
        }

        log::info!("{} exited", self.descriptor.display_name);
        let mut inner = self.inner();
        inner.state.mark_dead();
        inner.refs.clear();
        true
    }
}
