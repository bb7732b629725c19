use std::path::{Path, PathBuf};

use crate::surface::WindowHandle;

/// Lifecycle phase of a target as seen by its driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No matching process
    #[default]
    Dead,
    /// Process found, main window not usable yet
    Starting,
    /// Main window found and controls resolved
    Running,
}

/// Point-in-time copy of a driver's observable state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStatus {
    pub phase: Phase,
    pub window: Option<WindowHandle>,
    pub is_playing: bool,
    pub is_saving: bool,
    pub is_dialog_showing: bool,
}

impl DriverStatus {
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_starting_up(&self) -> bool {
        self.phase == Phase::Starting
    }
}

/// Mutable driver state
///
/// Transitions go through the methods below so that playing and saving are
/// never both set, and a dead driver carries no flags.
#[derive(Debug, Clone, Default)]
pub(crate) struct DriverState {
    phase: Phase,
    pid: Option<u32>,
    window: Option<WindowHandle>,
    executable_path: Option<PathBuf>,
    playing: bool,
    saving: bool,
    dialog_showing: bool,
    /// Set by a save invocation until it returns
    save_pending: bool,
}

impl DriverState {
    pub fn status(&self) -> DriverStatus {
        DriverStatus {
            phase: self.phase,
            window: self.window,
            is_playing: self.playing,
            is_saving: self.saving,
            is_dialog_showing: self.dialog_showing,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn window(&self) -> Option<WindowHandle> {
        self.window
    }

    pub fn executable_path(&self) -> Option<&Path> {
        self.executable_path.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_dialog_showing(&self) -> bool {
        self.dialog_showing
    }

    pub fn is_save_pending(&self) -> bool {
        self.save_pending
    }

    /// Target gone: forget everything but the last executable path and a
    /// claimed save, which its owner releases
    pub fn mark_dead(&mut self) {
        let executable_path = self.executable_path.take();
        *self = DriverState {
            executable_path,
            save_pending: self.save_pending,
            ..DriverState::default()
        };
    }

    /// Process present but not ready for input
    pub fn mark_starting(&mut self, pid: u32, executable_path: Option<PathBuf>) {
        self.mark_dead();
        self.phase = Phase::Starting;
        self.pid = Some(pid);
        if executable_path.is_some() {
            self.executable_path = executable_path;
        }
    }

    /// Main window usable
    pub fn mark_running(&mut self, pid: u32, window: WindowHandle, executable_path: Option<PathBuf>) {
        if self.window != Some(window) {
            self.playing = false;
            self.dialog_showing = false;
        }
        self.phase = Phase::Running;
        self.pid = Some(pid);
        self.window = Some(window);
        if executable_path.is_some() {
            self.executable_path = executable_path;
        }
    }

    /// Apply one observation of the target's sub-state
    ///
    /// Saving wins over playing, and playing is not reported while a dialog
    /// is up since the proxy signal is meaningless then.
    pub fn observe(&mut self, save_dialog: bool, dialog_showing: bool, playing_signal: bool) {
        if !self.is_running() {
            return;
        }
        self.saving = self.save_pending || save_dialog;
        self.dialog_showing = dialog_showing;
        self.playing = !self.saving && !dialog_showing && playing_signal;
    }

    /// Confirm or clear playback after a play/stop action
    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing && self.is_running() && !self.saving && !self.dialog_showing;
    }

    pub fn set_dialog_showing(&mut self, showing: bool) {
        self.dialog_showing = showing && self.is_running();
        if self.dialog_showing {
            self.playing = false;
        }
    }

    /// Enter the saving sub-state ahead of any UI action
    pub fn begin_save(&mut self) {
        self.save_pending = true;
        self.saving = true;
        self.playing = false;
    }

    pub fn end_save(&mut self) {
        self.save_pending = false;
        self.saving = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> DriverState {
        let mut state = DriverState::default();
        state.mark_running(10, WindowHandle(0x100), Some(PathBuf::from("target.exe")));
        state
    }

    #[test]
    fn test_default_is_dead_and_clear() {
        let status = DriverState::default().status();
        assert_eq!(status, DriverStatus::default());
        assert!(!status.is_running());
        assert!(!status.is_starting_up());
    }

    #[test]
    fn test_mark_dead_clears_flags_keeps_executable() {
        let mut state = running();
        state.observe(false, false, true);
        assert!(state.is_playing());

        state.mark_dead();
        assert_eq!(state.status(), DriverStatus::default());
        assert_eq!(state.pid(), None);
        assert_eq!(state.executable_path(), Some(Path::new("target.exe")));
    }

    #[test]
    fn test_claimed_save_survives_restart() {
        let mut state = running();
        state.begin_save();
        state.mark_dead();
        assert!(!state.status().is_saving);
        assert!(state.is_save_pending());

        state.mark_running(11, WindowHandle(0x300), None);
        state.observe(false, false, true);
        assert!(state.is_saving());
        assert!(!state.is_playing());

        state.end_save();
        assert!(!state.is_save_pending());
    }

    #[test]
    fn test_saving_suppresses_playing() {
        let mut state = running();
        state.observe(false, false, true);
        assert!(state.is_playing());

        state.begin_save();
        assert!(state.is_saving());
        assert!(!state.is_playing());

        // Save button disabled during a save must not read as playback
        state.observe(false, true, true);
        assert!(state.is_saving());
        assert!(!state.is_playing());

        state.set_playing(true);
        assert!(!state.is_playing());

        state.end_save();
        state.observe(false, false, false);
        assert!(!state.is_saving());
    }

    #[test]
    fn test_dialog_suppresses_playing() {
        let mut state = running();
        state.observe(false, true, true);
        assert!(state.is_dialog_showing());
        assert!(!state.is_playing());

        state.observe(false, false, true);
        state.set_dialog_showing(true);
        assert!(!state.is_playing());
    }

    #[test]
    fn test_save_dialog_reads_as_saving() {
        let mut state = running();
        state.observe(true, true, true);
        assert!(state.is_saving());
        assert!(!state.is_playing());
    }

    #[test]
    fn test_flags_ignored_unless_running() {
        let mut state = DriverState::default();
        state.observe(true, true, true);
        state.set_playing(true);
        state.set_dialog_showing(true);
        assert_eq!(state.status(), DriverStatus::default());

        state.mark_starting(5, None);
        assert!(state.status().is_starting_up());
        state.set_playing(true);
        assert!(!state.is_playing());
    }

    #[test]
    fn test_window_change_resets_observations() {
        let mut state = running();
        state.observe(false, false, true);
        state.mark_running(10, WindowHandle(0x200), None);
        assert!(!state.is_playing());
        assert_eq!(state.window(), Some(WindowHandle(0x200)));
        assert_eq!(state.executable_path(), Some(Path::new("target.exe")));
    }
}
