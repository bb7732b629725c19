use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::surface::WindowHandle;

/// One running process, as captured by the host for an update cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Executable name without extension
    pub name: String,
    /// Product name from the executable's version resource, when readable
    pub product_name: Option<String>,
    pub main_window: Option<WindowHandle>,
    pub main_window_title: String,
    pub executable_path: Option<PathBuf>,
    /// Whether the process has finished startup and is waiting for input
    pub is_input_idle: bool,
}

impl ProcessInfo {
    /// Main window handle, if one is assigned and non-null
    pub fn window(&self) -> Option<WindowHandle> {
        self.main_window.filter(|w| !w.is_null())
    }
}

/// Process errors
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to launch {path:?}: {reason}")]
    Launch { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Process lifecycle actions, provided by the host
pub trait ProcessControl: Send + Sync {
    /// Start an executable; returns its pid
    fn spawn(&self, path: &Path) -> Result<u32, ProcessError>;

    /// Block until the process is idle waiting for input (or the timeout)
    fn wait_for_input_idle(&self, pid: u32, timeout: Duration) -> bool;

    /// Product name of a running process's executable
    fn product_name(&self, pid: u32) -> Option<String>;

    /// Ask the process to close its main window
    fn close_main_window(&self, pid: u32) -> bool;

    /// Terminate the process
    fn kill(&self, pid: u32) -> bool;

    fn has_exited(&self, pid: u32) -> bool;
}

/// Process snapshot provider, used by hosts that poll on a timer
pub trait ProcessSource: Send + Sync {
    fn snapshot(&self) -> Vec<ProcessInfo>;
}

/// Snapshot of the local process table via `sysinfo`
///
/// `sysinfo` knows nothing of windows, so these entries carry no main
/// window and never satisfy a driver by themselves. Good enough to tell
/// which targets are installed and running.
pub struct SystemProcesses;

impl ProcessSource for SystemProcesses {
    fn snapshot(&self) -> Vec<ProcessInfo> {
        let system = sysinfo::System::new_all();
        let mut processes: Vec<ProcessInfo> = system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let name = process.name().to_string_lossy();
                let name = name
                    .strip_suffix(".exe")
                    .or_else(|| name.strip_suffix(".EXE"))
                    .unwrap_or(&name)
                    .to_string();
                ProcessInfo {
                    pid: pid.as_u32(),
                    name,
                    product_name: None,
                    main_window: None,
                    main_window_title: String::new(),
                    executable_path: process.exe().map(Path::to_path_buf),
                    is_input_idle: false,
                }
            })
            .collect();
        processes.sort_by_key(|p| p.pid);
        log::debug!("Captured {} processes", processes.len());
        processes
    }
}
