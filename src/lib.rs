//! talkctl - remote control for desktop speech-synthesis applications
//!
//! Drives closed-source talk applications through their accessibility tree
//! or raw window messages: read and write the talk text, play and stop,
//! and save speech to WAVE files through the target's own save dialogs.

pub mod driver;
pub mod logging;
pub mod platform;
pub mod process;
pub mod registry;
pub mod retry;
pub mod storage;
pub mod surface;
pub mod talk_api;
pub mod target;

pub use driver::{Driver, DriverStatus, FileSaveResult, RunError, SaveError};
pub use platform::Platform;
pub use registry::Registry;
pub use target::TargetId;
