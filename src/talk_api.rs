//! Optional automation API shipped with some targets
//!
//! The API is installed alongside the target and discovered at runtime, so
//! it may be missing, or may belong to a different install than the running
//! process. [`ApiSlot`] tracks which executable the loaded API belongs to
//! and treats "unavailable" as an ordinary state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Talk operations exposed by a target's own automation API
pub trait TalkApi: Send + Sync {
    /// Whether the API is connected to the running host
    fn is_connected(&self) -> bool;

    /// Name of the currently selected voice
    fn cast(&self) -> Option<String>;

    /// Start speaking `text`
    fn speak(&self, text: &str) -> bool;

    fn is_speaking(&self) -> bool;

    fn stop(&self) -> bool;

    /// Synthesize `text` straight into a WAVE file
    fn output_wave_to_file(&self, text: &str, path: &Path) -> bool;
}

/// Locates and loads the API for a given target install
pub trait TalkApiLoader: Send + Sync {
    /// Load the API matching `executable`, or None when it is not installed
    fn load(&self, executable: &Path) -> Option<Arc<dyn TalkApi>>;
}

/// Loader for hosts that ship without API support
pub struct NoTalkApi;

impl TalkApiLoader for NoTalkApi {
    fn load(&self, _executable: &Path) -> Option<Arc<dyn TalkApi>> {
        None
    }
}

/// API load state, keyed by the executable it was loaded for
#[derive(Clone, Default)]
pub(crate) enum ApiSlot {
    #[default]
    Unloaded,
    Unavailable {
        executable: PathBuf,
    },
    Loaded {
        executable: PathBuf,
        api: Arc<dyn TalkApi>,
    },
}

impl ApiSlot {
    fn executable(&self) -> Option<&Path> {
        match self {
            ApiSlot::Unloaded => None,
            ApiSlot::Unavailable { executable } | ApiSlot::Loaded { executable, .. } => Some(executable),
        }
    }

    /// Reload when the target's executable differs from the one loaded for
    ///
    /// Returns true when the slot changed.
    pub fn refresh(&mut self, loader: &dyn TalkApiLoader, executable: Option<&Path>) -> bool {
        let Some(executable) = executable else {
            return false;
        };
        if self.executable() == Some(executable) {
            return false;
        }

        *self = match loader.load(executable) {
            Some(api) => {
                log::info!("Loaded talk API for {:?}", executable);
                ApiSlot::Loaded {
                    executable: executable.to_path_buf(),
                    api,
                }
            }
            None => {
                log::debug!("No talk API available for {:?}", executable);
                ApiSlot::Unavailable {
                    executable: executable.to_path_buf(),
                }
            }
        };
        true
    }

    /// Loaded API, if any
    pub fn api(&self) -> Option<Arc<dyn TalkApi>> {
        match self {
            ApiSlot::Loaded { api, .. } => Some(Arc::clone(api)),
            _ => None,
        }
    }
}
