use std::sync::Arc;

use crate::process::ProcessControl;
use crate::surface::{Accessibility, WindowMessaging};
use crate::talk_api::{NoTalkApi, TalkApiLoader};

/// OS services the drivers consume, injected by the host
///
/// Cloning is cheap; every driver holds its own copy.
#[derive(Clone)]
pub struct Platform {
    pub accessibility: Arc<dyn Accessibility>,
    pub messaging: Arc<dyn WindowMessaging>,
    pub processes: Arc<dyn ProcessControl>,
    pub talk_api: Arc<dyn TalkApiLoader>,
}

impl Platform {
    /// Create a platform with no talk API support
    pub fn new(
        accessibility: Arc<dyn Accessibility>,
        messaging: Arc<dyn WindowMessaging>,
        processes: Arc<dyn ProcessControl>,
    ) -> Self {
        Platform {
            accessibility,
            messaging,
            processes,
            talk_api: Arc::new(NoTalkApi),
        }
    }

    /// Use `loader` to discover targets' automation APIs
    pub fn with_talk_api(mut self, loader: Arc<dyn TalkApiLoader>) -> Self {
        self.talk_api = loader;
        self
    }
}
