use std::fmt;

use super::descriptor::{TargetDescriptor, descriptor};

/// Supported target products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetId {
    YukariEx,
    MakiEx,
    ZunkoEx,
    TomoeEx,
    SeikaEx,
    Voiceroid2,
    GynoidTalk,
    AiVoice,
    Cevio,
}

impl TargetId {
    /// Every supported target, in display order
    pub const ALL: [TargetId; 9] = [
        TargetId::YukariEx,
        TargetId::MakiEx,
        TargetId::ZunkoEx,
        TargetId::TomoeEx,
        TargetId::SeikaEx,
        TargetId::Voiceroid2,
        TargetId::GynoidTalk,
        TargetId::AiVoice,
        TargetId::Cevio,
    ];

    pub fn all() -> impl Iterator<Item = TargetId> {
        Self::ALL.into_iter()
    }

    /// Static description of this target
    pub fn descriptor(self) -> &'static TargetDescriptor {
        descriptor(self)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().display_name)
    }
}
