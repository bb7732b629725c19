use crate::process::ProcessInfo;
use crate::surface::{Condition, ControlType};

use super::TargetId;

/// How a control is located in the accessibility tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    AutomationId(&'static str),
    Name(&'static str),
}

impl Locator {
    pub fn condition(self, control_type: ControlType) -> Condition {
        let condition = Condition::new().control_type(control_type);
        match self {
            Locator::AutomationId(id) => condition.automation_id(id),
            Locator::Name(name) => condition.name(name),
        }
    }
}

/// Control locations for targets driven through the accessibility tree
#[derive(Debug)]
pub struct TreeLayout {
    pub text_box: Locator,
    pub play_button: Locator,
    pub stop_button: Locator,
    pub save_button: Locator,
    /// Voice preset list, for targets with several characters
    pub preset_list: Option<Locator>,
}

/// Control locations for targets driven through window messages
#[derive(Debug)]
pub struct LegacyLayout {
    /// Class-name fragment of the talk text control
    pub text_class: &'static str,
    /// Class-name fragment shared by the buttons
    pub button_class: &'static str,
    /// Button captions, compared after trimming
    pub play_caption: &'static str,
    pub stop_caption: &'static str,
    pub save_caption: &'static str,
}

/// Which driver implementation serves a target
#[derive(Debug, Clone, Copy)]
pub enum DriverFamily {
    /// Raw window messages only
    Legacy(&'static LegacyLayout),
    /// Accessibility tree only
    Tree(&'static TreeLayout),
    /// Accessibility tree, with the target's own API when it loads
    Hybrid(&'static TreeLayout),
}

/// Static facts about one target product
#[derive(Debug)]
pub struct TargetDescriptor {
    pub id: TargetId,
    pub display_name: &'static str,
    /// Executable name without extension
    pub process_name: &'static str,
    /// Fragment of the executable's product name
    pub product_name: &'static str,
    /// Main-window title must contain one of these
    pub title_includes: &'static [&'static str],
    /// ... and none of these (splash and loading windows)
    pub title_excludes: &'static [&'static str],
    pub can_save_blank_text: bool,
    pub can_play_blank_text: bool,
    pub has_multiple_characters: bool,
    /// Character name reported when none can be read live
    pub fallback_character: &'static str,
    pub family: DriverFamily,
    /// Text control can turn read-only until playback is cycled
    pub recovers_read_only_text: bool,
    /// Controls stay disabled after a save until the window is re-activated
    pub reactivate_after_save: bool,
    /// Save may answer with a yes/no confirmation and pick the file name
    /// itself
    pub auto_names_on_confirm: bool,
}

impl TargetDescriptor {
    /// Whether `process` is an instance of this target
    ///
    /// Several targets share one executable name and differ only by product
    /// name; for those an unreadable product name never matches.
    pub fn matches_process(&self, process: &ProcessInfo) -> bool {
        if !process.name.eq_ignore_ascii_case(self.process_name) {
            return false;
        }
        match process.product_name.as_deref() {
            Some(product) => self.matches_product(product),
            None => !self.shares_process_name(),
        }
    }

    pub fn matches_product(&self, product: &str) -> bool {
        product.contains(self.product_name)
    }

    /// Whether `title` belongs to the main window rather than a splash
    pub fn matches_main_title(&self, title: &str) -> bool {
        self.title_includes.iter().any(|s| title.contains(s))
            && !self.title_excludes.iter().any(|s| title.contains(s))
    }

    fn shares_process_name(&self) -> bool {
        DESCRIPTORS
            .iter()
            .any(|d| d.id != self.id && d.process_name.eq_ignore_ascii_case(self.process_name))
    }
}

const LEGACY_LAYOUT: LegacyLayout = LegacyLayout {
    text_class: "RichEdit20W",
    button_class: "BUTTON",
    play_caption: "再生",
    stop_caption: "停止",
    save_caption: "音声保存",
};

const EDITOR_LAYOUT: TreeLayout = TreeLayout {
    text_box: Locator::AutomationId("TextBox"),
    play_button: Locator::Name("再生"),
    stop_button: Locator::Name("停止"),
    save_button: Locator::Name("音声保存"),
    preset_list: Some(Locator::AutomationId("VoicePresetList")),
};

const AIVOICE_LAYOUT: TreeLayout = TreeLayout {
    text_box: Locator::AutomationId("TextEditTextBox"),
    play_button: Locator::AutomationId("PlayButton"),
    stop_button: Locator::AutomationId("StopButton"),
    save_button: Locator::AutomationId("SaveWaveButton"),
    preset_list: Some(Locator::AutomationId("VoicePresetListBox")),
};

const CEVIO_LAYOUT: TreeLayout = TreeLayout {
    text_box: Locator::AutomationId("TalkTextBox"),
    play_button: Locator::Name("再生"),
    stop_button: Locator::Name("停止"),
    save_button: Locator::Name("WAV書き出し"),
    preset_list: Some(Locator::AutomationId("CastList")),
};

const fn legacy(
    id: TargetId,
    display_name: &'static str,
    product_name: &'static str,
    character: &'static str,
) -> TargetDescriptor {
    TargetDescriptor {
        id,
        display_name,
        process_name: "VOICEROID",
        product_name,
        title_includes: &["VOICEROID"],
        title_excludes: &[],
        can_save_blank_text: false,
        can_play_blank_text: false,
        has_multiple_characters: false,
        fallback_character: character,
        family: DriverFamily::Legacy(&LEGACY_LAYOUT),
        recovers_read_only_text: false,
        reactivate_after_save: true,
        auto_names_on_confirm: false,
    }
}

static DESCRIPTORS: [TargetDescriptor; 9] = [
    legacy(TargetId::YukariEx, "結月ゆかり EX", "結月ゆかり EX", "結月ゆかり"),
    legacy(TargetId::MakiEx, "弦巻マキ EX", "弦巻マキ EX", "弦巻マキ"),
    legacy(TargetId::ZunkoEx, "東北ずん子 EX", "東北ずん子 EX", "東北ずん子"),
    legacy(TargetId::TomoeEx, "民安ともえ EX", "民安ともえ EX", "民安ともえ"),
    legacy(TargetId::SeikaEx, "京町セイカ EX", "京町セイカ EX", "京町セイカ"),
    TargetDescriptor {
        id: TargetId::Voiceroid2,
        display_name: "VOICEROID2",
        process_name: "VoiceroidEditor",
        product_name: "VOICEROID2",
        title_includes: &["VOICEROID2"],
        title_excludes: &["起動中"],
        can_save_blank_text: false,
        can_play_blank_text: false,
        has_multiple_characters: true,
        fallback_character: "VOICEROID2",
        family: DriverFamily::Tree(&EDITOR_LAYOUT),
        recovers_read_only_text: true,
        reactivate_after_save: false,
        auto_names_on_confirm: false,
    },
    TargetDescriptor {
        id: TargetId::GynoidTalk,
        display_name: "ガイノイドTalk",
        process_name: "GynoidTalkEditor",
        product_name: "ガイノイドTalk",
        title_includes: &["ガイノイドTalk"],
        title_excludes: &["起動中"],
        can_save_blank_text: false,
        can_play_blank_text: false,
        has_multiple_characters: true,
        fallback_character: "ガイノイドTalk",
        family: DriverFamily::Tree(&EDITOR_LAYOUT),
        recovers_read_only_text: true,
        reactivate_after_save: false,
        auto_names_on_confirm: true,
    },
    TargetDescriptor {
        id: TargetId::AiVoice,
        display_name: "A.I.VOICE",
        process_name: "AIVoiceEditor",
        product_name: "A.I.VOICE",
        title_includes: &["A.I.VOICE"],
        title_excludes: &["起動"],
        can_save_blank_text: false,
        can_play_blank_text: false,
        has_multiple_characters: true,
        fallback_character: "A.I.VOICE",
        family: DriverFamily::Tree(&AIVOICE_LAYOUT),
        recovers_read_only_text: false,
        reactivate_after_save: false,
        auto_names_on_confirm: false,
    },
    TargetDescriptor {
        id: TargetId::Cevio,
        display_name: "CeVIO AI",
        process_name: "CeVIO AI",
        product_name: "CeVIO AI",
        title_includes: &["CeVIO AI"],
        title_excludes: &[],
        can_save_blank_text: false,
        can_play_blank_text: false,
        has_multiple_characters: true,
        fallback_character: "CeVIO AI",
        family: DriverFamily::Hybrid(&CEVIO_LAYOUT),
        recovers_read_only_text: false,
        reactivate_after_save: false,
        auto_names_on_confirm: false,
    },
];

/// Descriptor for `id`
pub fn descriptor(id: TargetId) -> &'static TargetDescriptor {
    // Table order follows TargetId::ALL
    &DESCRIPTORS[id as usize]
}

/// Every descriptor, in display order
pub fn descriptors() -> &'static [TargetDescriptor] {
    &DESCRIPTORS
}
