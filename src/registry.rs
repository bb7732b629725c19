//! One driver per supported target, updated together

use std::thread;

use crate::driver::Driver;
use crate::platform::Platform;
use crate::process::{ProcessInfo, ProcessSource};
use crate::storage::TimingConfig;
use crate::target::TargetId;

/// Every known target's driver, in [`TargetId::ALL`] order
///
/// Drivers exist for the registry's whole life whether or not their target
/// is running.
pub struct Registry {
    drivers: Vec<Driver>,
}

impl Registry {
    pub fn new(platform: Platform, timing: TimingConfig) -> Self {
        let drivers = TargetId::all()
            .map(|id| Driver::new(id, platform.clone(), timing.clone()))
            .collect();
        Registry { drivers }
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn get(&self, id: TargetId) -> &Driver {
        &self.drivers[id as usize]
    }

    /// Drivers whose target is up and ready
    pub fn running(&self) -> impl Iterator<Item = &Driver> {
        self.drivers.iter().filter(|d| d.is_running())
    }

    /// Run one update cycle against `processes`
    ///
    /// Drivers update in parallel; a driver busy saving skips the cycle
    /// without holding up the others.
    pub fn update(&self, processes: &[ProcessInfo]) {
        thread::scope(|s| {
            for driver in &self.drivers {
                let spawned = thread::Builder::new()
                    .name(format!("update-{}", driver.id()))
                    .spawn_scoped(s, move || driver.update(processes));
                if let Err(e) = spawned {
                    log::warn!("Could not spawn update thread for {}: {}", driver.id(), e);
                    driver.update(processes);
                }
            }
        });
        log::trace!("Update cycle done, {} running", self.running().count());
    }

    /// Take a snapshot from `source` and update every driver with it
    pub fn poll(&self, source: &dyn ProcessSource) {
        let processes = source.snapshot();
        self.update(&processes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ControlType;
    use crate::surface::fake::FakeDesktop;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Snapshot(Vec<ProcessInfo>);

    impl ProcessSource for Snapshot {
        fn snapshot(&self) -> Vec<ProcessInfo> {
            self.0.clone()
        }
    }

    fn registry(desktop: &Arc<FakeDesktop>) -> Registry {
        let platform = Platform::new(desktop.clone(), desktop.clone(), desktop.clone());
        Registry::new(platform, TimingConfig::fast())
    }

    fn aivoice(desktop: &FakeDesktop) -> ProcessInfo {
        let window = desktop.add_window("A.I.VOICE Editor", "Window");
        desktop.add_child(window, ControlType::Edit, "TextEditTextBox", "", "Edit");
        for id in ["PlayButton", "StopButton", "SaveWaveButton"] {
            desktop.add_child(window, ControlType::Button, id, "", "Button");
        }
        ProcessInfo {
            pid: 7,
            name: "AIVoiceEditor".to_string(),
            product_name: Some("A.I.VOICE Editor".to_string()),
            main_window: Some(window),
            main_window_title: "A.I.VOICE Editor".to_string(),
            executable_path: Some(PathBuf::from("/opt/aivoice/AIVoiceEditor.exe")),
            is_input_idle: true,
        }
    }

    #[test]
    fn test_one_driver_per_target() {
        let desktop = FakeDesktop::new();
        let registry = registry(&desktop);

        assert_eq!(registry.drivers().len(), TargetId::ALL.len());
        for id in TargetId::all() {
            assert_eq!(registry.get(id).id(), id);
        }
        assert_eq!(registry.running().count(), 0);
    }

    #[test]
    fn test_update_reaches_matching_driver_only() {
        let desktop = FakeDesktop::new();
        let registry = registry(&desktop);
        let mut stray = aivoice(&desktop);
        stray.pid = 8;
        stray.name = "notepad".to_string();

        registry.poll(&Snapshot(vec![stray, aivoice(&desktop)]));

        let running: Vec<TargetId> = registry.running().map(Driver::id).collect();
        assert_eq!(running, vec![TargetId::AiVoice]);
        assert!(!registry.get(TargetId::Voiceroid2).is_starting_up());

        registry.update(&[]);
        assert_eq!(registry.running().count(), 0);
    }
}
