use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Poll intervals and wait budgets for UI transitions
///
/// Every wait is `loops` retries of `poll_interval_ms`, so the defaults
/// bound an action wait to one second and a dialog search to three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Sleep between polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wait for play/stop and dialog-close transitions
    #[serde(default = "default_action_wait_loops")]
    pub action_wait_loops: usize,

    /// Wait for a save dialog to appear
    #[serde(default = "default_dialog_wait_loops")]
    pub dialog_wait_loops: usize,

    /// Wait for the saved file or a progress window
    #[serde(default = "default_save_wait_loops")]
    pub save_wait_loops: usize,

    /// Wait for a progress window to close (long texts take a while)
    #[serde(default = "default_progress_wait_loops")]
    pub progress_wait_loops: usize,

    /// Timeout for raw control text reads and writes
    #[serde(default = "default_control_timeout_ms")]
    pub control_timeout_ms: u64,

    /// How long a freshly launched target may take to become idle
    #[serde(default = "default_input_idle_timeout_ms")]
    pub input_idle_timeout_ms: u64,

    /// Wait for a target to exit after its window is closed
    #[serde(default = "default_exit_wait_loops")]
    pub exit_wait_loops: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            poll_interval_ms: default_poll_interval_ms(),
            action_wait_loops: default_action_wait_loops(),
            dialog_wait_loops: default_dialog_wait_loops(),
            save_wait_loops: default_save_wait_loops(),
            progress_wait_loops: default_progress_wait_loops(),
            control_timeout_ms: default_control_timeout_ms(),
            input_idle_timeout_ms: default_input_idle_timeout_ms(),
            exit_wait_loops: default_exit_wait_loops(),
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn action_wait(&self) -> RetryPolicy {
        RetryPolicy::new(self.action_wait_loops, self.poll_interval())
    }

    pub fn dialog_wait(&self) -> RetryPolicy {
        RetryPolicy::new(self.dialog_wait_loops, self.poll_interval())
    }

    pub fn save_wait(&self) -> RetryPolicy {
        RetryPolicy::new(self.save_wait_loops, self.poll_interval())
    }

    pub fn progress_wait(&self) -> RetryPolicy {
        RetryPolicy::new(self.progress_wait_loops, self.poll_interval())
    }

    pub fn exit_wait(&self) -> RetryPolicy {
        RetryPolicy::new(self.exit_wait_loops, self.poll_interval())
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    pub fn input_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.input_idle_timeout_ms)
    }

    /// Millisecond polls with small budgets, for tests
    #[cfg(test)]
    pub(crate) fn fast() -> Self {
        TimingConfig {
            poll_interval_ms: 1,
            action_wait_loops: 20,
            dialog_wait_loops: 40,
            save_wait_loops: 60,
            progress_wait_loops: 60,
            control_timeout_ms: 10,
            input_idle_timeout_ms: 10,
            exit_wait_loops: 10,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Lowest level written
    #[serde(default = "default_level")]
    pub level: String,

    /// Log file path; logs go to stderr when unset
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Rotated daily log files kept
    #[serde(default = "default_keep_files")]
    pub keep_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            file: None,
            keep_files: default_keep_files(),
        }
    }
}

// Default value functions for serde
fn default_poll_interval_ms() -> u64 {
    25
}

fn default_action_wait_loops() -> usize {
    40
}

fn default_dialog_wait_loops() -> usize {
    120
}

fn default_save_wait_loops() -> usize {
    400
}

fn default_progress_wait_loops() -> usize {
    2400
}

fn default_control_timeout_ms() -> u64 {
    500
}

fn default_input_idle_timeout_ms() -> u64 {
    5000
}

fn default_exit_wait_loops() -> usize {
    200
}

fn default_level() -> String {
    "info".to_string()
}

fn default_keep_files() -> usize {
    3
}

/// Trait for configuration storage
pub trait ConfigStorage: Send + Sync {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        use anyhow::Context;
        use std::fs;

        // If file doesn't exist, create default and return it
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::info!("Loaded configuration from {:?}", self.path);
        log::debug!(
            "Config: poll_interval={}ms, dialog_wait_loops={}",
            config.timing.poll_interval_ms,
            config.timing.dialog_wait_loops
        );

        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        let toml_str =
            toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration")?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../talkctl.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_defaults() {
        let timing = TimingConfig::default();
        assert_eq!(timing.poll_interval_ms, 25);
        assert_eq!(timing.action_wait().max_wait(), Some(Duration::from_secs(1)));
        assert_eq!(timing.dialog_wait().max_wait(), Some(Duration::from_secs(3)));
        assert_eq!(timing.control_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let toml_str = r#"
        [timing]
        poll_interval_ms = 10

        [logging]
        level = "debug"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timing.poll_interval_ms, 10);
        assert_eq!(config.timing.action_wait_loops, 40);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.keep_files, 3);
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config: Config = toml::from_str(include_str!("../../talkctl.toml.example")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TomlConfigStorage::new(dir.path().join("nested").join("talkctl.toml"));

        let config = storage.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(storage.path().exists());

        let mut changed = config.clone();
        changed.timing.poll_interval_ms = 50;
        storage.save(&changed).unwrap();
        assert_eq!(storage.load().unwrap(), changed);
    }
}
