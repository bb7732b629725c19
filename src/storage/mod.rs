pub mod config;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

pub use config::{Config, ConfigStorage, LoggingConfig, TimingConfig, TomlConfigStorage};

/// Ensure the data and config directories exist
/// Returns (data_dir, config_dir)
///
/// Windows: %LOCALAPPDATA%\talkctl and %APPDATA%\talkctl
/// Elsewhere, XDG Base Directory Specification:
/// - Data: $XDG_DATA_HOME/talkctl (default: ~/.local/share/talkctl)
/// - Config: $XDG_CONFIG_HOME/talkctl (default: ~/.config/talkctl)
pub fn ensure_directories() -> Result<(PathBuf, PathBuf)> {
    let (data_dir, config_dir) = if cfg!(windows) {
        let roaming = env::var("APPDATA").context("APPDATA environment variable not set")?;
        let local = env::var("LOCALAPPDATA").unwrap_or_else(|_| roaming.clone());
        (
            PathBuf::from(local).join("talkctl"),
            PathBuf::from(roaming).join("talkctl"),
        )
    } else {
        let home = env::var("HOME").context("HOME environment variable not set")?;
        let home_path = PathBuf::from(home);

        let data_dir = if let Ok(xdg_data) = env::var("XDG_DATA_HOME") {
            PathBuf::from(xdg_data).join("talkctl")
        } else {
            home_path.join(".local/share/talkctl")
        };

        let config_dir = if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("talkctl")
        } else {
            home_path.join(".config/talkctl")
        };

        (data_dir, config_dir)
    };

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

    log::debug!("Data directory: {:?}", data_dir);
    log::debug!("Config directory: {:?}", config_dir);

    Ok((data_dir, config_dir))
}
