//! Log output
//!
//! The registry updates each target on its own named thread, so every line
//! carries the thread name next to the module path. Lines go to a daily
//! rotated file when one is configured, to stderr otherwise.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::storage::LoggingConfig;

/// Logger writing to a rotating file
struct FileLogger {
    writer: Mutex<RollingFileAppender>,
    level: LevelFilter,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(
            &Local::now(),
            record.level(),
            thread::current().name(),
            record.target(),
            &record.args().to_string(),
        );
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

/// One log line, shared by the file and stderr outputs
fn format_line(timestamp: &DateTime<Local>, level: Level, thread: Option<&str>, target: &str, message: &str) -> String {
    format!(
        "{} {:<5} [{}] {}: {}",
        timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        level,
        thread.unwrap_or("-"),
        target,
        message
    )
}

/// Parse log level string to LevelFilter
pub fn parse_level(level_str: &str) -> LevelFilter {
    match level_str.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Install the global logger described by `config`
///
/// Without a log file, `RUST_LOG` overrides the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    match &config.file {
        Some(path) => init_file_logger(path, parse_level(&config.level), config.keep_files),
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.level))
                .format(|buf, record| {
                    writeln!(
                        buf,
                        "{}",
                        format_line(
                            &Local::now(),
                            record.level(),
                            thread::current().name(),
                            record.target(),
                            &record.args().to_string(),
                        )
                    )
                })
                .try_init()
                .context("Failed to set global logger")
        }
    }
}

fn init_file_logger(path: &Path, level: LevelFilter, keep_files: usize) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid log file path {:?}", path))?;
    fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {:?}", dir))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(keep_files.max(1))
        .filename_prefix(path.file_stem().and_then(|s| s.to_str()).unwrap_or("talkctl"))
        .filename_suffix(path.extension().and_then(|s| s.to_str()).unwrap_or("log"))
        .build(dir)
        .context("Failed to create rotating file appender")?;

    let logger = FileLogger {
        writer: Mutex::new(appender),
        level,
    };
    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(level);
    Ok(())
}
