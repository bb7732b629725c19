use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use talkctl::logging;
use talkctl::process::{ProcessSource, SystemProcesses};
use talkctl::storage::{Config, ConfigStorage, TomlConfigStorage, ensure_directories};
use talkctl::target::{DriverFamily, descriptors};

#[derive(Parser)]
#[command(name = "talkctl")]
#[command(about = "Remote control for desktop talk applications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported targets
    Targets,

    /// Show which supported targets have a process running
    Scan,

    /// Show the configuration file path and its effective contents
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (_data_dir, config_dir) = ensure_directories()?;
    let config_storage = TomlConfigStorage::new(config_dir.join("talkctl.toml"));
    let config = config_storage.load()?;
    logging::init(&config.logging)?;

    match cli.command {
        Some(Commands::Targets) | None => cmd_targets(),
        Some(Commands::Scan) => cmd_scan(),
        Some(Commands::Config) => cmd_config(&config_storage, &config),
    }
}

fn cmd_targets() -> Result<()> {
    println!("{:<12} {:<16} {:<18} {}", "ID", "NAME", "PROCESS", "SURFACE");
    for d in descriptors() {
        let surface = match d.family {
            DriverFamily::Legacy(_) => "window messages",
            DriverFamily::Tree(_) => "accessibility",
            DriverFamily::Hybrid(_) => "accessibility + API",
        };
        println!(
            "{:<12} {:<16} {:<18} {}",
            d.id.to_string(),
            d.display_name,
            d.process_name,
            surface
        );
    }
    Ok(())
}

fn cmd_scan() -> Result<()> {
    let processes = SystemProcesses.snapshot();
    let mut found = 0;
    for d in descriptors() {
        for p in processes.iter().filter(|p| p.name.eq_ignore_ascii_case(d.process_name)) {
            let verdict = if d.matches_process(p) {
                "match"
            } else {
                "product unknown"
            };
            println!("{:<16} pid {:<8} {:?} ({})", d.display_name, p.pid, p.executable_path, verdict);
            found += 1;
        }
    }
    if found == 0 {
        println!("No supported target is running.");
    }
    Ok(())
}

fn cmd_config(storage: &TomlConfigStorage, config: &Config) -> Result<()> {
    println!("# {}", storage.path().display());
    let contents = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    print!("{}", contents);
    Ok(())
}
