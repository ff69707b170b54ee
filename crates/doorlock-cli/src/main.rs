//! `doorlock`: run one door from the terminal or a Raspberry Pi.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doorlock_core::constants::DEFAULT_STORAGE_CAPACITY;
use doorlock_storage::{FileStorage, PersistedSecurityState, SecurityStateStore};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;
mod run;

use config::DoorConfig;

/// Door lock access-control core
#[derive(Parser, Debug)]
#[command(name = "doorlock", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Override the storage image path
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Override the wrong attempts before lockout
    #[arg(long)]
    max_wrong_attempts: Option<u8>,

    /// Override the lockout duration in seconds
    #[arg(long)]
    lockout_seconds: Option<u8>,

    /// Authorize a tag in addition to the configured list (repeatable)
    #[arg(long = "allow", value_name = "HEX")]
    allow: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the control loop (default)
    Run,

    /// Print the persisted security state as JSON and exit
    Status,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    storage: PathBuf,
    #[serde(flatten)]
    record: PersistedSecurityState,
    locked_out: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries tag input echo and status JSON
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<DoorConfig> {
    let mut config = match &cli.config {
        Some(path) => DoorConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => DoorConfig::default(),
    };

    if let Some(storage) = &cli.storage {
        config.storage_path = storage.clone();
    }
    if let Some(attempts) = cli.max_wrong_attempts {
        config.max_wrong_attempts = attempts;
    }
    if let Some(seconds) = cli.lockout_seconds {
        config.lockout_seconds = seconds;
    }
    config.authorized_tags.extend(cli.allow.iter().cloned());

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn status(config: &DoorConfig) -> Result<()> {
    let storage = FileStorage::open(&config.storage_path, DEFAULT_STORAGE_CAPACITY)
        .with_context(|| format!("failed to open {}", config.storage_path.display()))?;
    let mut store = SecurityStateStore::with_limits(storage, config.policy()?.limits());
    let record = store.load().context("failed to read security record")?;

    let report = StatusReport {
        storage: config.storage_path.clone(),
        locked_out: record.is_locked_out(),
        record,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run::run(config).await,
        Command::Status => status(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "doorlock",
            "--lockout-seconds",
            "90",
            "--allow",
            "04:AB:10:9F",
            "--storage",
            "door.img",
            "status",
        ]);
        let config = load_config(&cli).unwrap();

        assert_eq!(config.lockout_seconds, 90);
        assert_eq!(config.authorized_tags, vec!["04:AB:10:9F".to_string()]);
        assert_eq!(config.storage_path, PathBuf::from("door.img"));
        assert!(matches!(cli.command, Some(Command::Status)));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::parse_from(["doorlock", "--max-wrong-attempts", "0"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_status_repairs_erased_image() {
        let dir = tempfile::tempdir().unwrap();
        let config = DoorConfig {
            storage_path: dir.path().join("door.img"),
            ..DoorConfig::default()
        };

        status(&config).unwrap();
        let image = std::fs::read(&config.storage_path).unwrap();
        assert_eq!(&image[..5], &[0xA5, 0, 0, 0, 0xA5]);
    }
}
