//! Command handling for the `sypher` CLI.
//!
//! The binary parses arguments and installs logging; everything that
//! touches licenses goes through [`execute`], which returns the text to
//! print so it can be tested without a terminal.

pub mod config;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use config::CliConfig;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use sypher_license::{generate_license_key, DeviceIdentity, LicenseManager};
use sypher_storage::{FileDeviceStorage, RecordStore, SqliteRecordStore};
use sypher_types::{LicenseKey, LicenseRecord, LicenseStatus};
use tracing::info;

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print new random license keys without storing them
    Generate {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Generate unused keys and store them as inactive licenses
    Issue {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Store a license for the given key (no-op if it exists)
    Create { key: String },
    /// Activate a license on this device
    Activate { key: String },
    /// Release the license active on this device
    Deactivate,
    /// Show whether this device is licensed
    Status,
    /// Show a single license
    Show { key: String },
    /// List stored licenses
    List {
        /// Only list licenses with this status
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Set the status of a license ("inactive" also releases its device)
    SetStatus { key: String, status: String },
    /// Delete a license
    Delete { key: String },
    /// Export all licenses as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all licenses with the contents of an export file
    Import { file: PathBuf },
    /// Delete all licenses
    Clear {
        /// Confirm deleting every license
        #[arg(long)]
        yes: bool,
    },
    /// Print this device's id
    DeviceId,
}

/// Opens the license database and device state described by `config`.
pub fn open_manager(config: &CliConfig) -> Result<LicenseManager> {
    let device_storage = FileDeviceStorage::open(config.device_state_path()).with_context(|| {
        format!(
            "Failed to open device state {}",
            config.device_state_path().display()
        )
    })?;
    let store = SqliteRecordStore::new(config.database_path());
    info!(database = %config.database_path().display(), "using license database");
    Ok(LicenseManager::new(
        Arc::new(store),
        DeviceIdentity::from_environment(Arc::new(device_storage)),
    ))
}

/// Runs `command` and returns the output to print.
pub async fn execute(manager: &LicenseManager, command: Command) -> Result<String> {
    let mut out = String::new();
    match command {
        Command::Generate { count } => {
            for _ in 0..count {
                writeln!(out, "{}", generate_license_key())?;
            }
        }
        Command::Issue { count } => {
            for _ in 0..count {
                let record = manager.issue_license().await?;
                writeln!(out, "{}", record.key)?;
            }
        }
        Command::Create { key } => {
            let record = manager.create_license(parse_key(&key)?).await?;
            writeln!(out, "{}", describe(&record))?;
        }
        Command::Activate { key } => {
            let outcome = manager.activate(&parse_key(&key)?).await?;
            writeln!(out, "{}", outcome.message())?;
            writeln!(out, "{}", describe(outcome.license()))?;
        }
        Command::Deactivate => {
            let outcome = manager.deactivate().await?;
            writeln!(out, "{}", outcome.message())?;
            if let Some(record) = outcome.license() {
                writeln!(out, "{}", describe(record))?;
            }
        }
        Command::Status => {
            let device = manager.current_device_id()?;
            match manager.get_device_license().await? {
                Some(record) => {
                    writeln!(out, "Device {device} is licensed")?;
                    writeln!(out, "{}", describe(&record))?;
                }
                None => writeln!(out, "Device {device} is not licensed")?,
            }
        }
        Command::Show { key } => {
            let key = parse_key(&key)?;
            let Some(record) = manager.get_license(&key).await? else {
                bail!("License not found: {key}");
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
        }
        Command::List { status } => {
            let records = match status {
                Some(status) => {
                    manager
                        .store()
                        .get_by_status(&LicenseStatus::from(status))
                        .await?
                }
                None => manager.get_all_licenses().await?,
            };
            for record in &records {
                writeln!(out, "{}", describe(record))?;
            }
            writeln!(out, "{} license(s)", records.len())?;
        }
        Command::SetStatus { key, status } => {
            let record = manager
                .update_status(&parse_key(&key)?, LicenseStatus::from(status))
                .await?;
            writeln!(out, "{}", describe(&record))?;
        }
        Command::Delete { key } => {
            let key = parse_key(&key)?;
            manager.delete_license(&key).await?;
            writeln!(out, "Deleted {key}")?;
        }
        Command::Export { output } => {
            let document = manager.export_all().await?;
            let json = serde_json::to_string_pretty(&document)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    writeln!(
                        out,
                        "Exported {} license(s) to {}",
                        document.licenses.len(),
                        path.display()
                    )?;
                }
                None => writeln!(out, "{json}")?,
            }
        }
        Command::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let data: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let count = manager.import_all(&data).await?;
            writeln!(out, "Imported {count} license(s)")?;
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete every license without --yes");
            }
            manager.clear_all().await?;
            writeln!(out, "All licenses deleted")?;
        }
        Command::DeviceId => {
            writeln!(out, "{}", manager.current_device_id()?)?;
        }
    }
    Ok(out)
}

fn parse_key(raw: &str) -> Result<LicenseKey> {
    LicenseKey::parse(raw).with_context(|| format!("Invalid license key {raw:?}"))
}

/// One-line summary of a record.
fn describe(record: &LicenseRecord) -> String {
    let device = record
        .device_id
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    let activated = record
        .activation_date
        .map_or_else(|| "-".to_string(), |d| d.to_rfc3339());
    format!(
        "{}  status={}  device={}  activated={}",
        record.key, record.status, device, activated
    )
}
