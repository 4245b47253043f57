mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, DismissConfig, DisplayConfig, MediaConfig, SnoozeConfig, SpeechConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the directory holding the database and config file.
///
/// `WAKEALARM_DATA_DIR` wins when set. Otherwise `~/.config/wakealarm`, or
/// `~/.config/wakealarm-dev` with `WAKEALARM_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("WAKEALARM_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("WAKEALARM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("wakealarm-dev")
            } else {
                base_dir.join("wakealarm")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
