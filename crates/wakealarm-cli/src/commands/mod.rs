//! Subcommand implementations.

pub mod alarm;
pub mod config;
pub mod ring;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use wakealarm_core::{AlarmService, Config, Database};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Alarms are scheduled against local wall-clock time.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn service<'a>(db: &'a Database, config: &Config) -> AlarmService<&'a Database, &'a Database> {
    AlarmService::new(db, db, config.settings()).with_defaults(config.defaults.clone())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
