//! # Wakealarm Core Library
//!
//! This library provides the core logic for wakealarm, an alarm clock that
//! keeps ringing until it is actively dismissed. It follows a CLI-first
//! philosophy: every operation is reachable through the `wakealarm` binary,
//! which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Calendar**: Weekday sets and next-occurrence computation
//! - **Alarm**: The alarm record, its ordering, and the snooze/dismiss lifecycle
//! - **Wake-up**: The orchestrator that drives audio, vibration, speech and the
//!   auto-dismiss timer while an alarm rings
//! - **Storage**: SQLite alarm and trigger storage, TOML configuration
//!
//! ## Key Components
//!
//! - [`Alarm`]: The alarm entity
//! - [`WakeUpOrchestrator`]: Wake-up state machine
//! - [`AlarmService`]: Lifecycle transitions kept in step with storage
//! - [`Database`]: Alarm and trigger persistence
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod calendar;
pub mod error;
pub mod events;
pub mod service;
pub mod settings;
pub mod storage;
pub mod store;
pub mod wakeup;

pub use alarm::{Alarm, AlarmBuilder, AlarmEdit, MediaType};
pub use calendar::{Day, DaySet};
pub use error::{AlarmError, CodecError, ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use service::AlarmService;
pub use settings::{AlarmDefaults, AlarmSettings};
pub use storage::{Config, Database};
pub use store::{AlarmStore, TriggerScheduler};
pub use wakeup::{WakeUpOrchestrator, WakeUpSession, WakeUpSignal, WakeUpState};
