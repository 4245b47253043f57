//! Immutable settings snapshots handed to alarm operations.
//!
//! The wake-up orchestrator and the snooze/dismiss transitions never read
//! configuration on their own; the caller takes a snapshot from
//! [`Config`](crate::storage::Config) and passes it in.

use serde::{Deserialize, Serialize};

use crate::calendar::DaySet;

/// Behaviour settings consumed by the alarm core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSettings {
    /// Maximum number of snoozes; negative means unlimited.
    pub max_snooze: i32,
    pub snooze_duration_min: u32,
    /// Minutes before a ringing alarm is dismissed automatically; 0 = never.
    pub auto_dismiss_min: u32,
    /// Speak the current time while the alarm rings.
    pub speak_to_me: bool,
    /// Minutes between spoken announcements; 0 = speak once.
    pub speak_frequency_min: u32,
    pub use_24_hour: bool,
    pub shuffle: bool,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            max_snooze: -1,
            snooze_duration_min: 5,
            auto_dismiss_min: 15,
            speak_to_me: false,
            speak_frequency_min: 0,
            use_24_hour: false,
            shuffle: false,
        }
    }
}

/// User-configured defaults for newly created alarms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmDefaults {
    #[serde(default)]
    pub days: DaySet,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub vibrate: bool,
    #[serde(default)]
    pub use_nfc: bool,
    #[serde(default)]
    pub media_path: String,
    #[serde(default = "default_volume")]
    pub volume: u32,
    #[serde(default = "default_audio_source")]
    pub audio_source: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub use_tts: bool,
    #[serde(default)]
    pub tts_frequency: u32,
}

fn default_volume() -> u32 {
    75
}

fn default_audio_source() -> String {
    "Media".into()
}

impl Default for AlarmDefaults {
    fn default() -> Self {
        Self {
            days: DaySet::none(),
            repeat: false,
            vibrate: false,
            use_nfc: false,
            media_path: String::new(),
            volume: default_volume(),
            audio_source: default_audio_source(),
            name: String::new(),
            use_tts: false,
            tts_frequency: 0,
        }
    }
}
