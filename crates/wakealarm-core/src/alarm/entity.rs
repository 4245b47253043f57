//! The alarm record and its derived state.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calendar::{self, Day, DaySet};
use crate::error::AlarmError;
use crate::settings::{AlarmDefaults, AlarmSettings};

/// Kind of media an alarm plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    None,
    Ringtone,
    File,
    Directory,
}

impl MediaType {
    pub const fn code(self) -> u8 {
        match self {
            MediaType::None => 0,
            MediaType::Ringtone => 1,
            MediaType::File => 2,
            MediaType::Directory => 3,
        }
    }

    /// Unknown codes fall back to `None`.
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => MediaType::Ringtone,
            2 => MediaType::File,
            3 => MediaType::Directory,
            _ => MediaType::None,
        }
    }
}

/// An alarm.
///
/// Equality compares every field, so two copies of the same alarm (same
/// `id`) are equal only while their runtime state matches as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    /// Row id; 0 until the alarm is first persisted.
    pub id: i64,
    pub is_enabled: bool,
    /// Currently firing, either ringing or snoozed and waiting.
    pub is_active: bool,
    /// Milliseconds the alarm has spent ringing across snoozes.
    pub time_active: i64,
    pub snooze_count: u32,
    pub hour: u32,
    pub minute: u32,
    /// -1 when not snoozed.
    pub snooze_hour: i32,
    /// -1 when not snoozed.
    pub snooze_minute: i32,
    pub days: DaySet,
    pub repeat: bool,
    pub vibrate: bool,
    pub use_nfc: bool,
    /// Empty accepts any tag.
    pub nfc_tag_id: String,
    pub media_type: MediaType,
    pub media_path: String,
    pub media_title: String,
    pub volume: u32,
    pub audio_source: String,
    pub name: String,
    pub use_tts: bool,
    /// Minutes between spoken announcements; 0 = speak once.
    pub tts_frequency: u32,
    pub use_dismiss_early: bool,
    /// Minutes before the next occurrence during which it can be dismissed early.
    pub dismiss_early_time: u32,
    /// Epoch milliseconds of the occurrence skipped by an early dismissal.
    pub time_of_dismiss_early_alarm: i64,
}

impl Default for Alarm {
    fn default() -> Self {
        Self {
            id: 0,
            is_enabled: true,
            is_active: false,
            time_active: 0,
            snooze_count: 0,
            hour: 0,
            minute: 0,
            snooze_hour: -1,
            snooze_minute: -1,
            days: DaySet::none(),
            repeat: false,
            vibrate: false,
            use_nfc: false,
            nfc_tag_id: String::new(),
            media_type: MediaType::None,
            media_path: String::new(),
            media_title: String::new(),
            volume: 0,
            audio_source: "Media".into(),
            name: String::new(),
            use_tts: false,
            tts_frequency: 0,
            use_dismiss_early: false,
            dismiss_early_time: 0,
            time_of_dismiss_early_alarm: 0,
        }
    }
}

impl Alarm {
    // ── Derived state ────────────────────────────────────────────────

    pub fn is_snoozed(&self) -> bool {
        self.snooze_count > 0
    }

    /// Active or snoozed.
    pub fn is_in_use(&self) -> bool {
        self.is_active || self.is_snoozed()
    }

    /// Uses the current snooze count, not the count after this snooze.
    pub fn can_snooze(&self, settings: &AlarmSettings) -> bool {
        settings.max_snooze < 0 || i64::from(self.snooze_count) < i64::from(settings.max_snooze)
    }

    pub fn are_days_selected(&self) -> bool {
        !self.days.is_empty()
    }

    pub fn has_media(&self) -> bool {
        !self.media_path.is_empty()
    }

    /// Base trigger time. Out-of-range fields read as midnight.
    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Snoozed trigger time, if a valid one is set.
    pub fn snooze_time(&self) -> Option<NaiveTime> {
        let hour = u32::try_from(self.snooze_hour).ok()?;
        let minute = u32::try_from(self.snooze_minute).ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    /// Next calendar occurrence of the base schedule.
    pub fn next_occurrence(&self, now: NaiveDateTime) -> NaiveDateTime {
        calendar::next_occurrence(self.time(), self.days, now)
    }

    /// When the alarm will next go off: the fixed snooze time while snoozed,
    /// the base schedule otherwise.
    pub fn next_run(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self.snooze_time() {
            Some(time) if self.is_snoozed() => calendar::next_snooze_occurrence(time, now),
            _ => self.next_occurrence(now),
        }
    }

    /// Clock text of the base time, e.g. `7:05`.
    pub fn clock_time(&self, use_24_hour: bool) -> String {
        calendar::clock_time(self.hour, self.minute, use_24_hour)
    }

    /// Day and time of the next run, e.g. `Mon 7:05 AM`.
    pub fn full_time(&self, now: NaiveDateTime, use_24_hour: bool) -> String {
        calendar::full_time(self.next_run(now), use_24_hour)
    }

    /// Name with newlines replaced by spaces.
    pub fn name_normalized(&self) -> String {
        self.name.replace('\n', " ")
    }

    /// Normalized name cut to `max` characters, ending in `...` when cut.
    pub fn name_for_message(&self, max: usize) -> String {
        let name = self.name_normalized();
        if name.chars().count() <= max {
            return name;
        }
        let keep = max.saturating_sub(3);
        let mut short: String = name.chars().take(keep).collect();
        short.push_str("...");
        short
    }

    // ── Mutation ─────────────────────────────────────────────────────

    pub fn validate(&self) -> Result<(), AlarmError> {
        if self.hour > 23 || self.minute > 59 {
            return Err(AlarmError::InvalidTime {
                hour: self.hour,
                minute: self.minute,
            });
        }
        Ok(())
    }

    /// Apply a single-field edit. Runtime state is never touched.
    pub fn apply(&mut self, edit: &AlarmEdit) -> Result<(), AlarmError> {
        match edit {
            AlarmEdit::Enabled(on) => self.is_enabled = *on,
            AlarmEdit::Time { hour, minute } => {
                if *hour > 23 || *minute > 59 {
                    return Err(AlarmError::InvalidTime {
                        hour: *hour,
                        minute: *minute,
                    });
                }
                self.hour = *hour;
                self.minute = *minute;
            }
            AlarmEdit::Days(days) => self.days = *days,
            AlarmEdit::Repeat(on) => self.repeat = *on,
            AlarmEdit::Vibrate(on) => self.vibrate = *on,
            AlarmEdit::UseNfc(on) => self.use_nfc = *on,
            AlarmEdit::NfcTagId(tag) => self.nfc_tag_id = tag.clone(),
            AlarmEdit::Media {
                media_type,
                path,
                title,
            } => {
                self.media_type = *media_type;
                self.media_path = path.clone();
                self.media_title = title.clone();
            }
            AlarmEdit::Volume(volume) => self.volume = (*volume).min(100),
            AlarmEdit::AudioSource(source) => self.audio_source = source.clone(),
            AlarmEdit::Name(name) => self.name = name.clone(),
            AlarmEdit::UseTts(on) => self.use_tts = *on,
            AlarmEdit::TtsFrequency(freq) => self.tts_frequency = *freq,
            AlarmEdit::DismissEarly { enabled, minutes } => {
                self.use_dismiss_early = *enabled;
                self.dismiss_early_time = *minutes;
            }
        }
        Ok(())
    }

    pub fn toggle_day(&mut self, day: Day) {
        self.days.toggle(day);
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat = !self.repeat;
    }

    pub fn toggle_vibrate(&mut self) {
        self.vibrate = !self.vibrate;
    }

    pub fn toggle_use_nfc(&mut self) {
        self.use_nfc = !self.use_nfc;
    }

    pub fn add_to_time_active(&mut self, millis: i64) {
        self.time_active = self.time_active.saturating_add(millis);
    }

    /// Unsaved duplicate: id 0 and no runtime state.
    pub fn copy(&self) -> Alarm {
        Alarm {
            id: 0,
            is_active: false,
            time_active: 0,
            snooze_count: 0,
            snooze_hour: -1,
            snooze_minute: -1,
            time_of_dismiss_early_alarm: 0,
            ..self.clone()
        }
    }
}

/// A change to one persisted field of an alarm.
///
/// Each edit maps to exactly one column update in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum AlarmEdit {
    Enabled(bool),
    Time { hour: u32, minute: u32 },
    Days(DaySet),
    Repeat(bool),
    Vibrate(bool),
    UseNfc(bool),
    NfcTagId(String),
    Media {
        media_type: MediaType,
        path: String,
        title: String,
    },
    Volume(u32),
    AudioSource(String),
    Name(String),
    UseTts(bool),
    TtsFrequency(u32),
    DismissEarly { enabled: bool, minutes: u32 },
}

/// Constructs alarms seeded from built-in or user-configured defaults.
#[derive(Debug, Clone)]
pub struct AlarmBuilder {
    alarm: Alarm,
}

impl AlarmBuilder {
    /// Built-in defaults, with the time set to `now`'s hour and minute.
    pub fn new(now: NaiveDateTime) -> Self {
        use chrono::Timelike;
        Self {
            alarm: Alarm {
                hour: now.hour(),
                minute: now.minute(),
                ..Alarm::default()
            },
        }
    }

    /// Seed from the user's preferred defaults.
    pub fn from_defaults(defaults: &AlarmDefaults, now: NaiveDateTime) -> Self {
        let mut builder = Self::new(now);
        let alarm = &mut builder.alarm;
        alarm.days = defaults.days;
        alarm.repeat = defaults.repeat;
        alarm.vibrate = defaults.vibrate;
        alarm.use_nfc = defaults.use_nfc;
        alarm.media_path = defaults.media_path.clone();
        if !alarm.media_path.is_empty() {
            alarm.media_type = MediaType::File;
        }
        alarm.volume = defaults.volume.min(100);
        alarm.audio_source = defaults.audio_source.clone();
        alarm.name = defaults.name.clone();
        alarm.use_tts = defaults.use_tts;
        alarm.tts_frequency = defaults.tts_frequency;
        builder
    }

    pub fn id(mut self, id: i64) -> Self {
        self.alarm.id = id;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.alarm.is_enabled = enabled;
        self
    }

    pub fn time(mut self, hour: u32, minute: u32) -> Self {
        self.alarm.hour = hour;
        self.alarm.minute = minute;
        self
    }

    pub fn days(mut self, days: DaySet) -> Self {
        self.alarm.days = days;
        self
    }

    pub fn repeat(mut self, repeat: bool) -> Self {
        self.alarm.repeat = repeat;
        self
    }

    pub fn vibrate(mut self, vibrate: bool) -> Self {
        self.alarm.vibrate = vibrate;
        self
    }

    pub fn nfc(mut self, use_nfc: bool, tag_id: impl Into<String>) -> Self {
        self.alarm.use_nfc = use_nfc;
        self.alarm.nfc_tag_id = tag_id.into();
        self
    }

    pub fn media(
        mut self,
        media_type: MediaType,
        path: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        self.alarm.media_type = media_type;
        self.alarm.media_path = path.into();
        self.alarm.media_title = title.into();
        self
    }

    pub fn volume(mut self, volume: u32) -> Self {
        self.alarm.volume = volume.min(100);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.alarm.name = name.into();
        self
    }

    pub fn tts(mut self, use_tts: bool, frequency_min: u32) -> Self {
        self.alarm.use_tts = use_tts;
        self.alarm.tts_frequency = frequency_min;
        self
    }

    pub fn dismiss_early(mut self, enabled: bool, minutes: u32) -> Self {
        self.alarm.use_dismiss_early = enabled;
        self.alarm.dismiss_early_time = minutes;
        self
    }

    pub fn build(self) -> Result<Alarm, AlarmError> {
        self.alarm.validate()?;
        Ok(self.alarm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap()
    }

    #[test]
    fn builder_seeds_time_from_now() {
        let alarm = AlarmBuilder::new(now()).build().unwrap();
        assert_eq!((alarm.hour, alarm.minute), (6, 30));
        assert!(alarm.is_enabled);
        assert_eq!(alarm.snooze_hour, -1);
        assert_eq!(alarm.id, 0);
    }

    #[test]
    fn builder_applies_user_defaults() {
        let defaults = AlarmDefaults {
            days: DaySet::WEEKDAYS,
            repeat: true,
            vibrate: true,
            media_path: "/music/wake.mp3".into(),
            name: "Work".into(),
            ..AlarmDefaults::default()
        };
        let alarm = AlarmBuilder::from_defaults(&defaults, now()).build().unwrap();
        assert_eq!(alarm.days, DaySet::WEEKDAYS);
        assert!(alarm.repeat && alarm.vibrate);
        assert!(alarm.has_media());
        assert_eq!(alarm.media_type, MediaType::File);
        assert_eq!(alarm.name, "Work");
    }

    #[test]
    fn builder_rejects_invalid_time() {
        let err = AlarmBuilder::new(now()).time(24, 0).build().unwrap_err();
        assert_eq!(err, AlarmError::InvalidTime { hour: 24, minute: 0 });
    }

    #[test]
    fn in_use_follows_active_or_snoozed() {
        let mut alarm = Alarm::default();
        assert!(!alarm.is_in_use());
        alarm.snooze_count = 1;
        assert!(alarm.is_snoozed() && alarm.is_in_use());
        alarm.snooze_count = 0;
        alarm.is_active = true;
        assert!(alarm.is_in_use() && !alarm.is_snoozed());
    }

    #[test]
    fn can_snooze_uses_current_count() {
        let settings = AlarmSettings {
            max_snooze: 3,
            ..AlarmSettings::default()
        };
        let mut alarm = Alarm::default();
        alarm.snooze_count = 2;
        assert!(alarm.can_snooze(&settings));
        alarm.snooze_count = 3;
        assert!(!alarm.can_snooze(&settings));

        let unlimited = AlarmSettings {
            max_snooze: -1,
            ..AlarmSettings::default()
        };
        alarm.snooze_count = 500;
        assert!(alarm.can_snooze(&unlimited));
    }

    #[test]
    fn zero_max_snooze_never_snoozes() {
        let settings = AlarmSettings {
            max_snooze: 0,
            ..AlarmSettings::default()
        };
        assert!(!Alarm::default().can_snooze(&settings));
    }

    #[test]
    fn name_normalization() {
        let alarm = Alarm {
            name: "Morning\nrun with the dog".into(),
            ..Alarm::default()
        };
        assert_eq!(alarm.name_normalized(), "Morning run with the dog");
        assert_eq!(alarm.name_for_message(10), "Morning...");
        assert_eq!(alarm.name_for_message(100), "Morning run with the dog");
    }

    #[test]
    fn next_run_prefers_snooze_time() {
        let mut alarm = Alarm {
            hour: 6,
            minute: 0,
            ..Alarm::default()
        };
        alarm.snooze_count = 1;
        alarm.snooze_hour = 6;
        alarm.snooze_minute = 40;
        let expected = now().date().and_hms_opt(6, 40, 0).unwrap();
        assert_eq!(alarm.next_run(now()), expected);
    }

    #[test]
    fn apply_edit_changes_single_field() {
        let mut alarm = Alarm::default();
        alarm.apply(&AlarmEdit::Time { hour: 7, minute: 15 }).unwrap();
        alarm.apply(&AlarmEdit::Volume(250)).unwrap();
        assert_eq!((alarm.hour, alarm.minute), (7, 15));
        assert_eq!(alarm.volume, 100);
        assert!(alarm
            .apply(&AlarmEdit::Time { hour: 7, minute: 60 })
            .is_err());
        assert_eq!(alarm.minute, 15);
    }

    #[test]
    fn copy_clears_identity_and_runtime_state() {
        let mut alarm = Alarm {
            id: 9,
            name: "Gym".into(),
            ..Alarm::default()
        };
        alarm.is_active = true;
        alarm.snooze_count = 2;
        let copy = alarm.copy();
        assert_eq!(copy.id, 0);
        assert!(!copy.is_in_use());
        assert_eq!(copy.name, "Gym");
    }

    #[test]
    fn media_type_codes_roundtrip_and_default() {
        for t in [
            MediaType::None,
            MediaType::Ringtone,
            MediaType::File,
            MediaType::Directory,
        ] {
            assert_eq!(MediaType::from_code(t.code()), t);
        }
        assert_eq!(MediaType::from_code(42), MediaType::None);
    }
}
