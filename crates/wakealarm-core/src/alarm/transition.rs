//! Snooze and dismiss transitions.
//!
//! These only mutate the alarm. Persisting it and rescheduling the platform
//! trigger is the caller's job (see [`AlarmService`](crate::service::AlarmService)).

use chrono::{Duration, NaiveDateTime, Timelike};
use tracing::{debug, info};

use super::Alarm;
use crate::calendar::Day;
use crate::error::AlarmError;
use crate::settings::AlarmSettings;

impl Alarm {
    /// Mark the alarm as ringing.
    pub fn activate(&mut self) {
        self.is_active = true;
        debug!(alarm_id = self.id, "alarm activated");
    }

    /// Snooze for the configured duration from `now`.
    ///
    /// Returns the instant the alarm rings again. Refused with
    /// [`AlarmError::InvalidSnooze`], leaving the alarm untouched, once the
    /// maximum number of snoozes is reached. `is_active` is not changed.
    pub fn snooze(
        &mut self,
        settings: &AlarmSettings,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime, AlarmError> {
        if !self.can_snooze(settings) {
            return Err(AlarmError::InvalidSnooze {
                snooze_count: self.snooze_count,
                max_snooze: settings.max_snooze,
            });
        }

        let at = now + Duration::minutes(i64::from(settings.snooze_duration_min));
        self.snooze_hour = at.hour() as i32;
        self.snooze_minute = at.minute() as i32;
        self.snooze_count += 1;
        info!(
            alarm_id = self.id,
            snooze_count = self.snooze_count,
            at = %at,
            "alarm snoozed"
        );
        Ok(at)
    }

    /// Stop the alarm and clear all runtime state.
    ///
    /// A one-shot alarm drops `today` from its days and switches itself off
    /// once no day is left. Calling this twice has the same effect as once.
    pub fn dismiss(&mut self, today: Day) {
        self.reset_runtime();
        if !self.repeat {
            self.consume_day(today);
        }
        info!(alarm_id = self.id, enabled = self.is_enabled, "alarm dismissed");
    }

    /// Switch the alarm off. A ringing or snoozed alarm stops being in use.
    pub fn disable(&mut self) {
        self.reset_runtime();
        self.is_enabled = false;
        info!(alarm_id = self.id, "alarm disabled");
    }

    /// Dismiss the upcoming occurrence before it rings.
    ///
    /// Repeating alarms remember which occurrence was skipped; one-shot
    /// alarms are consumed as if they had rung.
    pub fn dismiss_early(&mut self, now: NaiveDateTime) {
        if self.repeat {
            let skipped = self.next_occurrence(now);
            self.time_of_dismiss_early_alarm = skipped.and_utc().timestamp_millis();
        } else {
            let day = Day::of(self.next_occurrence(now));
            self.consume_day(day);
        }
        info!(alarm_id = self.id, "alarm dismissed early");
    }

    /// Whether the next occurrence is close enough to be dismissed early.
    pub fn will_alarm_soon(&self, now: NaiveDateTime) -> bool {
        if !self.is_enabled || !self.use_dismiss_early || self.dismiss_early_time == 0 {
            return false;
        }
        let minutes = (self.next_occurrence(now) - now).num_minutes();
        minutes < i64::from(self.dismiss_early_time)
    }

    /// Whether the occurrence at `at` was skipped by an early dismissal.
    pub fn was_dismissed_early(&self, at: NaiveDateTime) -> bool {
        self.time_of_dismiss_early_alarm != 0
            && self.time_of_dismiss_early_alarm == at.and_utc().timestamp_millis()
    }

    fn reset_runtime(&mut self) {
        self.is_active = false;
        self.time_active = 0;
        self.snooze_count = 0;
        self.snooze_hour = -1;
        self.snooze_minute = -1;
    }

    fn consume_day(&mut self, day: Day) {
        if self.are_days_selected() {
            self.days.remove(day);
        }
        if !self.are_days_selected() {
            self.is_enabled = false;
        }
    }
}
