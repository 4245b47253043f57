//! Ranking of two alarms.
//!
//! The order depends on the current instant (through the next occurrence of
//! each alarm), so it is exposed as [`Alarm::compare`] rather than `Ord`.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use super::Alarm;

impl Alarm {
    /// In-use rank: lower rings more urgently.
    ///
    /// | state | value |
    /// |---|---|
    /// | not in use | -1 |
    /// | active, not snoozed | 0 |
    /// | active, snoozed | `snooze_count` |
    /// | inactive, snoozed | `1000 * snooze_count` |
    pub fn in_use_value(&self) -> i64 {
        let count = i64::from(self.snooze_count);
        match (self.is_active, self.is_snoozed()) {
            (true, false) => 0,
            (true, true) => count,
            (false, true) => 1000 * count,
            (false, false) => -1,
        }
    }

    /// Zero-padded `HH:MM` of the base time.
    pub fn sort_time(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// Base-time tie break.
    pub fn compare_time(&self, other: &Alarm) -> Ordering {
        self.sort_time().cmp(&other.sort_time())
    }

    fn compare_in_use(&self, other: &Alarm) -> Ordering {
        let (this, that) = (self.in_use_value(), other.in_use_value());
        match (this < 0, that < 0) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => this.cmp(&that).then_with(|| self.compare_time(other)),
        }
    }

    /// Total order at `now`: in-use alarms first, then enabled, then by the
    /// next calendar occurrence.
    pub fn compare(&self, other: &Alarm, now: NaiveDateTime) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        if self.is_in_use() || other.is_in_use() {
            return self.compare_in_use(other);
        }
        match (self.is_enabled, other.is_enabled) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.next_occurrence(now).cmp(&other.next_occurrence(now)),
        }
    }
}
