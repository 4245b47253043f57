use std::fmt;

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// A day of the week, with the bit it occupies in a [`DaySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    /// Sunday first, matching the bit order.
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// The day `now` falls on.
    pub fn of(now: NaiveDateTime) -> Self {
        now.weekday().into()
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Day::Sunday => "Sun",
            Day::Monday => "Mon",
            Day::Tuesday => "Tue",
            Day::Wednesday => "Wed",
            Day::Thursday => "Thu",
            Day::Friday => "Fri",
            Day::Saturday => "Sat",
        }
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => Day::Sunday,
            Weekday::Mon => Day::Monday,
            Weekday::Tue => Day::Tuesday,
            Weekday::Wed => Day::Wednesday,
            Weekday::Thu => Day::Thursday,
            Weekday::Fri => Day::Friday,
            Weekday::Sat => Day::Saturday,
        }
    }
}

impl std::str::FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Day::ALL
            .into_iter()
            .find(|d| {
                let short = d.short_name().to_ascii_lowercase();
                lower == short || lower == format!("{d:?}").to_ascii_lowercase()
            })
            .ok_or_else(|| format!("unknown day: {s}"))
    }
}

/// Set of weekdays an alarm repeats on. Empty means "one-shot".
///
/// Stored as a bitmask (Sunday = 1 … Saturday = 64) in the database, the
/// config file and the alarm codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySet(u8);

impl DaySet {
    pub const WEEKDAYS: DaySet = DaySet(0b0011_1110);
    pub const WEEKEND: DaySet = DaySet(0b0100_0001);
    pub const EVERYDAY: DaySet = DaySet(0b0111_1111);

    pub const fn none() -> Self {
        DaySet(0)
    }

    /// Build from a stored bitmask; bits above Saturday are dropped.
    pub const fn from_value(value: u8) -> Self {
        DaySet(value & 0b0111_1111)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, day: Day) -> bool {
        self.0 & day.bit() != 0
    }

    pub fn insert(&mut self, day: Day) {
        self.0 |= day.bit();
    }

    pub fn remove(&mut self, day: Day) {
        self.0 &= !day.bit();
    }

    pub fn toggle(&mut self, day: Day) {
        self.0 ^= day.bit();
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Day> {
        Day::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Day> for DaySet {
    fn from_iter<I: IntoIterator<Item = Day>>(iter: I) -> Self {
        let mut set = DaySet::none();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            s if s.is_empty() => write!(f, "Once"),
            DaySet::EVERYDAY => write!(f, "Everyday"),
            DaySet::WEEKDAYS => write!(f, "Weekdays"),
            DaySet::WEEKEND => write!(f, "Weekends"),
            s => {
                let names: Vec<&str> = s.iter().map(Day::short_name).collect();
                write!(f, "{}", names.join(", "))
            }
        }
    }
}
