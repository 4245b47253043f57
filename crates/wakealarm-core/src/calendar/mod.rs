//! Day/time model.
//!
//! Weekday sets and the "next occurrence" computation every alarm schedule
//! is built on, plus the clock formatting used in messages and speech.

mod day;
mod occurrence;

pub use day::{Day, DaySet};
pub use occurrence::{clock_time, full_time, meridian, next_occurrence, next_snooze_occurrence};
