//! Spoken time announcement text.

use chrono::{NaiveDateTime, Timelike};

use crate::calendar::{clock_time, meridian};

/// Sentence read out while an alarm rings, paced with commas for the
/// speech engine: `The time, is, 7, O, 5, AM`.
///
/// On the hour the minutes are left out (`The time, is, 8, AM`); in 24-hour
/// mode there is no AM/PM suffix.
pub fn time_to_say(now: NaiveDateTime, use_24_hour: bool) -> String {
    let clock = clock_time(now.hour(), now.minute(), use_24_hour);
    let (hour, minutes) = clock.split_once(':').unwrap_or((clock.as_str(), "00"));

    let minutes = match minutes.as_bytes() {
        [b'0', b'0'] => String::new(),
        [b'0', digit] => format!(", O, {}", *digit as char),
        _ => format!(", {minutes}"),
    };
    let suffix = if use_24_hour {
        String::new()
    } else {
        format!(", {}", meridian(now.hour()))
    };

    format!("The time, is, {hour}{minutes}{suffix}")
}
