use chrono::{Days, NaiveDateTime, NaiveTime, Timelike};

use super::{Day, DaySet};

/// Next instant at or after `now` at which a `time` on `days` triggers.
///
/// With no days selected the alarm is one-shot: today if the time has not
/// passed yet, otherwise tomorrow. With days selected, the scan starts today
/// and covers a full week; only today's instant can already be in the past,
/// in which case the same weekday next week is used.
pub fn next_occurrence(time: NaiveTime, days: DaySet, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(time);

    if days.is_empty() {
        return if today >= now {
            today
        } else {
            today + Days::new(1)
        };
    }

    for offset in 0..7u64 {
        let candidate = today + Days::new(offset);
        if !days.contains(Day::of(candidate)) {
            continue;
        }
        if offset > 0 || candidate >= now {
            return candidate;
        }
    }

    today + Days::new(7)
}

/// Instant a snoozed alarm goes off: the fixed snooze time, today or
/// tomorrow, never re-derived from the weekday set.
pub fn next_snooze_occurrence(time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    next_occurrence(time, DaySet::none(), now)
}

/// `7:05` in 12-hour mode, `19:05` in 24-hour mode.
pub fn clock_time(hour: u32, minute: u32, use_24_hour: bool) -> String {
    let shown = if use_24_hour {
        hour
    } else {
        match hour % 12 {
            0 => 12,
            h => h,
        }
    };
    format!("{shown}:{minute:02}")
}

pub fn meridian(hour: u32) -> &'static str {
    if hour < 12 {
        "AM"
    } else {
        "PM"
    }
}

/// Day and clock time of an occurrence, e.g. `Mon 7:05 AM`.
pub fn full_time(at: NaiveDateTime, use_24_hour: bool) -> String {
    let day = Day::of(at).short_name();
    let clock = clock_time(at.hour(), at.minute(), use_24_hour);
    if use_24_hour {
        format!("{day} {clock}")
    } else {
        format!("{day} {clock} {}", meridian(at.hour()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2024-01-01 is a Monday.
    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn eight() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn monday_alarm_before_time_is_today() {
        let days: DaySet = [Day::Monday].into_iter().collect();
        assert_eq!(next_occurrence(eight(), days, at(1, 7, 59)), at(1, 8, 0));
    }

    #[test]
    fn monday_alarm_after_time_is_next_week() {
        let days: DaySet = [Day::Monday].into_iter().collect();
        assert_eq!(next_occurrence(eight(), days, at(1, 8, 1)), at(8, 8, 0));
    }

    #[test]
    fn exact_time_counts_as_not_passed() {
        assert_eq!(
            next_occurrence(eight(), DaySet::none(), at(1, 8, 0)),
            at(1, 8, 0)
        );
    }

    #[test]
    fn one_shot_rolls_to_tomorrow() {
        assert_eq!(
            next_occurrence(eight(), DaySet::none(), at(1, 9, 0)),
            at(2, 8, 0)
        );
    }

    #[test]
    fn picks_first_flagged_day_ahead() {
        let days: DaySet = [Day::Thursday, Day::Saturday].into_iter().collect();
        // Monday -> Thursday the 4th
        assert_eq!(next_occurrence(eight(), days, at(1, 12, 0)), at(4, 8, 0));
    }

    #[test]
    fn wraps_across_week_boundary() {
        let days: DaySet = [Day::Monday].into_iter().collect();
        // Saturday the 6th -> Monday the 8th
        assert_eq!(next_occurrence(eight(), days, at(6, 10, 0)), at(8, 8, 0));
    }

    #[test]
    fn snooze_occurrence_ignores_days() {
        let snooze = NaiveTime::from_hms_opt(0, 5, 0).unwrap();
        assert_eq!(next_snooze_occurrence(snooze, at(1, 23, 58)), at(2, 0, 5));
    }

    #[test]
    fn clock_formats() {
        assert_eq!(clock_time(0, 5, false), "12:05");
        assert_eq!(clock_time(13, 30, false), "1:30");
        assert_eq!(clock_time(13, 30, true), "13:30");
        assert_eq!(meridian(11), "AM");
        assert_eq!(meridian(12), "PM");
        assert_eq!(full_time(at(1, 7, 5), false), "Mon 7:05 AM");
        assert_eq!(full_time(at(2, 19, 0), true), "Tue 19:00");
    }
}
