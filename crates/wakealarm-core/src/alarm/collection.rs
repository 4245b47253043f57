//! Ordering of a whole set of alarms, as shown in lists and used to pick
//! the alarm that governs notifications.

use chrono::NaiveDateTime;

use super::Alarm;

/// Bucket an alarm falls in; lower buckets come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bucket {
    InUse,
    Enabled,
    Disabled,
}

impl Bucket {
    pub fn of(alarm: &Alarm) -> Self {
        if alarm.is_in_use() {
            Bucket::InUse
        } else if alarm.is_enabled {
            Bucket::Enabled
        } else {
            Bucket::Disabled
        }
    }
}

fn sort_key(alarm: &Alarm, now: NaiveDateTime) -> (Bucket, NaiveDateTime) {
    (Bucket::of(alarm), alarm.next_run(now))
}

/// In-use, then enabled, then disabled alarms, each group ordered by when
/// the alarm next runs. Alarms with equal keys keep their input order.
pub fn sorted_alarms(alarms: &[Alarm], now: NaiveDateTime) -> Vec<Alarm> {
    let mut keyed: Vec<((Bucket, NaiveDateTime), &Alarm)> =
        alarms.iter().map(|a| (sort_key(a, now), a)).collect();
    // `sort_by` is stable.
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, a)| a.clone()).collect()
}

/// First alarm of the sorted set.
pub fn next_alarm(alarms: &[Alarm], now: NaiveDateTime) -> Option<Alarm> {
    alarms
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| sort_key(a, now).cmp(&sort_key(b, now)).then(ia.cmp(ib)))
        .map(|(_, a)| a.clone())
}

/// Position `alarm` takes in an already sorted list.
///
/// An existing entry with the same non-zero id is ignored, so the result
/// can be used to move an edited alarm. The alarm goes after every entry
/// with an equal key, which is where a stable re-sort with the alarm
/// appended would put it.
pub fn insertion_index(sorted: &[Alarm], alarm: &Alarm, now: NaiveDateTime) -> usize {
    let key = sort_key(alarm, now);
    let mut index = 0;
    for existing in sorted {
        if alarm.id != 0 && existing.id == alarm.id {
            continue;
        }
        if key < sort_key(existing, now) {
            break;
        }
        index += 1;
    }
    index
}
