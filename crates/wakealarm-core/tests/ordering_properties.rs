//! Property tests for alarm ordering and collection ordering.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use wakealarm_core::alarm::{insertion_index, sorted_alarms};
use wakealarm_core::{Alarm, Day, DaySet};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn arb_now() -> impl Strategy<Value = NaiveDateTime> {
    (0i64..7 * 24 * 60).prop_map(|minutes| base() + Duration::minutes(minutes))
}

prop_compose! {
    fn arb_alarm(id: i64)(
        is_enabled in any::<bool>(),
        is_active in any::<bool>(),
        snooze_count in 0u32..4,
        hour in 0u32..24,
        minute in 0u32..60,
        snooze_hour in 0i32..24,
        snooze_minute in 0i32..60,
        days in 0u8..128,
        repeat in any::<bool>(),
    ) -> Alarm {
        let snoozed = snooze_count > 0;
        Alarm {
            id,
            is_enabled,
            is_active,
            snooze_count,
            hour,
            minute,
            snooze_hour: if snoozed { snooze_hour } else { -1 },
            snooze_minute: if snoozed { snooze_minute } else { -1 },
            days: DaySet::from_value(days),
            repeat,
            ..Alarm::default()
        }
    }
}

fn arb_list(max: usize) -> impl Strategy<Value = Vec<Alarm>> {
    (0..=max).prop_flat_map(|len| {
        (1..=len as i64)
            .map(arb_alarm)
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn compare_is_antisymmetric(a in arb_alarm(1), b in arb_alarm(2), now in arb_now()) {
        prop_assert_eq!(a.compare(&b, now), b.compare(&a, now).reverse());
    }

    #[test]
    fn compare_is_transitive(
        a in arb_alarm(1),
        b in arb_alarm(2),
        c in arb_alarm(3),
        now in arb_now(),
    ) {
        let mut v = [a, b, c];
        v.sort_by(|x, y| x.compare(y, now));
        prop_assert_ne!(v[0].compare(&v[1], now), Ordering::Greater);
        prop_assert_ne!(v[1].compare(&v[2], now), Ordering::Greater);
        prop_assert_ne!(v[0].compare(&v[2], now), Ordering::Greater);
    }

    #[test]
    fn compare_with_itself_is_equal(a in arb_alarm(1), now in arb_now()) {
        prop_assert_eq!(a.compare(&a.clone(), now), Ordering::Equal);
    }

    #[test]
    fn sorted_alarms_is_a_permutation(list in arb_list(8), now in arb_now()) {
        let sorted = sorted_alarms(&list, now);
        let mut before: Vec<i64> = list.iter().map(|a| a.id).collect();
        let mut after: Vec<i64> = sorted.iter().map(|a| a.id).collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn in_use_alarms_lead_the_sorted_list(list in arb_list(8), now in arb_now()) {
        let sorted = sorted_alarms(&list, now);
        let first_idle = sorted.iter().position(|a| !a.is_in_use()).unwrap_or(sorted.len());
        prop_assert!(sorted[first_idle..].iter().all(|a| !a.is_in_use()));
    }

    #[test]
    fn insertion_index_agrees_with_resort(
        list in arb_list(8),
        new in arb_alarm(100),
        now in arb_now(),
    ) {
        let sorted = sorted_alarms(&list, now);
        let index = insertion_index(&sorted, &new, now);

        let mut appended = sorted.clone();
        appended.push(new.clone());
        let resorted = sorted_alarms(&appended, now);
        prop_assert_eq!(resorted[index].id, new.id);
    }

    #[test]
    fn insertion_index_of_moved_alarm_ignores_old_entry(
        list in arb_list(8).prop_filter("non-empty", |l| !l.is_empty()),
        pick in any::<prop::sample::Index>(),
        moved in arb_alarm(0),
        now in arb_now(),
    ) {
        let sorted = sorted_alarms(&list, now);
        let old = &sorted[pick.index(sorted.len())];
        let moved = Alarm { id: old.id, ..moved };

        let mut others: Vec<Alarm> = sorted.iter().filter(|a| a.id != moved.id).cloned().collect();
        let index = insertion_index(&sorted, &moved, now);
        others.push(moved.clone());
        let resorted = sorted_alarms(&others, now);
        prop_assert_eq!(resorted[index].id, moved.id);
    }

    #[test]
    fn dismiss_is_idempotent(a in arb_alarm(1), day in 0usize..7) {
        let today = Day::ALL[day];
        let mut once = a.clone();
        once.dismiss(today);
        let mut twice = a;
        twice.dismiss(today);
        twice.dismiss(today);
        prop_assert_eq!(once, twice);
    }
}
