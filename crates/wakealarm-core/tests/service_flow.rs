//! End-to-end flows through the alarm service, backed by SQLite and a TOML
//! config on disk.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::runtime::Handle;
use tokio::time::timeout;

use wakealarm_core::alarm::codec;
use wakealarm_core::wakeup::{AudioAttributes, Devices, MediaPlayer, SpeechEngine};
use wakealarm_core::{
    Alarm, AlarmError, AlarmService, AlarmStore, Config, CoreError, Database, Day, DaySet,
    Event, WakeUpSession, WakeUpSignal,
};

/// 2024-01-03 is a Wednesday.
fn wednesday(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 3)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

struct Silent;

impl MediaPlayer for Silent {
    fn play(&mut self, _: &Alarm, _: bool, _: bool) -> Result<(), AlarmError> {
        Ok(())
    }
    fn stop(&mut self) {}
    fn release(&mut self) {}
}

impl SpeechEngine for Silent {
    fn speak(&mut self, _: &str, _: &AudioAttributes) -> Result<(), AlarmError> {
        Ok(())
    }
    fn is_speaking(&self) -> bool {
        false
    }
    fn has_pending_buffer(&self) -> bool {
        false
    }
    fn stop(&mut self) {}
    fn shutdown(&mut self) {}
}

fn silent_devices() -> Devices {
    Devices {
        media: Box::new(Silent),
        speech: Box::new(Silent),
        vibrator: None,
        vibrator_provider: None,
    }
}

#[test]
fn configured_limits_flow_into_the_service() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::load_from(&dir.path().join("config.toml")).unwrap();
    config.update("snooze.max_snooze", "1").unwrap();
    config.update("snooze.duration_min", "9").unwrap();
    config.update("defaults.vibrate", "true").unwrap();

    let db = Database::open_at(&dir.path().join("wakealarm.db")).unwrap();
    let svc = AlarmService::new(&db, &db, config.settings()).with_defaults(config.defaults.clone());

    let alarm = svc.builder(wednesday(5, 0)).time(6, 30).build().unwrap();
    assert!(alarm.vibrate);
    let (alarm, _) = svc.create(alarm, wednesday(5, 0)).unwrap();

    svc.activate(alarm.id).unwrap();
    let event = svc.snooze(alarm.id, wednesday(6, 30)).unwrap();
    assert!(matches!(event, Event::AlarmSnoozed { until, .. } if until == wednesday(6, 39)));
    assert!(matches!(
        svc.snooze(alarm.id, wednesday(6, 39)),
        Err(CoreError::Alarm(AlarmError::InvalidSnooze { .. }))
    ));

    let stored = svc.get(alarm.id).unwrap();
    assert!(stored.is_in_use());
    assert_eq!((stored.snooze_hour, stored.snooze_minute), (6, 39));
}

#[test]
fn sorted_and_next_alarm_follow_lifecycle() {
    let db = Database::open_memory().unwrap();
    let svc = AlarmService::new(&db, &db, Config::default().settings());
    let now = wednesday(12, 0);

    let (late, _) = svc
        .create(svc.builder(now).time(23, 0).build().unwrap(), now)
        .unwrap();
    let (early, _) = svc
        .create(svc.builder(now).time(13, 0).build().unwrap(), now)
        .unwrap();
    let (off, _) = svc
        .create(svc.builder(now).time(0, 1).build().unwrap(), now)
        .unwrap();
    svc.set_enabled(off.id, false, now).unwrap();

    let ids: Vec<i64> = svc.sorted(now).unwrap().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![early.id, late.id, off.id]);

    svc.activate(late.id).unwrap();
    assert_eq!(svc.next_alarm(now).unwrap().map(|a| a.id), Some(late.id));

    svc.dismiss(late.id, wednesday(23, 1)).unwrap();
    assert_eq!(svc.next_alarm(now).unwrap().map(|a| a.id), Some(early.id));
}

#[test]
fn exported_alarm_imports_as_new_row() {
    let db = Database::open_memory().unwrap();
    let svc = AlarmService::new(&db, &db, Config::default().settings());
    let now = wednesday(8, 0);
    let alarm = svc
        .builder(now)
        .time(9, 15)
        .days([Day::Monday, Day::Friday].into_iter().collect())
        .name("Standup\nprep")
        .build()
        .unwrap();
    let (alarm, _) = svc.create(alarm, now).unwrap();

    let text = codec::encode_text(&alarm);
    let decoded = codec::decode_text(&text).unwrap();
    assert_eq!(decoded, alarm);

    let (copy, _) = svc.import(&decoded, now).unwrap();
    assert_ne!(copy.id, alarm.id);
    assert_eq!(copy.name_normalized(), "Standup prep");
    assert_eq!(db.list_all().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn auto_dismissed_wake_up_is_persisted() {
    let db = Database::open_memory().unwrap();
    let mut config = Config::default();
    config.update("dismiss.auto_dismiss_min", "2").unwrap();
    let svc = AlarmService::new(&db, &db, config.settings());
    let now = wednesday(6, 0);

    let alarm = svc
        .builder(now)
        .time(6, 0)
        .days(DaySet::WEEKDAYS)
        .repeat(true)
        .build()
        .unwrap();
    let (alarm, _) = svc.create(alarm, wednesday(5, 0)).unwrap();
    svc.activate(alarm.id).unwrap();

    let mut session = WakeUpSession::new(Handle::current());
    let (_, mut signals) = session.begin(svc.get(alarm.id).unwrap(), *svc.settings(), silent_devices());

    let signal = timeout(Duration::from_secs(120), signals.recv())
        .await
        .unwrap()
        .unwrap();
    let WakeUpSignal::AutoDismiss(rung) = signal;
    assert_eq!(rung.id, alarm.id);

    session.finish();
    let event = svc.dismiss(rung.id, wednesday(6, 2)).unwrap();
    let thursday = wednesday(6, 0) + chrono::Duration::days(1);
    assert!(matches!(event, Event::AlarmDismissed { next_run: Some(at), .. } if at == thursday));
    assert_eq!(db.trigger_for(alarm.id).unwrap(), Some(thursday));

    let stored = svc.get(alarm.id).unwrap();
    assert!(!stored.is_in_use());
    assert!(stored.is_enabled);
}
