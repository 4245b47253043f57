//! Alarm service: applies lifecycle transitions and keeps storage and the
//! platform triggers in step with them.

use chrono::{Duration, NaiveDateTime, Utc};
use tracing::info;

use crate::alarm::{self, Alarm, AlarmBuilder, AlarmEdit};
use crate::calendar::Day;
use crate::error::{AlarmError, Result};
use crate::events::Event;
use crate::settings::{AlarmDefaults, AlarmSettings};
use crate::store::{AlarmStore, TriggerScheduler};

/// Drives alarms through their lifecycle on top of a store and a trigger
/// scheduler.
///
/// Every transition is persisted, and the alarm's trigger is rescheduled
/// (enabled) or cancelled (disabled), before the call returns.
pub struct AlarmService<S, T> {
    store: S,
    scheduler: T,
    settings: AlarmSettings,
    defaults: AlarmDefaults,
}

impl<S: AlarmStore, T: TriggerScheduler> AlarmService<S, T> {
    pub fn new(store: S, scheduler: T, settings: AlarmSettings) -> Self {
        Self {
            store,
            scheduler,
            settings,
            defaults: AlarmDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: AlarmDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn settings(&self) -> &AlarmSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Builder seeded with the configured defaults.
    pub fn builder(&self, now: NaiveDateTime) -> AlarmBuilder {
        AlarmBuilder::from_defaults(&self.defaults, now)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// # Errors
    /// [`AlarmError::NotFound`] for an unknown id.
    pub fn get(&self, id: i64) -> Result<Alarm> {
        Ok(self.store.load(id)?.ok_or(AlarmError::NotFound(id))?)
    }

    pub fn sorted(&self, now: NaiveDateTime) -> Result<Vec<Alarm>> {
        Ok(alarm::sorted_alarms(&self.store.list_all()?, now))
    }

    /// The alarm that governs notifications right now.
    pub fn next_alarm(&self, now: NaiveDateTime) -> Result<Option<Alarm>> {
        Ok(alarm::next_alarm(&self.store.list_all()?, now))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Persist a new alarm and arm its trigger.
    pub fn create(&self, mut alarm: Alarm, now: NaiveDateTime) -> Result<(Alarm, Event)> {
        alarm.id = 0;
        self.store.save(&mut alarm)?;
        self.reschedule(&alarm, now)?;
        info!(alarm_id = alarm.id, time = %alarm.sort_time(), "alarm created");
        let event = Event::AlarmCreated {
            alarm_id: alarm.id,
            next_run: upcoming(&alarm, now),
            at: Utc::now(),
        };
        Ok((alarm, event))
    }

    /// Store an alarm decoded from elsewhere as a new alarm.
    pub fn import(&self, alarm: &Alarm, now: NaiveDateTime) -> Result<(Alarm, Event)> {
        self.create(alarm.copy(), now)
    }

    pub fn edit(&self, id: i64, edit: &AlarmEdit, now: NaiveDateTime) -> Result<Alarm> {
        let alarm = self.store.apply_edit(id, edit)?;
        self.reschedule(&alarm, now)?;
        Ok(alarm)
    }

    pub fn delete(&self, id: i64) -> Result<Event> {
        self.scheduler.cancel_trigger(id)?;
        self.store.delete(id)?;
        info!(alarm_id = id, "alarm deleted");
        Ok(Event::AlarmDeleted {
            alarm_id: id,
            at: Utc::now(),
        })
    }

    /// Switching an alarm off also drops any snooze, so its trigger is
    /// always cancelled.
    pub fn set_enabled(&self, id: i64, enabled: bool, now: NaiveDateTime) -> Result<Event> {
        if !enabled {
            let mut alarm = self.get(id)?;
            alarm.disable();
            self.store.save(&mut alarm)?;
            self.scheduler.cancel_trigger(id)?;
            return Ok(Event::AlarmDisabled {
                alarm_id: id,
                at: Utc::now(),
            });
        }
        let alarm = self.store.apply_edit(id, &AlarmEdit::Enabled(true))?;
        let next_run = self.reschedule(&alarm, now)?;
        Ok(match next_run {
            Some(next_run) => Event::AlarmEnabled {
                alarm_id: id,
                next_run,
                at: Utc::now(),
            },
            None => Event::AlarmDisabled {
                alarm_id: id,
                at: Utc::now(),
            },
        })
    }

    /// The alarm's trigger fired: mark it ringing. Its pending trigger is
    /// used up.
    pub fn activate(&self, id: i64) -> Result<Event> {
        let mut alarm = self.get(id)?;
        alarm.activate();
        self.store.save(&mut alarm)?;
        self.scheduler.cancel_trigger(id)?;
        Ok(Event::AlarmActivated {
            alarm_id: id,
            at: Utc::now(),
        })
    }

    /// Store the active time a wake-up accumulated.
    pub fn record_time_active(&self, id: i64, time_active_ms: i64) -> Result<()> {
        let mut alarm = self.get(id)?;
        alarm.time_active = time_active_ms;
        self.store.save(&mut alarm)?;
        Ok(())
    }

    /// # Errors
    /// [`AlarmError::InvalidSnooze`] once the snooze limit is reached; the
    /// stored alarm and its trigger are left as they were.
    pub fn snooze(&self, id: i64, now: NaiveDateTime) -> Result<Event> {
        let mut alarm = self.get(id)?;
        let until = alarm.snooze(&self.settings, now)?;
        self.store.save(&mut alarm)?;
        self.scheduler.schedule_trigger(id, until)?;
        Ok(Event::AlarmSnoozed {
            alarm_id: id,
            snooze_count: alarm.snooze_count,
            until,
            at: Utc::now(),
        })
    }

    pub fn dismiss(&self, id: i64, now: NaiveDateTime) -> Result<Event> {
        let mut alarm = self.get(id)?;
        alarm.dismiss(Day::of(now));
        self.store.save(&mut alarm)?;
        let next_run = self.reschedule(&alarm, now)?;
        Ok(Event::AlarmDismissed {
            alarm_id: id,
            next_run,
            at: Utc::now(),
        })
    }

    pub fn dismiss_early(&self, id: i64, now: NaiveDateTime) -> Result<Event> {
        let mut alarm = self.get(id)?;
        alarm.dismiss_early(now);
        self.store.save(&mut alarm)?;
        self.reschedule(&alarm, now)?;
        Ok(Event::AlarmDismissedEarly {
            alarm_id: id,
            at: Utc::now(),
        })
    }

    /// Bring the alarm's trigger in line with its state. Returns the armed
    /// instant, or `None` when the trigger was cancelled.
    fn reschedule(&self, alarm: &Alarm, now: NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        if !alarm.is_enabled && !alarm.is_snoozed() {
            self.scheduler.cancel_trigger(alarm.id)?;
            return Ok(None);
        }
        let mut at = upcoming(alarm, now);
        if alarm.was_dismissed_early(at) {
            at = upcoming(alarm, at);
        }
        self.scheduler.schedule_trigger(alarm.id, at)?;
        Ok(Some(at))
    }
}

/// Next run strictly after `now`, so a trigger is never re-armed for the
/// instant it just fired at.
fn upcoming(alarm: &Alarm, now: NaiveDateTime) -> NaiveDateTime {
    alarm.next_run(now + Duration::seconds(1))
}
