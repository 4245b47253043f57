//! Seams to persistence and platform trigger scheduling.
//!
//! The alarm service only talks to these traits. [`Database`](crate::Database)
//! implements both; tests can plug in in-memory versions.

use chrono::NaiveDateTime;

use crate::alarm::{Alarm, AlarmEdit};
use crate::error::{AlarmError, Result};

pub trait AlarmStore {
    fn load(&self, id: i64) -> Result<Option<Alarm>>;

    /// Insert or update. A new alarm (id 0) gets its id assigned.
    fn save(&self, alarm: &mut Alarm) -> Result<i64>;

    fn delete(&self, id: i64) -> Result<()>;

    fn list_all(&self) -> Result<Vec<Alarm>>;

    /// Apply one field edit to a stored alarm and persist it.
    ///
    /// # Errors
    /// [`AlarmError::NotFound`] for an unknown id; whatever
    /// [`Alarm::apply`] rejects.
    fn apply_edit(&self, id: i64, edit: &AlarmEdit) -> Result<Alarm> {
        let mut alarm = self.load(id)?.ok_or(AlarmError::NotFound(id))?;
        alarm.apply(edit)?;
        self.save(&mut alarm)?;
        Ok(alarm)
    }
}

/// Arms the platform so the alarm fires at an instant even when nothing
/// else is running. At most one trigger is pending per alarm.
pub trait TriggerScheduler {
    /// Replaces any trigger already pending for `id`.
    fn schedule_trigger(&self, id: i64, at: NaiveDateTime) -> Result<()>;

    fn cancel_trigger(&self, id: i64) -> Result<()>;
}

impl<T: AlarmStore + ?Sized> AlarmStore for &T {
    fn load(&self, id: i64) -> Result<Option<Alarm>> {
        (**self).load(id)
    }

    fn save(&self, alarm: &mut Alarm) -> Result<i64> {
        (**self).save(alarm)
    }

    fn delete(&self, id: i64) -> Result<()> {
        (**self).delete(id)
    }

    fn list_all(&self) -> Result<Vec<Alarm>> {
        (**self).list_all()
    }

    fn apply_edit(&self, id: i64, edit: &AlarmEdit) -> Result<Alarm> {
        (**self).apply_edit(id, edit)
    }
}

impl<T: TriggerScheduler + ?Sized> TriggerScheduler for &T {
    fn schedule_trigger(&self, id: i64, at: NaiveDateTime) -> Result<()> {
        (**self).schedule_trigger(id, at)
    }

    fn cancel_trigger(&self, id: i64) -> Result<()> {
        (**self).cancel_trigger(id)
    }
}
