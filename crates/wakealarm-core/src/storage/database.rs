//! SQLite-based alarm storage.
//!
//! Provides persistent storage for:
//! - Alarms, one column per field
//! - Pending platform triggers, one per alarm

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{data_dir, migrations};
use crate::alarm::{Alarm, AlarmEdit, MediaType};
use crate::calendar::DaySet;
use crate::error::{AlarmError, DatabaseError, Result};
use crate::store::{AlarmStore, TriggerScheduler};

const FIRE_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ALARM_COLUMNS: &str = "id, is_enabled, is_active, time_active, snooze_count, hour, minute,
    snooze_hour, snooze_minute, days, repeat, vibrate, use_nfc, nfc_tag_id, media_type,
    media_path, media_title, volume, audio_source, name, use_tts, tts_frequency,
    use_dismiss_early, dismiss_early_time, time_of_dismiss_early_alarm";

/// SQLite database for alarms and their pending triggers.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/wakealarm.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("wakealarm.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Persist a single edited field of a stored alarm, touching only the
    /// column(s) of that field.
    ///
    /// # Errors
    /// [`AlarmError::NotFound`] for an unknown id, [`AlarmError::InvalidTime`]
    /// for an out-of-range time edit.
    fn update_field(&self, id: i64, edit: &AlarmEdit) -> Result<Alarm> {
        let mut alarm = self.load(id)?.ok_or(AlarmError::NotFound(id))?;
        alarm.apply(edit)?;

        let a = &alarm;
        match edit {
            AlarmEdit::Enabled(_) => self.update_column(id, "is_enabled", &a.is_enabled)?,
            AlarmEdit::Time { .. } => {
                self.conn.execute(
                    "UPDATE alarms SET hour = ?2, minute = ?3 WHERE id = ?1",
                    params![id, a.hour, a.minute],
                )?;
            }
            AlarmEdit::Days(_) => self.update_column(id, "days", &a.days.value())?,
            AlarmEdit::Repeat(_) => self.update_column(id, "repeat", &a.repeat)?,
            AlarmEdit::Vibrate(_) => self.update_column(id, "vibrate", &a.vibrate)?,
            AlarmEdit::UseNfc(_) => self.update_column(id, "use_nfc", &a.use_nfc)?,
            AlarmEdit::NfcTagId(_) => self.update_column(id, "nfc_tag_id", &a.nfc_tag_id)?,
            AlarmEdit::Media { .. } => {
                self.conn.execute(
                    "UPDATE alarms SET media_type = ?2, media_path = ?3, media_title = ?4
                     WHERE id = ?1",
                    params![id, a.media_type.code(), a.media_path, a.media_title],
                )?;
            }
            AlarmEdit::Volume(_) => self.update_column(id, "volume", &a.volume)?,
            AlarmEdit::AudioSource(_) => {
                self.update_column(id, "audio_source", &a.audio_source)?
            }
            AlarmEdit::Name(_) => self.update_column(id, "name", &a.name)?,
            AlarmEdit::UseTts(_) => self.update_column(id, "use_tts", &a.use_tts)?,
            AlarmEdit::TtsFrequency(_) => {
                self.update_column(id, "tts_frequency", &a.tts_frequency)?
            }
            AlarmEdit::DismissEarly { .. } => {
                self.conn.execute(
                    "UPDATE alarms SET use_dismiss_early = ?2, dismiss_early_time = ?3
                     WHERE id = ?1",
                    params![id, a.use_dismiss_early, a.dismiss_early_time],
                )?;
            }
        }
        debug!(alarm_id = id, ?edit, "alarm edited");
        Ok(alarm)
    }

    // `column` is always one of the literals above.
    fn update_column(&self, id: i64, column: &str, value: &dyn rusqlite::ToSql) -> Result<()> {
        self.conn.execute(
            &format!("UPDATE alarms SET {column} = ?2 WHERE id = ?1"),
            params![id, value],
        )?;
        Ok(())
    }

    /// Scheduled triggers, soonest first.
    pub fn pending_triggers(&self) -> Result<Vec<(i64, NaiveDateTime)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT alarm_id, fire_at FROM triggers ORDER BY fire_at, alarm_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut triggers = Vec::new();
        for row in rows {
            let (id, fire_at) = row?;
            let at = NaiveDateTime::parse_from_str(&fire_at, FIRE_AT_FORMAT).map_err(|e| {
                DatabaseError::QueryFailed(format!("bad fire_at '{fire_at}' for alarm {id}: {e}"))
            })?;
            triggers.push((id, at));
        }
        Ok(triggers)
    }

    pub fn trigger_for(&self, id: i64) -> Result<Option<NaiveDateTime>> {
        Ok(self
            .pending_triggers()?
            .into_iter()
            .find(|(alarm_id, _)| *alarm_id == id)
            .map(|(_, at)| at))
    }
}

fn alarm_from_row(row: &Row<'_>) -> rusqlite::Result<Alarm> {
    Ok(Alarm {
        id: row.get(0)?,
        is_enabled: row.get(1)?,
        is_active: row.get(2)?,
        time_active: row.get(3)?,
        snooze_count: row.get(4)?,
        hour: row.get(5)?,
        minute: row.get(6)?,
        snooze_hour: row.get(7)?,
        snooze_minute: row.get(8)?,
        days: DaySet::from_value(row.get(9)?),
        repeat: row.get(10)?,
        vibrate: row.get(11)?,
        use_nfc: row.get(12)?,
        nfc_tag_id: row.get(13)?,
        media_type: MediaType::from_code(row.get(14)?),
        media_path: row.get(15)?,
        media_title: row.get(16)?,
        volume: row.get(17)?,
        audio_source: row.get(18)?,
        name: row.get(19)?,
        use_tts: row.get(20)?,
        tts_frequency: row.get(21)?,
        use_dismiss_early: row.get(22)?,
        dismiss_early_time: row.get(23)?,
        time_of_dismiss_early_alarm: row.get(24)?,
    })
}

impl AlarmStore for Database {
    fn load(&self, id: i64) -> Result<Option<Alarm>> {
        let alarm = self
            .conn
            .query_row(
                &format!("SELECT {ALARM_COLUMNS} FROM alarms WHERE id = ?1"),
                params![id],
                alarm_from_row,
            )
            .optional()?;
        Ok(alarm)
    }

    fn save(&self, alarm: &mut Alarm) -> Result<i64> {
        alarm.validate()?;
        let id = (alarm.id != 0).then_some(alarm.id);
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO alarms ({ALARM_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)"
            ),
            params![
                id,
                alarm.is_enabled,
                alarm.is_active,
                alarm.time_active,
                alarm.snooze_count,
                alarm.hour,
                alarm.minute,
                alarm.snooze_hour,
                alarm.snooze_minute,
                alarm.days.value(),
                alarm.repeat,
                alarm.vibrate,
                alarm.use_nfc,
                alarm.nfc_tag_id,
                alarm.media_type.code(),
                alarm.media_path,
                alarm.media_title,
                alarm.volume,
                alarm.audio_source,
                alarm.name,
                alarm.use_tts,
                alarm.tts_frequency,
                alarm.use_dismiss_early,
                alarm.dismiss_early_time,
                alarm.time_of_dismiss_early_alarm,
            ],
        )?;
        if alarm.id == 0 {
            alarm.id = self.conn.last_insert_rowid();
        }
        Ok(alarm.id)
    }

    fn delete(&self, id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM alarms WHERE id = ?1", params![id])?;
        tx.execute("DELETE FROM triggers WHERE alarm_id = ?1", params![id])?;
        tx.commit()?;
        if removed == 0 {
            return Err(AlarmError::NotFound(id).into());
        }
        Ok(())
    }

    fn apply_edit(&self, id: i64, edit: &AlarmEdit) -> Result<Alarm> {
        self.update_field(id, edit)
    }

    fn list_all(&self) -> Result<Vec<Alarm>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ALARM_COLUMNS} FROM alarms ORDER BY id"))?;
        let rows = stmt.query_map([], alarm_from_row)?;
        let mut alarms = Vec::new();
        for row in rows {
            alarms.push(row?);
        }
        Ok(alarms)
    }
}

impl TriggerScheduler for Database {
    fn schedule_trigger(&self, id: i64, at: NaiveDateTime) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO triggers (alarm_id, fire_at) VALUES (?1, ?2)",
            params![id, at.format(FIRE_AT_FORMAT).to_string()],
        )?;
        debug!(alarm_id = id, at = %at, "trigger scheduled");
        Ok(())
    }

    fn cancel_trigger(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM triggers WHERE alarm_id = ?1", params![id])?;
        debug!(alarm_id = id, "trigger cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Day;
    use crate::error::CoreError;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample() -> Alarm {
        Alarm {
            hour: 6,
            minute: 45,
            days: [Day::Monday, Day::Wednesday].into_iter().collect(),
            vibrate: true,
            media_type: MediaType::Ringtone,
            media_path: "bell".into(),
            name: "Early".into(),
            ..Alarm::default()
        }
    }

    #[test]
    fn save_assigns_id_and_loads_back() {
        let db = Database::open_memory().unwrap();
        let mut alarm = sample();
        let id = db.save(&mut alarm).unwrap();
        assert!(id > 0);
        assert_eq!(alarm.id, id);
        assert_eq!(db.load(id).unwrap(), Some(alarm));
    }

    #[test]
    fn save_updates_existing_row() {
        let db = Database::open_memory().unwrap();
        let mut alarm = sample();
        db.save(&mut alarm).unwrap();
        alarm.snooze_count = 2;
        alarm.snooze_hour = 7;
        alarm.snooze_minute = 0;
        db.save(&mut alarm).unwrap();
        assert_eq!(db.list_all().unwrap(), vec![alarm]);
    }

    #[test]
    fn deleted_id_is_free_again() {
        let db = Database::open_memory().unwrap();
        let mut first = sample();
        let id = db.save(&mut first).unwrap();
        db.schedule_trigger(id, at(6, 45)).unwrap();
        db.delete(id).unwrap();

        let mut second = sample();
        assert_eq!(db.save(&mut second).unwrap(), id);
        assert_eq!(db.trigger_for(id).unwrap(), None);
    }

    #[test]
    fn load_missing_is_none() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.load(99).unwrap(), None);
    }

    #[test]
    fn delete_removes_alarm_and_trigger() {
        let db = Database::open_memory().unwrap();
        let mut alarm = sample();
        let id = db.save(&mut alarm).unwrap();
        db.schedule_trigger(id, at(6, 45)).unwrap();
        db.delete(id).unwrap();
        assert!(db.list_all().unwrap().is_empty());
        assert!(db.pending_triggers().unwrap().is_empty());
        assert!(matches!(
            db.delete(id),
            Err(CoreError::Alarm(AlarmError::NotFound(_)))
        ));
    }

    #[test]
    fn apply_edit_touches_one_field() {
        let db = Database::open_memory().unwrap();
        let mut alarm = sample();
        let id = db.save(&mut alarm).unwrap();
        let edited = db.apply_edit(id, &AlarmEdit::Name("Late".into())).unwrap();
        assert_eq!(edited.name, "Late");

        let stored = db.load(id).unwrap().unwrap();
        assert_eq!(stored, Alarm { name: "Late".into(), ..alarm });
    }

    #[test]
    fn apply_edit_validates_and_reports_missing() {
        let db = Database::open_memory().unwrap();
        let mut alarm = sample();
        let id = db.save(&mut alarm).unwrap();
        assert!(db
            .apply_edit(id, &AlarmEdit::Time { hour: 25, minute: 0 })
            .is_err());
        assert_eq!(db.load(id).unwrap().unwrap().hour, 6);
        assert!(matches!(
            db.apply_edit(404, &AlarmEdit::Repeat(true)),
            Err(CoreError::Alarm(AlarmError::NotFound(404)))
        ));
    }

    #[test]
    fn triggers_replace_and_sort() {
        let db = Database::open_memory().unwrap();
        db.schedule_trigger(1, at(9, 0)).unwrap();
        db.schedule_trigger(2, at(7, 0)).unwrap();
        db.schedule_trigger(1, at(8, 0)).unwrap();
        assert_eq!(
            db.pending_triggers().unwrap(),
            vec![(2, at(7, 0)), (1, at(8, 0))]
        );
        db.cancel_trigger(2).unwrap();
        assert_eq!(db.trigger_for(2).unwrap(), None);
        assert_eq!(db.trigger_for(1).unwrap(), Some(at(8, 0)));
    }

    #[test]
    fn open_at_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.db");
        let mut alarm = sample();
        {
            let db = Database::open_at(&path).unwrap();
            db.save(&mut alarm).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.list_all().unwrap(), vec![alarm]);
    }
}
