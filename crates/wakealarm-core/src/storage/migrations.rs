//! Database schema migrations for wakealarm.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{info, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < SCHEMA_VERSION {
        info!(from = current_version, to = SCHEMA_VERSION, "database migrated");
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: alarms and pending triggers.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS alarms (
            id            INTEGER PRIMARY KEY,
            is_enabled    INTEGER NOT NULL DEFAULT 1,
            is_active     INTEGER NOT NULL DEFAULT 0,
            time_active   INTEGER NOT NULL DEFAULT 0,
            snooze_count  INTEGER NOT NULL DEFAULT 0,
            hour          INTEGER NOT NULL,
            minute        INTEGER NOT NULL,
            snooze_hour   INTEGER NOT NULL DEFAULT -1,
            snooze_minute INTEGER NOT NULL DEFAULT -1,
            days          INTEGER NOT NULL DEFAULT 0,
            repeat        INTEGER NOT NULL DEFAULT 0,
            vibrate       INTEGER NOT NULL DEFAULT 0,
            use_nfc       INTEGER NOT NULL DEFAULT 0,
            nfc_tag_id    TEXT NOT NULL DEFAULT '',
            media_type    INTEGER NOT NULL DEFAULT 0,
            media_path    TEXT NOT NULL DEFAULT '',
            media_title   TEXT NOT NULL DEFAULT '',
            volume        INTEGER NOT NULL DEFAULT 0,
            audio_source  TEXT NOT NULL DEFAULT 'Media',
            name          TEXT NOT NULL DEFAULT '',
            use_tts       INTEGER NOT NULL DEFAULT 0,
            tts_frequency INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS triggers (
            alarm_id INTEGER PRIMARY KEY,
            fire_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_triggers_fire_at ON triggers(fire_at);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: dismiss-early columns.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "ALTER TABLE alarms ADD COLUMN use_dismiss_early INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE alarms ADD COLUMN dismiss_early_time INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE alarms ADD COLUMN time_of_dismiss_early_alarm INTEGER NOT NULL DEFAULT 0;",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);

        conn.execute(
            "INSERT INTO alarms (hour, minute) VALUES (7, 30)",
            [],
        )
        .unwrap();
        let (snooze_hour, dismiss_early): (i32, i64) = conn
            .query_row(
                "SELECT snooze_hour, time_of_dismiss_early_alarm FROM alarms",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(snooze_hour, -1);
        assert_eq!(dismiss_early, 0);
    }

    /// Test that migrations are idempotent
    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    /// Test incremental migration (v1 -> v2) keeps existing rows
    #[test]
    fn test_incremental_migration() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO alarms (hour, minute, name) VALUES (6, 0, 'old')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);

        let (name, use_dismiss_early): (String, bool) = conn
            .query_row(
                "SELECT name, use_dismiss_early FROM alarms",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(name, "old");
        assert!(!use_dismiss_early);
    }
}
