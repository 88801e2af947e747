//! Database schema migrations for focusroom.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )?;

    let current_version = schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Returns 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0)) {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: session log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            date             TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
            kind             TEXT NOT NULL CHECK (kind IN ('work', 'break')),
            completed        INTEGER NOT NULL DEFAULT 1,
            completed_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);
        CREATE INDEX IF NOT EXISTS idx_sessions_date_kind ON sessions(date, kind);",
    )?;
    set_schema_version(conn, 1)
}

/// Migration v2: single-row timer settings document.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS timer_settings (
            id                         INTEGER PRIMARY KEY CHECK (id = 1),
            focus_minutes              INTEGER NOT NULL,
            short_break_minutes        INTEGER NOT NULL,
            long_break_minutes         INTEGER NOT NULL,
            long_break_after           INTEGER NOT NULL,
            sound_enabled              INTEGER NOT NULL,
            transition_sound_enabled   INTEGER NOT NULL,
            pause_resume_sound_enabled INTEGER NOT NULL,
            updated_at                 TEXT NOT NULL
        );",
    )?;
    set_schema_version(conn, 2)
}
