//! SQLite-backed store of record.
//!
//! Provides persistent storage for:
//! - Completed sessions (append-only)
//! - The user's timer settings (single row)
//!
//! `rusqlite::Connection` is blocking, so every call hops onto the blocking
//! pool and never runs on the tick path.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{data_dir, migrations};
use crate::error::{CoreError, StoreError};
use crate::session::{Session, SessionKind};
use crate::settings::TimerSettings;
use crate::store::{SessionStore, SettingsStore};

/// SQLite database for sessions and settings.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open the database at `~/.config/focusroom/focusroom.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_default() -> Result<Self, CoreError> {
        Self::open(&data_dir()?.join("focusroom.db"))
    }

    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(StoreError::from)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, CoreError> {
        migrations::migrate(&conn).map_err(StoreError::from)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard)
        })
        .await?
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let kind: String = row.get(3)?;
    let kind = SessionKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown session kind '{kind}'").into(),
        )
    })?;
    Ok(Session {
        id: Some(row.get(0)?),
        date: row.get(1)?,
        duration_minutes: row.get(2)?,
        kind,
        completed: row.get(4)?,
        completed_at: row.get(5)?,
    })
}

fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<TimerSettings> {
    Ok(TimerSettings {
        focus_minutes: row.get(0)?,
        short_break_minutes: row.get(1)?,
        long_break_minutes: row.get(2)?,
        long_break_after: row.get(3)?,
        sound_enabled: row.get(4)?,
        transition_sound_enabled: row.get(5)?,
        pause_resume_sound_enabled: row.get(6)?,
    })
}

fn write_settings(conn: &Connection, s: &TimerSettings) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO timer_settings (
            id, focus_minutes, short_break_minutes, long_break_minutes, long_break_after,
            sound_enabled, transition_sound_enabled, pause_resume_sound_enabled, updated_at
         ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            focus_minutes = excluded.focus_minutes,
            short_break_minutes = excluded.short_break_minutes,
            long_break_minutes = excluded.long_break_minutes,
            long_break_after = excluded.long_break_after,
            sound_enabled = excluded.sound_enabled,
            transition_sound_enabled = excluded.transition_sound_enabled,
            pause_resume_sound_enabled = excluded.pause_resume_sound_enabled,
            updated_at = excluded.updated_at",
        params![
            s.focus_minutes,
            s.short_break_minutes,
            s.long_break_minutes,
            s.long_break_after,
            s.sound_enabled,
            s.transition_sound_enabled,
            s.pause_resume_sound_enabled,
            Utc::now(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO sessions (date, duration_minutes, kind, completed, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    session.date,
                    session.duration_minutes,
                    session.kind.as_str(),
                    session.completed,
                    session.completed_at,
                ],
            )?;
            Ok(Session {
                id: Some(conn.last_insert_rowid()),
                ..session
            })
        })
        .await
    }

    async fn list_for_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Session>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, date, duration_minutes, kind, completed, completed_at
                 FROM sessions
                 WHERE date >= ?1 AND date <= ?2
                 ORDER BY completed_at, id",
            )?;
            let rows = stmt.query_map(params![start, end], session_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }
}

#[async_trait]
impl SettingsStore for SqliteStore {
    async fn get(&self) -> Result<TimerSettings, StoreError> {
        self.with_conn(|conn| {
            let existing = conn
                .query_row(
                    "SELECT focus_minutes, short_break_minutes, long_break_minutes, long_break_after,
                            sound_enabled, transition_sound_enabled, pause_resume_sound_enabled
                     FROM timer_settings WHERE id = 1",
                    [],
                    settings_from_row,
                )
                .optional()?;
            match existing {
                Some(settings) => Ok(settings),
                None => {
                    let defaults = TimerSettings::default();
                    write_settings(conn, &defaults)?;
                    Ok(defaults)
                }
            }
        })
        .await
    }

    async fn put(&self, settings: TimerSettings) -> Result<TimerSettings, StoreError> {
        self.with_conn(move |conn| {
            write_settings(conn, &settings)?;
            Ok(settings)
        })
        .await
    }
}
