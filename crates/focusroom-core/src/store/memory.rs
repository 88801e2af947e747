//! In-process store.
//!
//! Used for `backend = "memory"` and throughout the tests. Either half can be
//! switched offline to simulate an unreachable remote.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{SessionStore, SettingsStore};
use crate::error::StoreError;
use crate::session::Session;
use crate::settings::TimerSettings;

#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<Session>>,
    settings: Mutex<Option<TimerSettings>>,
    next_id: AtomicI64,
    sessions_offline: AtomicBool,
    settings_offline: AtomicBool,
    put_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with sessions (ids are assigned).
    pub fn with_sessions(sessions: impl IntoIterator<Item = Session>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            for mut s in sessions {
                s.id = Some(store.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                guard.push(s);
            }
        }
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.set_sessions_offline(offline);
        self.set_settings_offline(offline);
    }

    pub fn set_sessions_offline(&self, offline: bool) {
        self.sessions_offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_settings_offline(&self, offline: bool) {
        self.settings_offline.store(offline, Ordering::SeqCst);
    }

    /// Everything stored so far, in insertion order.
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stored settings, without the get-or-create behaviour of [`SettingsStore::get`].
    pub fn stored_settings(&self) -> Option<TimerSettings> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of `put` calls that reached the store, successful or not.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, mut session: Session) -> Result<Session, StoreError> {
        Self::check(&self.sessions_offline)?;
        session.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session.clone());
        Ok(session)
    }

    async fn list_for_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Session>, StoreError> {
        Self::check(&self.sessions_offline)?;
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.date >= start && s.date <= end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self) -> Result<TimerSettings, StoreError> {
        Self::check(&self.settings_offline)?;
        let mut guard = self.settings.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(*guard.get_or_insert_with(TimerSettings::default))
    }

    async fn put(&self, settings: TimerSettings) -> Result<TimerSettings, StoreError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.settings_offline)?;
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings);
        Ok(settings)
    }
}
