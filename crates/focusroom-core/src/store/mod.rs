//! Store boundary used by the session recorder and settings synchronizer.
//!
//! The store of record is treated as remote even when it is a local SQLite
//! file: every call can fail, and callers never assume a write landed until
//! the call returns `Ok`.

mod http;
mod memory;

pub use http::HttpStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Result, StoreError};
use crate::session::Session;
use crate::settings::TimerSettings;
use crate::storage::config::{AppConfig, StoreBackend};
use crate::storage::SqliteStore;

/// Append-only session log.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist one session, returning it as stored (with its id).
    async fn create(&self, session: Session) -> Result<Session, StoreError>;

    /// Sessions dated within `start..=end`.
    async fn list_for_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Session>, StoreError>;
}

/// Single settings document per user.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current settings; stores create defaults on first access.
    async fn get(&self) -> Result<TimerSettings, StoreError>;

    /// Overwrite the stored settings, returning what was stored.
    async fn put(&self, settings: TimerSettings) -> Result<TimerSettings, StoreError>;
}

/// Both halves of a backend, shared between the recorder and synchronizer.
#[derive(Clone)]
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    pub fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: SessionStore + SettingsStore + 'static,
    {
        Self {
            sessions: store.clone(),
            settings: store,
        }
    }

    /// Open the backend selected in the application config.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let stores = match config.store.backend {
            StoreBackend::Memory => Self::from_backend(Arc::new(MemoryStore::new())),
            StoreBackend::Sqlite => Self::from_backend(Arc::new(SqliteStore::open_default()?)),
            StoreBackend::Http => Self::from_backend(Arc::new(HttpStore::from_config(&config.store)?)),
        };
        tracing::debug!(backend = ?config.store.backend, "store opened");
        Ok(stores)
    }
}
