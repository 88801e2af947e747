//! Keeps the local settings copy and the store of record in agreement.
//!
//! The local copy is authoritative while the store is unreachable. A local
//! edit that has not reached the store is never replaced by a remote read;
//! it is pushed again instead.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{TimerSettings, TimerSettingsPatch};
use crate::error::{Result, ValidationError};
use crate::store::SettingsStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SyncStatus {
    /// Local copy matches the store.
    Synced { at: DateTime<Utc> },
    /// A local edit is on its way to the store.
    Pending,
    /// The last exchange with the store failed.
    Unsynced { reason: String },
}

impl SyncStatus {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncStatus::Synced { .. })
    }
}

#[derive(Debug)]
struct LocalCopy {
    settings: TimerSettings,
    /// Bumped on every local edit.
    revision: u64,
    /// Revision last confirmed by the store.
    synced_revision: Option<u64>,
    status: SyncStatus,
}

impl LocalCopy {
    fn has_unsynced_edits(&self) -> bool {
        self.revision > 0 && self.synced_revision != Some(self.revision)
    }
}

pub struct SettingsSynchronizer {
    store: Arc<dyn SettingsStore>,
    local: RwLock<LocalCopy>,
    push_lock: Mutex<()>,
}

impl SettingsSynchronizer {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            local: RwLock::new(LocalCopy {
                settings: TimerSettings::default(),
                revision: 0,
                synced_revision: None,
                status: SyncStatus::Unsynced {
                    reason: "not loaded yet".to_string(),
                },
            }),
            push_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> TimerSettings {
        self.read().settings
    }

    pub fn status(&self) -> SyncStatus {
        self.read().status.clone()
    }

    /// Fetch the stored settings, falling back to the local copy.
    ///
    /// Unsynced local edits win over whatever the store holds and are pushed
    /// again. A failed fetch leaves the local copy in place (defaults on first
    /// use) and marks the status unsynced.
    pub async fn load(&self) -> TimerSettings {
        let revision = {
            let local = self.read();
            if local.has_unsynced_edits() {
                None
            } else {
                Some(local.revision)
            }
        };

        let Some(revision) = revision else {
            tracing::info!("local settings not yet stored, pushing them instead of loading");
            if let Err(e) = self.push().await {
                tracing::debug!(error = %e, "settings push during load failed");
            }
            return self.current();
        };

        match self.store.get().await {
            Ok(remote) => {
                let mut local = self.write();
                if local.revision != revision {
                    tracing::debug!("settings edited while loading, keeping local copy");
                } else if let Err(e) = remote.validate() {
                    tracing::warn!(error = %e, "stored settings are invalid, keeping local copy");
                    local.status = SyncStatus::Unsynced {
                        reason: e.to_string(),
                    };
                } else {
                    local.settings = remote;
                    local.synced_revision = Some(local.revision);
                    local.status = SyncStatus::Synced { at: Utc::now() };
                }
                local.settings
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load settings, using local copy");
                let mut local = self.write();
                if !local.has_unsynced_edits() {
                    local.status = SyncStatus::Unsynced {
                        reason: e.to_string(),
                    };
                }
                local.settings
            }
        }
    }

    /// Validate and merge `patch` into the local copy without touching the
    /// store. Returns the merged settings.
    pub fn apply_local(&self, patch: &TimerSettingsPatch) -> Result<TimerSettings, ValidationError> {
        let mut local = self.write();
        let merged = local.settings.merged(patch);
        merged.validate()?;
        local.settings = merged;
        local.revision += 1;
        local.status = SyncStatus::Pending;
        Ok(merged)
    }

    /// Merge `patch` locally, then push the result.
    ///
    /// The local copy keeps the new values even when the push fails.
    pub async fn update(&self, patch: &TimerSettingsPatch) -> Result<TimerSettings> {
        self.apply_local(patch)?;
        self.push().await
    }

    /// Push the latest local edit to the store.
    ///
    /// Does nothing when there is no local edit waiting; the local copy may
    /// still be the built-in defaults and must not replace stored values.
    pub async fn push(&self) -> Result<TimerSettings> {
        let _serial = self.push_lock.lock().await;

        let (settings, revision) = {
            let local = self.read();
            if !local.has_unsynced_edits() {
                return Ok(local.settings);
            }
            (local.settings, local.revision)
        };

        match self.store.put(settings).await {
            Ok(stored) => {
                let mut local = self.write();
                if local.revision == revision {
                    if stored != settings && stored.validate().is_ok() {
                        local.settings = stored;
                    }
                    local.synced_revision = Some(revision);
                    local.status = SyncStatus::Synced { at: Utc::now() };
                }
                tracing::info!(revision, "settings stored");
                Ok(local.settings)
            }
            Err(e) => {
                tracing::warn!(error = %e, revision, "could not store settings, keeping local copy");
                let mut local = self.write();
                if local.revision == revision {
                    local.status = SyncStatus::Unsynced {
                        reason: e.to_string(),
                    };
                }
                Err(e.into())
            }
        }
    }

    /// Try again after a failed push or load.
    ///
    /// Pushes a pending local edit if there is one, otherwise reloads.
    pub async fn retry(&self) -> Result<TimerSettings> {
        if self.read().has_unsynced_edits() {
            self.push().await
        } else {
            Ok(self.load().await)
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LocalCopy> {
        self.local.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LocalCopy> {
        self.local.write().unwrap_or_else(PoisonError::into_inner)
    }
}
