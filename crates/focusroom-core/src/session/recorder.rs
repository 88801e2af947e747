use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{Duration, Local, NaiveDate, Utc};

use super::stats::{self, SessionStats, WeeklyBreakdown};
use super::{Session, SessionKind};
use crate::error::{Result, ValidationError};
use crate::store::SessionStore;

/// Writes completed sessions to the store and answers aggregate queries from
/// a cached window of recent sessions.
///
/// The cache only ever holds sessions the store acknowledged, so totals
/// never count a write that failed.
pub struct SessionRecorder {
    store: Arc<dyn SessionStore>,
    cache: RwLock<Vec<Session>>,
    lookback_days: u32,
    closed: AtomicBool,
}

impl SessionRecorder {
    /// `lookback_days` bounds how far back `refresh` loads for streaks.
    pub fn new(store: Arc<dyn SessionStore>, lookback_days: u32) -> Self {
        Self {
            store,
            cache: RwLock::new(Vec::new()),
            lookback_days,
            closed: AtomicBool::new(false),
        }
    }

    /// Reload the cached window ending today.
    pub async fn refresh(&self) -> Result<()> {
        self.refresh_on(Local::now().date_naive()).await
    }

    pub async fn refresh_on(&self, today: NaiveDate) -> Result<()> {
        let (week_start, week_end) = stats::week_bounds(today);
        let lookback = today - Duration::days(i64::from(self.lookback_days));
        let sessions = self
            .store
            .list_for_window(week_start.min(lookback), week_end.max(today))
            .await?;
        tracing::debug!(count = sessions.len(), "session cache refreshed");
        *self.write() = sessions;
        Ok(())
    }

    /// Persist one completed interval dated today.
    pub async fn record(&self, kind: SessionKind, duration_minutes: u32) -> Result<Session> {
        let now = Local::now();
        self.record_at(kind, duration_minutes, now.date_naive()).await
    }

    pub async fn record_at(
        &self,
        kind: SessionKind,
        duration_minutes: u32,
        date: NaiveDate,
    ) -> Result<Session> {
        if duration_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "duration_minutes".to_string(),
                message: "must be greater than zero".to_string(),
            }
            .into());
        }

        let session = Session::completed(kind, duration_minutes, date, Utc::now());
        match self.store.create(session).await {
            Ok(stored) => {
                if self.closed.load(Ordering::SeqCst) {
                    tracing::debug!("recorder closed, not caching stored session");
                } else {
                    self.write().push(stored.clone());
                }
                tracing::info!(
                    kind = kind.as_str(),
                    minutes = duration_minutes,
                    %date,
                    "session recorded"
                );
                Ok(stored)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = kind.as_str(),
                    minutes = duration_minutes,
                    "could not record session"
                );
                Err(e.into())
            }
        }
    }

    /// Stop folding late write results into the cache.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn today_total(&self) -> u32 {
        stats::day_total(&self.read(), today())
    }

    pub fn today_count(&self) -> u32 {
        stats::day_count(&self.read(), today())
    }

    pub fn week_total(&self) -> u32 {
        stats::week_total(&self.read(), today())
    }

    pub fn weekly_by_day(&self) -> WeeklyBreakdown {
        stats::weekly_by_day(&self.read(), today())
    }

    pub fn current_streak(&self) -> u32 {
        stats::streak(&self.read(), today())
    }

    pub fn summary(&self) -> SessionStats {
        self.summary_on(today())
    }

    pub fn summary_on(&self, today: NaiveDate) -> SessionStats {
        stats::summarize(&self.read(), today)
    }

    pub fn weekly_by_day_on(&self, today: NaiveDate) -> WeeklyBreakdown {
        stats::weekly_by_day(&self.read(), today)
    }

    /// Cached sessions, oldest first.
    pub fn sessions(&self) -> Vec<Session> {
        self.read().clone()
    }

    /// Work minutes across the whole log. Always asks the store.
    pub async fn all_time_total(&self) -> Result<u32> {
        let (first, last) = all_time_window();
        let sessions = self.store.list_for_window(first, last).await?;
        Ok(sessions
            .iter()
            .filter(|s| s.counts_as_work())
            .map(|s| s.duration_minutes)
            .sum())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Session>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Session>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Four-digit years only, so textual date comparisons stay ordered.
pub(crate) fn all_time_window() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN),
        NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
    )
}
