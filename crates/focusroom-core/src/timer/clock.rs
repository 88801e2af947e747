//! One-second tick source.
//!
//! A [`Clock`] runs a tokio interval task and calls `on_tick` once per
//! period. Ticks are delivered one at a time; a late runtime delivers the
//! missed ones back to back rather than dropping them, so no second of the
//! countdown is lost.
//!
//! Once [`Clock::stop`] returns, `on_tick` will not be called again.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

struct Running {
    /// Held while `on_tick` runs; cleared by `stop`.
    live: Arc<Mutex<bool>>,
    cancel: CancellationToken,
}

pub struct Clock {
    period: Duration,
    running: Option<Running>,
}

impl Clock {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            running: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start ticking, replacing any previous ticker.
    ///
    /// `on_tick` must not call back into this clock.
    pub fn start<F>(&mut self, mut on_tick: F) -> Result<(), CoreError>
    where
        F: FnMut() + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| CoreError::Runtime(e.to_string()))?;
        self.stop();

        let live = Arc::new(Mutex::new(true));
        let cancel = CancellationToken::new();
        let task_live = Arc::clone(&live);
        let task_cancel = cancel.clone();
        let period = self.period;

        runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let live = task_live.lock().unwrap_or_else(PoisonError::into_inner);
                        if !*live {
                            break;
                        }
                        on_tick();
                    }
                }
            }
            tracing::trace!("clock task finished");
        });

        tracing::debug!(period_ms = period.as_millis() as u64, "clock started");
        self.running = Some(Running { live, cancel });
        Ok(())
    }

    /// Stop ticking. Calling it again, or on a clock that never started, is
    /// a no-op.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            *running.live.lock().unwrap_or_else(PoisonError::into_inner) = false;
            running.cancel.cancel();
            tracing::debug!("clock stopped");
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        // Can run on the tick task itself, so never wait for the gate here.
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            if let Ok(mut live) = running.live.try_lock() {
                *live = false;
            }
        }
    }
}
