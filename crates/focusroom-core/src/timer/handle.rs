//! Shareable timer handle.
//!
//! [`FocusTimer`] owns the engine, drives it from a [`Clock`], forwards every
//! event to subscribers and hands completed Work intervals to the session
//! recorder. Recording and settings pushes run as background tasks; the
//! countdown never waits on the store.
//!
//! Lock order: `control` (the clock) before `engine`. The tick callback only
//! ever takes `engine`, and user commands release `engine` before touching
//! the clock. Events are published while `engine` is held, so subscribers see
//! them in the order the state changed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::clock::Clock;
use super::engine::{RunState, TimerEngine, TimerState};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::notify::{self, CueRequest};
use crate::session::{SessionKind, SessionRecorder, SessionStats};
use crate::settings::{SettingsSynchronizer, TimerSettings, TimerSettingsPatch};
use crate::store::Stores;

const EVENT_BUFFER: usize = 256;

struct Inner {
    engine: Mutex<TimerEngine>,
    control: Mutex<Clock>,
    recorder: Arc<SessionRecorder>,
    settings: Arc<SettingsSynchronizer>,
    events: broadcast::Sender<Event>,
    runtime: Handle,
    /// In-flight session writes.
    writes: TaskTracker,
    shutdown: CancellationToken,
}

#[derive(Clone)]
pub struct FocusTimer {
    inner: Arc<Inner>,
}

impl FocusTimer {
    /// Build a timer over existing collaborators. Must be called inside a
    /// tokio runtime.
    pub fn new(
        recorder: Arc<SessionRecorder>,
        settings: Arc<SettingsSynchronizer>,
        clock: Clock,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| CoreError::Runtime(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let engine = TimerEngine::new(settings.current());
        Ok(Self {
            inner: Arc::new(Inner {
                engine: Mutex::new(engine),
                control: Mutex::new(clock),
                recorder,
                settings,
                events,
                runtime,
                writes: TaskTracker::new(),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Build a timer over `stores`, load settings and warm the session cache.
    /// Store failures are logged and the timer starts from local defaults.
    pub async fn open(stores: &Stores, clock: Clock, lookback_days: u32) -> Result<Self> {
        let recorder = Arc::new(SessionRecorder::new(stores.sessions.clone(), lookback_days));
        let settings = Arc::new(SettingsSynchronizer::new(stores.settings.clone()));

        settings.load().await;
        if let Err(e) = recorder.refresh().await {
            tracing::warn!(error = %e, "could not load recent sessions, totals start empty");
        }
        Self::new(recorder, settings, clock)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    pub fn state(&self) -> TimerState {
        self.inner.engine().state()
    }

    /// Current state plus today's completed Work count.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            today_count: self.inner.recorder.today_count(),
            at: Utc::now(),
        }
    }

    pub fn settings(&self) -> TimerSettings {
        *self.inner.engine().settings()
    }

    pub fn recorder(&self) -> &Arc<SessionRecorder> {
        &self.inner.recorder
    }

    pub fn synchronizer(&self) -> &Arc<SettingsSynchronizer> {
        &self.inner.settings
    }

    pub fn stats(&self) -> SessionStats {
        self.inner.recorder.summary()
    }

    /// Audio cue for `event` under the engine's current settings.
    pub fn cue_for(&self, event: &Event) -> Option<CueRequest> {
        notify::cue_for(event, &self.settings())
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&self) -> Result<Option<Event>> {
        if self.inner.shutdown.is_cancelled() {
            return Ok(None);
        }
        let mut clock = self.inner.control();
        if self.inner.engine().run_state() == RunState::Running {
            return Ok(None);
        }
        self.inner.ensure_ticking(&mut clock)?;
        Ok(self.inner.dispatch(TimerEngine::start))
    }

    pub fn pause(&self) -> Option<Event> {
        let mut clock = self.inner.control();
        let event = self.inner.dispatch(TimerEngine::pause);
        if event.is_some() {
            clock.stop();
        }
        event
    }

    /// End the current interval now. Completed Work is recorded in the
    /// background.
    pub fn skip(&self) -> Result<Option<Event>> {
        if self.inner.shutdown.is_cancelled() {
            return Ok(None);
        }
        let mut clock = self.inner.control();
        if self.inner.engine().run_state() == RunState::Idle {
            return Ok(None);
        }
        self.inner.ensure_ticking(&mut clock)?;
        Ok(self.inner.dispatch(TimerEngine::skip))
    }

    pub fn reset(&self) -> Option<Event> {
        let mut clock = self.inner.control();
        let event = self.inner.dispatch(TimerEngine::reset);
        clock.stop();
        event
    }

    /// Hand already-validated settings to the engine.
    pub fn apply_settings_change(&self, settings: TimerSettings) -> Option<Event> {
        let _clock = self.inner.control();
        self.inner.dispatch(|engine| engine.apply_settings_change(settings))
    }

    /// Validate, apply to the engine, then push to the store.
    ///
    /// The engine already runs on the new values when this returns, even if
    /// the push failed. Once the push settles the engine is brought in line
    /// with the synchronizer's copy, which may be a newer edit or the store's
    /// normalised version.
    pub async fn update_settings(&self, patch: &TimerSettingsPatch) -> Result<TimerSettings> {
        {
            let _clock = self.inner.control();
            let merged = self.inner.settings.apply_local(patch)?;
            self.inner.dispatch(|engine| engine.apply_settings_change(merged));
        }
        let pushed = self.inner.settings.push().await;
        self.inner.adopt_synchronized_settings();
        pushed
    }

    /// Reload settings from the store and apply whatever wins.
    pub async fn reload_settings(&self) -> TimerSettings {
        self.inner.settings.load().await;
        self.inner.adopt_synchronized_settings()
    }

    /// Wait for session writes already in flight to finish and publish
    /// their results. The timer keeps running.
    pub async fn drain(&self) {
        self.inner.writes.close();
        self.inner.writes.wait().await;
        self.inner.writes.reopen();
    }

    /// Stop the clock and drop any recording still in flight.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.recorder.close();
        self.inner.control().stop();
        tracing::debug!("focus timer shut down");
    }
}

impl Inner {
    fn engine(&self) -> MutexGuard<'_, TimerEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn control(&self) -> MutexGuard<'_, Clock> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_ticking(self: &Arc<Self>, clock: &mut Clock) -> Result<()> {
        if clock.is_running() {
            return Ok(());
        }
        let weak: Weak<Inner> = Arc::downgrade(self);
        clock.start(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_tick();
            }
        })
    }

    fn on_tick(self: &Arc<Self>) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.dispatch(TimerEngine::tick);
    }

    /// Run one engine command and publish its event before the engine is
    /// released. Credited Work starts a background write.
    fn dispatch<F>(&self, command: F) -> Option<Event>
    where
        F: FnOnce(&mut TimerEngine) -> Option<Event>,
    {
        let mut engine = self.engine();
        let event = command(&mut *engine)?;
        if let Event::ModeCompleted {
            credited_minutes: Some(minutes),
            ..
        } = &event
        {
            self.spawn_record(*minutes);
        }
        // No subscribers is fine.
        let _ = self.events.send(event.clone());
        drop(engine);
        Some(event)
    }

    /// Apply the synchronizer's current settings if the engine differs.
    /// Returns the settings now in effect.
    fn adopt_synchronized_settings(&self) -> TimerSettings {
        let _clock = self.control();
        let current = self.settings.current();
        self.dispatch(|engine| {
            if *engine.settings() == current {
                None
            } else {
                engine.apply_settings_change(current)
            }
        });
        current
    }

    fn spawn_record(&self, minutes: u32) {
        let recorder = Arc::clone(&self.recorder);
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();

        let write = async move {
            let result = recorder.record(SessionKind::Work, minutes).await;
            if shutdown.is_cancelled() {
                tracing::debug!("timer shut down, discarding record result");
                return;
            }
            let event = match result {
                Ok(session) => Event::SessionRecorded {
                    session,
                    at: Utc::now(),
                },
                Err(e) => Event::SessionRecordFailed {
                    kind: SessionKind::Work,
                    duration_minutes: minutes,
                    message: e.to_string(),
                    at: Utc::now(),
                },
            };
            let _ = events.send(event);
        };
        self.writes.spawn_on(write, &self.runtime);
    }
}
