//! Timer engine implementation.
//!
//! The engine is a pure, tick-driven state machine. It owns no thread and no
//! clock: the caller feeds it one `tick()` per elapsed second and forwards
//! user commands. Every method returns the event it produced, or `None` when
//! the command does not apply in the current state.
//!
//! ## State Transitions
//!
//! ```text
//! Idle ──start──> Running <──start/pause──> Paused
//!                    │  ▲                      │
//!                 tick=0 / skip ───────────────┘
//!                    └──┘  (mode flips, stays Running)
//! ```
//!
//! Invalid commands (`pause` while Idle or Paused, `skip` while Idle,
//! `start` while Running) are no-ops and return `None`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.start();
//! // Once per second:
//! if let Some(Event::ModeCompleted { credited_minutes: Some(m), .. }) = engine.tick() {
//!     // log m minutes of work
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::settings::TimerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Work,
    Break,
}

impl TimerMode {
    pub fn other(self) -> Self {
        match self {
            TimerMode::Work => TimerMode::Break,
            TimerMode::Break => TimerMode::Work,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

/// Snapshot of the engine for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub run_state: RunState,
    pub remaining_seconds: u64,
    /// Full length of the interval in flight.
    pub interval_seconds: u64,
    /// Current Break is a long one.
    pub long_break: bool,
    pub completed_work_count_since_long_break: u32,
}

impl TimerState {
    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        if self.interval_seconds == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_seconds as f64 / self.interval_seconds as f64)
    }
}

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    settings: TimerSettings,
    mode: TimerMode,
    run_state: RunState,
    remaining_secs: u64,
    interval_secs: u64,
    long_break: bool,
    work_count: u32,
}

impl TimerEngine {
    /// Create an idle engine positioned at the start of a Work interval.
    pub fn new(settings: TimerSettings) -> Self {
        let interval_secs = settings.seconds_for(TimerMode::Work, false);
        Self {
            settings,
            mode: TimerMode::Work,
            run_state: RunState::Idle,
            remaining_secs: interval_secs,
            interval_secs,
            long_break: false,
            work_count: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            mode: self.mode,
            run_state: self.run_state,
            remaining_seconds: self.remaining_secs,
            interval_seconds: self.interval_secs,
            long_break: self.long_break,
            completed_work_count_since_long_break: self.work_count,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.run_state {
            RunState::Running => None,
            RunState::Idle | RunState::Paused => {
                if self.run_state == RunState::Idle {
                    self.reset_interval();
                }
                self.run_state = RunState::Running;
                Some(self.pause_resume_event())
            }
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.run_state {
            RunState::Running => {
                self.run_state = RunState::Paused;
                Some(self.pause_resume_event())
            }
            RunState::Idle | RunState::Paused => None,
        }
    }

    /// Advance by one second. Returns `Some(Event::ModeCompleted)` when the
    /// interval runs out.
    pub fn tick(&mut self) -> Option<Event> {
        if self.run_state != RunState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }
        Some(self.complete_interval(false))
    }

    /// End the current interval early. A skipped Work interval is credited
    /// like a completed one. Always leaves the engine Running.
    pub fn skip(&mut self) -> Option<Event> {
        match self.run_state {
            RunState::Idle => None,
            RunState::Running | RunState::Paused => Some(self.complete_interval(true)),
        }
    }

    /// Back to an idle Work interval with the long-break counter cleared.
    pub fn reset(&mut self) -> Option<Event> {
        self.mode = TimerMode::Work;
        self.run_state = RunState::Idle;
        self.long_break = false;
        self.work_count = 0;
        self.reset_interval();
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Install new settings. A paused or idle timer restarts its interval only
    /// when the current mode's duration changed; a running interval keeps its
    /// length either way.
    pub fn apply_settings_change(&mut self, settings: TimerSettings) -> Option<Event> {
        let previous = self.settings.minutes_for(self.mode, self.long_break);
        self.settings = settings;
        let deferred = self.run_state == RunState::Running;
        if !deferred && settings.minutes_for(self.mode, self.long_break) != previous {
            self.reset_interval();
        }
        Some(Event::SettingsApplied {
            deferred,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reset_interval(&mut self) {
        self.interval_secs = self.settings.seconds_for(self.mode, self.long_break);
        self.remaining_secs = self.interval_secs;
    }

    fn complete_interval(&mut self, skipped: bool) -> Event {
        let finished = self.mode;
        let credited_minutes = match finished {
            TimerMode::Work => {
                self.work_count += 1;
                Some(((self.interval_secs / 60) as u32).max(1))
            }
            TimerMode::Break => None,
        };

        self.mode = finished.other();
        self.long_break = self.mode == TimerMode::Break
            && self.work_count >= self.settings.long_break_after;
        if self.long_break {
            self.work_count = 0;
        }
        self.reset_interval();
        self.run_state = RunState::Running;

        tracing::debug!(
            ?finished,
            next = ?self.mode,
            skipped,
            long_break = self.long_break,
            "interval completed"
        );

        Event::ModeCompleted {
            finished,
            next: self.mode,
            long_break: self.long_break,
            skipped,
            credited_minutes,
            next_duration_secs: self.interval_secs,
            at: Utc::now(),
        }
    }

    fn pause_resume_event(&self) -> Event {
        Event::PauseResume {
            run_state: self.run_state,
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }
}
