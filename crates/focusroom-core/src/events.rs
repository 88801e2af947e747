use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionKind};
use crate::timer::{RunState, TimerMode, TimerState};

/// Every state change of the focus timer produces an Event.
/// The presentation layer subscribes to them; cues are derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Timer started, resumed or paused.
    PauseResume {
        run_state: RunState,
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// An interval ended, naturally or by skip. The next one is already running.
    ModeCompleted {
        finished: TimerMode,
        next: TimerMode,
        /// The next interval is a long break.
        long_break: bool,
        skipped: bool,
        /// Minutes of Work credited to the session log, if any.
        credited_minutes: Option<u32>,
        next_duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// New settings reached the engine. `deferred` when the running
    /// interval keeps its length and the change applies from the next one.
    SettingsApplied {
        deferred: bool,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    SessionRecorded {
        session: Session,
        at: DateTime<Utc>,
    },
    /// A completed interval could not be saved. The timer kept going.
    SessionRecordFailed {
        kind: SessionKind,
        duration_minutes: u32,
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        today_count: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Mode or run-state transitions (the ones that can carry a cue).
    pub fn is_transition(&self) -> bool {
        matches!(self, Event::PauseResume { .. } | Event::ModeCompleted { .. })
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::PauseResume { at, .. }
            | Event::ModeCompleted { at, .. }
            | Event::SettingsApplied { at, .. }
            | Event::TimerReset { at }
            | Event::SessionRecorded { at, .. }
            | Event::SessionRecordFailed { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::PauseResume {
            run_state: RunState::Paused,
            mode: TimerMode::Work,
            remaining_secs: 600,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PauseResume");
        assert_eq!(json["run_state"], "paused");
        assert_eq!(json["mode"], "work");
    }

    #[test]
    fn only_mode_and_run_state_changes_are_transitions() {
        let now = Utc::now();
        assert!(Event::ModeCompleted {
            finished: TimerMode::Break,
            next: TimerMode::Work,
            long_break: false,
            skipped: false,
            credited_minutes: None,
            next_duration_secs: 1500,
            at: now,
        }
        .is_transition());
        assert!(!Event::TimerReset { at: now }.is_transition());
    }
}
