//! Completed-interval log.
//!
//! A [`Session`] is written once, when a Work interval completes or is
//! skipped, and is never edited afterwards.

mod recorder;
pub mod stats;

pub use recorder::SessionRecorder;
pub use stats::{SessionStats, WeeklyBreakdown};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Work,
    Break,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::Break => "break",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(SessionKind::Work),
            "break" => Some(SessionKind::Break),
            _ => None,
        }
    }
}

impl From<TimerMode> for SessionKind {
    fn from(mode: TimerMode) -> Self {
        match mode {
            TimerMode::Work => SessionKind::Work,
            TimerMode::Break => SessionKind::Break,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Assigned by the store; `None` until persisted.
    #[serde(default)]
    pub id: Option<i64>,
    /// Local calendar day the interval finished on.
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub kind: SessionKind,
    pub completed: bool,
    pub completed_at: DateTime<Utc>,
}

impl Session {
    /// A completed, not yet persisted session.
    pub fn completed(
        kind: SessionKind,
        duration_minutes: u32,
        date: NaiveDate,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            date,
            duration_minutes,
            kind,
            completed: true,
            completed_at,
        }
    }

    /// Whether this session counts toward productivity totals.
    pub fn counts_as_work(&self) -> bool {
        self.kind == SessionKind::Work && self.completed
    }
}
