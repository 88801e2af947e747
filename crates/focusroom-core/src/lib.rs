//! # Focusroom Core Library
//!
//! Core logic for the Focusroom focus/break timer. The `focusroom` CLI is a
//! thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Clock**: a tokio task delivering one tick per second
//! - **Timer Engine**: a pure tick-driven state machine (Work/Break,
//!   Idle/Running/Paused) with long-break cycling
//! - **Session Recorder**: writes completed Work intervals to the store of
//!   record and answers today/week/streak totals
//! - **Settings Synchronizer**: optimistic local settings kept in agreement
//!   with the store, with an observable unsynced state
//! - **Notification Cue**: maps transitions to audible cue requests
//!
//! ## Key Components
//!
//! - [`FocusTimer`]: the owned handle the presentation layer drives
//! - [`TimerEngine`]: core timer state machine
//! - [`Stores`]: SQLite, HTTP or in-memory store of record
//! - [`AppConfig`]: application configuration

pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod settings;
pub mod storage;
pub mod store;
pub mod timer;

pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use notify::{cue_for, CueKind, CueRequest, Tone};
pub use session::{Session, SessionKind, SessionRecorder, SessionStats, WeeklyBreakdown};
pub use settings::{SettingsSynchronizer, SyncStatus, TimerSettings, TimerSettingsPatch};
pub use storage::{data_dir, AppConfig, SqliteStore};
pub use store::{HttpStore, MemoryStore, SessionStore, SettingsStore, Stores};
pub use timer::{Clock, FocusTimer, RunState, TimerEngine, TimerMode, TimerState};
