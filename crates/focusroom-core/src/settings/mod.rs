//! User-scoped timer settings.
//!
//! [`TimerSettings`] is always a fully merged, validated value. Edits arrive
//! as a [`TimerSettingsPatch`] and go through the [`SettingsSynchronizer`],
//! which is the only writer.

mod sync;

pub use sync::{SettingsSynchronizer, SyncStatus};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::TimerMode;

pub const FOCUS_MINUTES_RANGE: (u32, u32) = (5, 60);
pub const SHORT_BREAK_MINUTES_RANGE: (u32, u32) = (1, 30);
pub const LONG_BREAK_MINUTES_RANGE: (u32, u32) = (5, 60);
pub const LONG_BREAK_AFTER_RANGE: (u32, u32) = (2, 10);

/// Interval durations and notification toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Work sessions completed before a long break is due.
    #[serde(default = "default_long_break_after")]
    pub long_break_after: u32,
    /// Master switch for every cue.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Cue when a Work or Break interval finishes.
    #[serde(default = "default_true")]
    pub transition_sound_enabled: bool,
    /// Cue on start/pause.
    #[serde(default = "default_true")]
    pub pause_resume_sound_enabled: bool,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_long_break_after() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_after: default_long_break_after(),
            sound_enabled: true,
            transition_sound_enabled: true,
            pause_resume_sound_enabled: true,
        }
    }
}

impl TimerSettings {
    /// Minutes for an interval of `mode`. `long_break` only matters for breaks.
    pub fn minutes_for(&self, mode: TimerMode, long_break: bool) -> u32 {
        match mode {
            TimerMode::Work => self.focus_minutes,
            TimerMode::Break if long_break => self.long_break_minutes,
            TimerMode::Break => self.short_break_minutes,
        }
    }

    /// Seconds for an interval of `mode`.
    pub fn seconds_for(&self, mode: TimerMode, long_break: bool) -> u64 {
        u64::from(self.minutes_for(mode, long_break)).saturating_mul(60)
    }

    /// Check every numeric field against its allowed range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("focus_minutes", self.focus_minutes, FOCUS_MINUTES_RANGE)?;
        check_range(
            "short_break_minutes",
            self.short_break_minutes,
            SHORT_BREAK_MINUTES_RANGE,
        )?;
        check_range(
            "long_break_minutes",
            self.long_break_minutes,
            LONG_BREAK_MINUTES_RANGE,
        )?;
        check_range("long_break_after", self.long_break_after, LONG_BREAK_AFTER_RANGE)?;
        Ok(())
    }

    /// Apply a patch, returning the merged value. Does not validate.
    pub fn merged(&self, patch: &TimerSettingsPatch) -> Self {
        Self {
            focus_minutes: patch.focus_minutes.unwrap_or(self.focus_minutes),
            short_break_minutes: patch.short_break_minutes.unwrap_or(self.short_break_minutes),
            long_break_minutes: patch.long_break_minutes.unwrap_or(self.long_break_minutes),
            long_break_after: patch.long_break_after.unwrap_or(self.long_break_after),
            sound_enabled: patch.sound_enabled.unwrap_or(self.sound_enabled),
            transition_sound_enabled: patch
                .transition_sound_enabled
                .unwrap_or(self.transition_sound_enabled),
            pause_resume_sound_enabled: patch
                .pause_resume_sound_enabled
                .unwrap_or(self.pause_resume_sound_enabled),
        }
    }
}

fn check_range(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: i64::from(value),
            min: i64::from(min),
            max: i64::from(max),
        })
    }
}

/// Partial settings update. `None` leaves the field as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_after: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_sound_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_resume_sound_enabled: Option<bool>,
}

impl TimerSettingsPatch {
    pub const FIELDS: [&'static str; 7] = [
        "focus_minutes",
        "short_break_minutes",
        "long_break_minutes",
        "long_break_after",
        "sound_enabled",
        "transition_sound_enabled",
        "pause_resume_sound_enabled",
    ];

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set one field from its textual form, as typed on the command line.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "focus_minutes" => self.focus_minutes = Some(parse_minutes(field, value)?),
            "short_break_minutes" => self.short_break_minutes = Some(parse_minutes(field, value)?),
            "long_break_minutes" => self.long_break_minutes = Some(parse_minutes(field, value)?),
            "long_break_after" => self.long_break_after = Some(parse_minutes(field, value)?),
            "sound_enabled" => self.sound_enabled = Some(parse_bool(field, value)?),
            "transition_sound_enabled" => {
                self.transition_sound_enabled = Some(parse_bool(field, value)?)
            }
            "pause_resume_sound_enabled" => {
                self.pause_resume_sound_enabled = Some(parse_bool(field, value)?)
            }
            other => {
                return Err(ValidationError::InvalidValue {
                    field: other.to_string(),
                    message: format!("unknown setting; expected one of {}", Self::FIELDS.join(", ")),
                })
            }
        }
        Ok(())
    }
}

fn parse_minutes(field: &str, value: &str) -> Result<u32, ValidationError> {
    value.trim().parse::<u32>().map_err(|_| ValidationError::InvalidValue {
        field: field.to_string(),
        message: format!("'{value}' is not a whole number"),
    })
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("'{value}' is not a boolean"),
        }),
    }
}
