//! Audible cues for timer transitions.
//!
//! Pure mapping from an [`Event`] and the current toggles to a
//! [`CueRequest`]. Playing the cue is up to the presentation layer.

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::settings::TimerSettings;
use crate::timer::TimerMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// A Work or Break interval finished.
    Transition,
    PauseResume,
}

/// One frequency step of a chime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: f32,
    pub offset_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueRequest {
    pub kind: CueKind,
    /// Mode the cue announces: the one starting (transition) or the one
    /// being paused or resumed.
    pub mode: TimerMode,
    pub tones: Vec<Tone>,
    pub gain: f32,
    /// Time for the gain to fade out.
    pub decay_ms: u32,
}

const CHIME: [Tone; 3] = [
    Tone { frequency_hz: 800.0, offset_ms: 0 },
    Tone { frequency_hz: 600.0, offset_ms: 100 },
    Tone { frequency_hz: 800.0, offset_ms: 200 },
];
const CHIME_GAIN: f32 = 0.3;
const CHIME_DECAY_MS: u32 = 500;

impl CueRequest {
    fn chime(kind: CueKind, mode: TimerMode) -> Self {
        Self {
            kind,
            mode,
            tones: CHIME.to_vec(),
            gain: CHIME_GAIN,
            decay_ms: CHIME_DECAY_MS,
        }
    }
}

/// The cue to play for `event`, if any.
pub fn cue_for(event: &Event, settings: &TimerSettings) -> Option<CueRequest> {
    if !settings.sound_enabled {
        return None;
    }
    match event {
        Event::ModeCompleted { next, .. } if settings.transition_sound_enabled => {
            Some(CueRequest::chime(CueKind::Transition, *next))
        }
        Event::PauseResume { mode, .. } if settings.pause_resume_sound_enabled => {
            Some(CueRequest::chime(CueKind::PauseResume, *mode))
        }
        _ => None,
    }
}
