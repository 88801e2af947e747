mod clock;
mod engine;
mod handle;

pub use clock::{Clock, DEFAULT_TICK};
pub use engine::{RunState, TimerEngine, TimerMode, TimerState};
pub use handle::FocusTimer;
