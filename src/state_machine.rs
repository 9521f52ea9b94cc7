//! Per-channel pomodoro session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod mode;
pub mod state;
pub mod time_label;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{Event, Timer, TimerKind};
pub use mode::{Mode, UnknownMode};
pub use state::{Session, SessionContext, SessionState};
pub use transition::{transition, TransitionError};
