//! Events that can occur in a channel's session

use super::mode::Mode;
use super::state::Generation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which scheduled stage a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Registration window is over
    BeginWork,
    /// Work interval is over
    BeginBreak,
    /// Break is over; evaluate who registered
    EndBreak,
}

/// Payload of a scheduled callback, bound to the session value that scheduled it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub generation: Generation,
    pub kind: TimerKind,
}

impl Timer {
    pub fn new(generation: Generation, kind: TimerKind) -> Self {
        Self { generation, kind }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Command events
    Start {
        mode: Mode,
        initiated_by: String,
    },
    Register {
        identity: String,
        goal: String,
    },
    RequestModeChange {
        mode: Mode,
        initiated_by: String,
    },

    // Scheduler events
    TimerFired {
        timer: Timer,
        /// Wall-clock time the timer fired, used for announcement labels
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start",
            Event::Register { .. } => "register",
            Event::RequestModeChange { .. } => "request_mode_change",
            Event::TimerFired { timer, .. } => match timer.kind {
                TimerKind::BeginWork => "begin_work",
                TimerKind::BeginBreak => "begin_break",
                TimerKind::EndBreak => "end_break",
            },
        }
    }
}
