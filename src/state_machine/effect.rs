//! Effects produced by state transitions

use super::event::Timer;
use super::mode::Mode;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a notice to a channel or an identity
    Notify { target: String, text: String },

    /// Post `timer` back into this session after `delay`
    ScheduleTimer { delay: Duration, timer: Timer },

    /// Append a registration to the identity's work log
    RecordWork {
        identity: String,
        mode: Mode,
        goal: String,
    },
}

impl Effect {
    pub fn notify(target: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::Notify {
            target: target.into(),
            text: text.into(),
        }
    }

    pub fn schedule(delay: Duration, timer: Timer) -> Self {
        Effect::ScheduleTimer { delay, timer }
    }

    pub fn record_work(identity: impl Into<String>, mode: Mode, goal: impl Into<String>) -> Self {
        Effect::RecordWork {
            identity: identity.into(),
            mode,
            goal: goal.into(),
        }
    }
}
