//! Session state types

use super::mode::Mode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Registration window before the first work interval
pub const DEFAULT_REGISTRATION_DELAY: Duration = Duration::from_secs(300);

// ============================================================================
// Generation
// ============================================================================

/// Distinguishes a Session value from every value it replaced.
///
/// Timers carry the generation they were scheduled under; a timer whose
/// generation no longer matches is stale and must not touch the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Participants and votes
// ============================================================================

/// Registered identities and what they are working on
pub type Participants = BTreeMap<String, String>;

/// Proposed mode -> identities backing it
///
/// A proposal is recorded with an empty voter set, so a non-empty tally
/// means a vote is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    proposals: BTreeMap<Mode, BTreeSet<String>>,
}

impl VoteTally {
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Open a proposal without casting a vote
    pub fn propose(&mut self, mode: Mode) {
        self.proposals.entry(mode).or_default();
    }

    pub fn cast(&mut self, mode: Mode, voter: impl Into<String>) {
        self.proposals.entry(mode).or_default().insert(voter.into());
    }

    pub fn votes_for(&self, mode: Mode) -> usize {
        self.proposals.get(&mode).map_or(0, BTreeSet::len)
    }

    /// First proposal (in mode order) whose backing reaches `quorum`
    pub fn winner(&self, quorum: usize) -> Option<Mode> {
        self.proposals
            .iter()
            .find(|(_, voters)| voters.len() >= quorum)
            .map(|(mode, _)| *mode)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Phase of the per-channel pomodoro cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// No session; waiting for someone to start one
    #[default]
    Idle,

    /// Session announced, opt-in window before the clock starts
    Registering { mode: Mode },

    /// Timed work interval in progress
    Working { mode: Mode },

    /// Timed break; late registrations and votes accepted
    OnBreak {
        mode: Mode,
        #[serde(default)]
        votes: VoteTally,
    },
}

impl SessionState {
    pub fn mode(&self) -> Option<Mode> {
        match self {
            SessionState::Idle => None,
            SessionState::Registering { mode }
            | SessionState::Working { mode }
            | SessionState::OnBreak { mode, .. } => Some(*mode),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }

    pub fn votes(&self) -> Option<&VoteTally> {
        match self {
            SessionState::OnBreak { votes, .. } => Some(votes),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Registering { .. } => "registering",
            SessionState::Working { .. } => "working",
            SessionState::OnBreak { .. } => "on_break",
        }
    }
}

/// The per-channel pomodoro session value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub generation: Generation,
    pub state: SessionState,
    pub participants: Participants,
}

impl Session {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            state: SessionState::Idle,
            participants: Participants::new(),
        }
    }
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub channel: String,
    /// Delay between `start` and the first work interval
    pub registration_delay: Duration,
}

impl SessionContext {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            registration_delay: DEFAULT_REGISTRATION_DELAY,
        }
    }

    #[must_use]
    pub fn with_registration_delay(mut self, delay: Duration) -> Self {
        self.registration_delay = delay;
        self
    }
}
