//! Pure state transition function
//!
//! Given the same session, context and event this always produces the same
//! result; timers and notices are returned as effects for the runtime.

use super::state::{Generation, Participants, Session, SessionContext, SessionState, VoteTally};
use super::time_label::WorkWindow;
use super::{Effect, Event, Mode, Timer, TimerKind};
use chrono::{DateTime, Timelike, Utc};
use std::time::Duration;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: session,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A pomodoro session is already running in this channel.")]
    SessionAlreadyRunning,
    #[error(
        "There is no session running. You can start a new one with the 'pomodoro' command. Example: .pomodoro fast"
    )]
    NoActiveSession { identity: String },
    #[error("You can't vote to change modes while a work session is running.")]
    VoteNotAllowedDuringWork,
    #[error("Stale {kind:?} timer from generation {timer_generation} (current {current})")]
    StaleTimer {
        kind: TimerKind,
        timer_generation: Generation,
        current: Generation,
    },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Whether the initiator of the event should hear about this error
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            TransitionError::StaleTimer { .. } | TransitionError::InvalidTransition(_)
        )
    }
}

/// Pure transition function
pub fn transition(
    session: &Session,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    if let Event::TimerFired { timer, .. } = &event {
        if timer.generation != session.generation {
            return Err(TransitionError::StaleTimer {
                kind: timer.kind,
                timer_generation: timer.generation,
                current: session.generation,
            });
        }
    }

    match (&session.state, event) {
        // ============================================================
        // Starting a cycle
        // ============================================================

        // Idle + start/mode request -> Registering
        (
            SessionState::Idle,
            Event::Start { mode, initiated_by } | Event::RequestModeChange { mode, initiated_by },
        ) => Ok(start_cycle(
            session.generation.next(),
            context,
            mode,
            &initiated_by,
            context.registration_delay,
        )),

        (_, Event::Start { .. }) => Err(TransitionError::SessionAlreadyRunning),

        // ============================================================
        // Scheduled stages
        // ============================================================

        // Registering + BeginWork -> Working
        (SessionState::Registering { mode }, Event::TimerFired { timer, at })
            if timer.kind == TimerKind::BeginWork =>
        {
            Ok(begin_work(session, context, *mode, at))
        }

        // Working + BeginBreak -> OnBreak (roster cleared)
        (SessionState::Working { mode }, Event::TimerFired { timer, .. })
            if timer.kind == TimerKind::BeginBreak =>
        {
            Ok(begin_break(session, context, *mode))
        }

        // OnBreak + EndBreak -> Working, or Idle when nobody registered
        (SessionState::OnBreak { mode, .. }, Event::TimerFired { timer, at })
            if timer.kind == TimerKind::EndBreak =>
        {
            if session.participants.is_empty() {
                Ok(end_cycle(session, context))
            } else {
                Ok(begin_work(session, context, *mode, at))
            }
        }

        // ============================================================
        // Registration
        // ============================================================
        (SessionState::Idle, Event::Register { identity, .. }) => {
            Err(TransitionError::NoActiveSession { identity })
        }

        (
            SessionState::Registering { mode }
            | SessionState::Working { mode }
            | SessionState::OnBreak { mode, .. },
            Event::Register { identity, goal },
        ) => Ok(register(session, *mode, identity, goal)),

        // ============================================================
        // Mode change votes
        // ============================================================
        (
            SessionState::Registering { .. } | SessionState::Working { .. },
            Event::RequestModeChange { .. },
        ) => Err(TransitionError::VoteNotAllowedDuringWork),

        // OnBreak + first request -> canvass, no vote cast
        (SessionState::OnBreak { mode: current, votes }, Event::RequestModeChange { mode, initiated_by })
            if votes.is_empty() =>
        {
            Ok(open_proposal(session, context, *current, mode, &initiated_by))
        }

        // OnBreak + request while votes are open -> cast, maybe switch
        (SessionState::OnBreak { mode: current, votes }, Event::RequestModeChange { mode, initiated_by }) => {
            Ok(cast_vote(session, context, *current, votes, mode, initiated_by))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {}",
            state.name(),
            event.name()
        ))),
    }
}

// Helper functions

fn start_cycle(
    generation: Generation,
    context: &SessionContext,
    mode: Mode,
    initiated_by: &str,
    delay: Duration,
) -> TransitionResult {
    let session = Session {
        generation,
        state: SessionState::Registering { mode },
        participants: Participants::new(),
    };

    TransitionResult::new(session)
        .with_effect(Effect::notify(
            &context.channel,
            format!(
                "{initiated_by} has started a new {mode} ({}) pomodoro session, if you would like \
                 to join in type '.register <the thing you are working on>'. \
                 Example: .register Programming a Pomodoro IRC Bot.",
                mode.split()
            ),
        ))
        .with_effect(Effect::notify(&context.channel, countdown(delay)))
        .with_effect(Effect::schedule(
            delay,
            Timer::new(generation, TimerKind::BeginWork),
        ))
}

fn countdown(delay: Duration) -> String {
    match delay.as_secs() {
        0 => "The session starts now.".to_string(),
        60 => "The session will start in one minute.".to_string(),
        secs if secs % 60 == 0 => format!("The session will start in {} minutes.", secs / 60),
        secs => format!("The session will start in {secs} seconds."),
    }
}

fn begin_work(
    session: &Session,
    context: &SessionContext,
    mode: Mode,
    at: DateTime<Utc>,
) -> TransitionResult {
    let window = WorkWindow::new(at.minute(), mode.work_minutes());

    TransitionResult::new(Session {
        generation: session.generation,
        state: SessionState::Working { mode },
        participants: session.participants.clone(),
    })
    .with_effect(Effect::notify(&context.channel, window.announcement()))
    .with_effect(Effect::schedule(
        mode.work_duration(),
        Timer::new(session.generation, TimerKind::BeginBreak),
    ))
}

fn begin_break(session: &Session, context: &SessionContext, mode: Mode) -> TransitionResult {
    let minutes = mode.break_minutes();

    TransitionResult::new(Session {
        generation: session.generation,
        state: SessionState::OnBreak {
            mode,
            votes: VoteTally::default(),
        },
        participants: Participants::new(),
    })
    .with_effect(Effect::notify(
        &context.channel,
        format!("{minutes} minute break."),
    ))
    .with_effect(Effect::notify(
        &context.channel,
        format!(
            "Please register for the next pomodoro sometime between now and the next {minutes} minutes."
        ),
    ))
    .with_effect(Effect::schedule(
        mode.break_duration(),
        Timer::new(session.generation, TimerKind::EndBreak),
    ))
}

fn end_cycle(session: &Session, context: &SessionContext) -> TransitionResult {
    TransitionResult::new(Session::new(session.generation)).with_effect(Effect::notify(
        &context.channel,
        "Nobody registered for the next pomodoro, so the session is over. \
         Start a new one with '.pomodoro <mode>'.",
    ))
}

fn register(session: &Session, mode: Mode, identity: String, goal: String) -> TransitionResult {
    let goal = goal.trim().to_string();
    let mut participants = session.participants.clone();
    participants.insert(identity.clone(), goal.clone());

    TransitionResult::new(Session {
        participants,
        ..session.clone()
    })
    .with_effect(Effect::notify(
        &identity,
        "You have registered for the next session.",
    ))
    .with_effect(Effect::record_work(identity, mode, goal))
}

fn open_proposal(
    session: &Session,
    context: &SessionContext,
    current: Mode,
    proposed: Mode,
    initiated_by: &str,
) -> TransitionResult {
    let mut votes = VoteTally::default();
    votes.propose(proposed);

    TransitionResult::new(Session {
        state: SessionState::OnBreak {
            mode: current,
            votes,
        },
        ..session.clone()
    })
    .with_effect(Effect::notify(
        &context.channel,
        format!(
            "{initiated_by} has requested to change the current setting from {current} to {proposed}."
        ),
    ))
    .with_effect(Effect::notify(
        &context.channel,
        format!(
            "If you would like to back this change type '.pomodoro {proposed}' otherwise stay \
             silent or type .pomodoro <mode> to vote for a different one."
        ),
    ))
    .with_effect(Effect::notify(
        &context.channel,
        "(Keep in mind you must be registered for the current pomodoro to vote against it.)",
    ))
}

fn cast_vote(
    session: &Session,
    context: &SessionContext,
    current: Mode,
    votes: &VoteTally,
    proposed: Mode,
    voter: String,
) -> TransitionResult {
    let mut votes = votes.clone();
    votes.cast(proposed, voter.clone());
    let confirmation = Effect::notify(&voter, "Your vote has been cast.");

    // Quorum follows the live roster; at least one vote is always needed
    let quorum = session.participants.len().max(1);
    if let Some(winner) = votes.winner(quorum) {
        let restarted = start_cycle(
            session.generation.next(),
            context,
            winner,
            &voter,
            Duration::ZERO,
        );
        return TransitionResult::new(restarted.new_session)
            .with_effect(confirmation)
            .with_effect(Effect::notify(
                &context.channel,
                format!("The vote to switch to {winner} ({}) passed.", winner.split()),
            ))
            .with_effects(restarted.effects);
    }

    TransitionResult::new(Session {
        state: SessionState::OnBreak {
            mode: current,
            votes,
        },
        ..session.clone()
    })
    .with_effect(confirmation)
}
