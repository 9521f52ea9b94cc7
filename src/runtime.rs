//! Runtime for executing channel sessions
//!
//! One actor per joined channel owns that channel's `Session`. The registry
//! routes commands to the right actor and tears actors down on part.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::state_machine::{Event, Session, SessionContext, Timer, TransitionError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_util::sync::CancellationToken;

/// Runtime type used by the registry; adapters are shared across channels
pub type SharedRuntime = SessionRuntime<Arc<dyn NoticeSink>, Arc<dyn WorkLog>>;

/// Messages accepted by a session actor
#[derive(Debug)]
pub enum Mailbox {
    /// A user command; the transition outcome is sent back on `reply`
    Command {
        event: Event,
        reply: oneshot::Sender<Result<(), TransitionError>>,
    },
    /// A scheduled timer came due
    Timer(Timer),
    /// Read-only copy of the current session
    Snapshot(oneshot::Sender<Session>),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Not in channel {0}")]
    ChannelNotFound(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Session runtime for {0} has stopped")]
    Stopped(String),
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub mailbox_tx: mpsc::Sender<Mailbox>,
    pub shutdown: CancellationToken,
}

/// Channel names are case-insensitive; every map key goes through here
pub fn normalize_channel(channel: &str) -> String {
    channel.trim().to_lowercase()
}

/// Manager for all channel session runtimes
pub struct SessionRegistry {
    notices: Arc<dyn NoticeSink>,
    work_log: Arc<dyn WorkLog>,
    registration_delay: Duration,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(
        notices: Arc<dyn NoticeSink>,
        work_log: Arc<dyn WorkLog>,
        registration_delay: Duration,
    ) -> Self {
        Self {
            notices,
            work_log,
            registration_delay,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start an Idle session for `channel`.
    ///
    /// Re-joining replaces the existing session; its state and pending timers
    /// are discarded. Returns true if a session was replaced.
    pub async fn join(&self, channel: &str) -> bool {
        let channel = normalize_channel(channel);
        let mut sessions = self.sessions.write().await;

        let (mailbox_tx, mailbox_rx) = mpsc::channel(32);
        let shutdown = CancellationToken::new();
        let context =
            SessionContext::new(&channel).with_registration_delay(self.registration_delay);

        let runtime: SharedRuntime = SessionRuntime::new(
            context,
            self.notices.clone(),
            self.work_log.clone(),
            mailbox_rx,
            mailbox_tx.clone(),
            shutdown.clone(),
        );

        tokio::spawn(runtime.run());

        let handle = SessionHandle {
            mailbox_tx,
            shutdown,
        };
        let replaced = sessions.insert(channel.clone(), handle);
        if let Some(old) = &replaced {
            old.shutdown.cancel();
            tracing::warn!(channel = %channel, "Rejoined channel, previous session discarded");
        } else {
            tracing::info!(channel = %channel, "Joined channel");
        }
        replaced.is_some()
    }

    /// Discard `channel`'s session, cancelling its pending timers.
    /// Returns false if the channel was not joined.
    pub async fn part(&self, channel: &str) -> bool {
        let channel = normalize_channel(channel);
        let Some(handle) = self.sessions.write().await.remove(&channel) else {
            return false;
        };
        handle.shutdown.cancel();
        tracing::info!(channel = %channel, "Parted channel");
        true
    }

    pub async fn get(&self, channel: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&normalize_channel(channel))
            .cloned()
    }

    /// Joined channels, sorted
    pub async fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Apply a command event to `channel`'s session and wait for the outcome
    pub async fn dispatch(&self, channel: &str, event: Event) -> Result<(), RuntimeError> {
        let handle = self.handle(channel).await?;
        let (reply, outcome) = oneshot::channel();

        handle
            .mailbox_tx
            .send(Mailbox::Command { event, reply })
            .await
            .map_err(|_| RuntimeError::Stopped(normalize_channel(channel)))?;

        outcome
            .await
            .map_err(|_| RuntimeError::Stopped(normalize_channel(channel)))?
            .map_err(RuntimeError::from)
    }

    /// Current session value for `channel`
    pub async fn snapshot(&self, channel: &str) -> Result<Session, RuntimeError> {
        let handle = self.handle(channel).await?;
        let (reply, session) = oneshot::channel();

        handle
            .mailbox_tx
            .send(Mailbox::Snapshot(reply))
            .await
            .map_err(|_| RuntimeError::Stopped(normalize_channel(channel)))?;

        session
            .await
            .map_err(|_| RuntimeError::Stopped(normalize_channel(channel)))
    }

    /// Stop every session actor
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.write().await;
        for (channel, handle) in sessions.drain() {
            handle.shutdown.cancel();
            tracing::debug!(channel = %channel, "Stopped session");
        }
    }

    async fn handle(&self, channel: &str) -> Result<SessionHandle, RuntimeError> {
        self.get(channel)
            .await
            .ok_or_else(|| RuntimeError::ChannelNotFound(normalize_channel(channel)))
    }
}
