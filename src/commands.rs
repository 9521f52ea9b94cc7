//! Command layer: turns chat lines into session operations
//!
//! Public commands arrive in a channel, either prefixed with `.` or addressed
//! to the bot as `<nick>: <command>`. Private messages carry controller
//! commands. Every failure is reported as a single notice to the sender.

pub mod control;
pub mod keyword;

use crate::config::BotConfig;
use crate::runtime::{NoticeSink, RuntimeError, SessionRegistry};
use crate::state_machine::{Event, Mode, TransitionError, UnknownMode};
use control::ControlKeyword;
use keyword::Keyword;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    UnknownMode(#[from] UnknownMode),
    #[error("'{0}' is not a channel.")]
    NotAChannel(String),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("No handler registered for command '{0}'")]
    MissingHandler(&'static str),
    #[error("More than one handler registered for command '{0}'")]
    DuplicateHandler(&'static str),
}

/// A line of chat as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    /// A channel, or the bot's own nick for private messages
    pub target: String,
    pub text: String,
}

/// Arguments handed to a command handler
#[derive(Debug, Clone)]
pub struct Invocation {
    pub sender: String,
    /// Words after the command keyword
    pub args: Vec<String>,
}

/// What a handler asks the router to do
#[derive(Debug)]
pub enum Action {
    /// Apply an event to the channel's session
    Session(Event),
    /// Start a session, or vote if one is already running
    StartOrVote(Mode),
    ListRegistered,
    Export,
    /// Send these lines to the sender
    Reply(Vec<String>),
    Join(String),
    Part(String),
}

pub type Handler = fn(&Invocation) -> Result<Action, CommandError>;

/// Check that a dispatch table has exactly one handler per keyword
fn check_table<K: Copy + PartialEq + Debug>(
    keywords: &[K],
    table: &[(K, Handler)],
    name: fn(K) -> &'static str,
) -> Result<(), CommandError> {
    for keyword in keywords {
        match table.iter().filter(|(k, _)| k == keyword).count() {
            0 => return Err(CommandError::MissingHandler(name(*keyword))),
            1 => {}
            _ => return Err(CommandError::DuplicateHandler(name(*keyword))),
        }
    }
    Ok(())
}

/// Validate both dispatch tables; run once at startup
pub fn validate_tables() -> Result<(), CommandError> {
    check_table(&Keyword::ALL, keyword::COMMANDS, Keyword::name)?;
    check_table(&ControlKeyword::ALL, control::COMMANDS, ControlKeyword::name)?;
    Ok(())
}

pub struct CommandRouter {
    registry: Arc<SessionRegistry>,
    notices: Arc<dyn NoticeSink>,
    config: Arc<BotConfig>,
}

impl CommandRouter {
    pub fn new(
        registry: Arc<SessionRegistry>,
        notices: Arc<dyn NoticeSink>,
        config: Arc<BotConfig>,
    ) -> Self {
        Self {
            registry,
            notices,
            config,
        }
    }

    /// Handle one inbound line. Lines that are not commands are ignored.
    pub async fn handle(&self, message: InboundMessage) {
        let is_private = message.target.eq_ignore_ascii_case(&self.config.nick);

        let outcome = if is_private {
            self.handle_private(&message).await
        } else {
            self.handle_public(&message).await
        };

        if let Err(e) = outcome {
            tracing::debug!(sender = %message.sender, to = %message.target, error = %e, "Command failed");
            self.reply(&message.sender, &e.to_string()).await;
        }
    }

    async fn handle_public(&self, message: &InboundMessage) -> Result<(), CommandError> {
        let Some((word, args)) = self.split_public(&message.text) else {
            return Ok(());
        };
        let Some(handler) = Keyword::from_name(word).and_then(keyword::handler) else {
            return Ok(());
        };

        let invocation = Invocation {
            sender: message.sender.clone(),
            args,
        };
        let action = handler(&invocation)?;
        self.execute(&message.target, &invocation.sender, action).await
    }

    async fn handle_private(&self, message: &InboundMessage) -> Result<(), CommandError> {
        if message.sender != self.config.controller {
            tracing::warn!(sender = %message.sender, "Ignoring private command from non-controller");
            return Ok(());
        }

        let mut words = message.text.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(());
        };
        let Some(handler) = ControlKeyword::from_name(word.trim_start_matches('.'))
            .and_then(control::handler)
        else {
            return Ok(());
        };

        let invocation = Invocation {
            sender: message.sender.clone(),
            args: words.map(String::from).collect(),
        };
        let action = handler(&invocation)?;
        self.execute(&message.target, &invocation.sender, action).await
    }

    /// Find the command word in a channel line: `.cmd args` or `nick: cmd args`
    fn split_public<'a>(&self, text: &'a str) -> Option<(&'a str, Vec<String>)> {
        let mut words = text.split_whitespace();
        let first = words.next()?;

        let word = if let Some(word) = first.strip_prefix('.') {
            word
        } else {
            let addressed = first.strip_suffix(':').or_else(|| first.strip_suffix(','))?;
            if !addressed.eq_ignore_ascii_case(&self.config.nick) {
                return None;
            }
            let word = words.next()?;
            word.strip_prefix('.').unwrap_or(word)
        };

        Some((word, words.map(String::from).collect()))
    }

    async fn execute(&self, channel: &str, sender: &str, action: Action) -> Result<(), CommandError> {
        match action {
            Action::Session(event) => {
                self.registry.dispatch(channel, event).await?;
            }

            Action::StartOrVote(mode) => {
                let start = Event::Start {
                    mode,
                    initiated_by: sender.to_string(),
                };
                match self.registry.dispatch(channel, start).await {
                    Err(RuntimeError::Transition(TransitionError::SessionAlreadyRunning)) => {
                        let vote = Event::RequestModeChange {
                            mode,
                            initiated_by: sender.to_string(),
                        };
                        self.registry.dispatch(channel, vote).await?;
                    }
                    other => other?,
                }
            }

            Action::ListRegistered => {
                let session = self.registry.snapshot(channel).await?;
                if session.participants.is_empty() {
                    self.reply(sender, "There are currently no registered users.")
                        .await;
                }
                for (identity, goal) in &session.participants {
                    self.reply(sender, &format!("{identity} | {goal}")).await;
                }
            }

            Action::Export => {
                self.reply(sender, &self.config.export_url(sender)).await;
            }

            Action::Reply(lines) => {
                for line in &lines {
                    self.reply(sender, line).await;
                }
            }

            Action::Join(target) => {
                if self.registry.join(&target).await {
                    let text = format!("Rejoined {target}; its previous session was discarded.");
                    self.reply(sender, &text).await;
                }
            }

            Action::Part(target) => {
                if !self.registry.part(&target).await {
                    return Err(RuntimeError::ChannelNotFound(target).into());
                }
            }
        }
        Ok(())
    }

    async fn reply(&self, target: &str, text: &str) {
        if let Err(e) = self.notices.notify(target, text).await {
            tracing::warn!(recipient = %target, error = %e, "Failed to deliver notice");
        }
    }
}
