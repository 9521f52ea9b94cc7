//! Session runtime executor

use super::traits::{NoticeSink, WorkLog};
use super::Mailbox;

use crate::state_machine::{
    transition, Effect, Event, Session, SessionContext, Timer, TransitionError,
};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Actor owning one channel's session
///
/// Commands and fired timers are serialized through a single mailbox, so a
/// transition always sees the session left by the previous one.
pub struct SessionRuntime<N, W>
where
    N: NoticeSink + 'static,
    W: WorkLog + 'static,
{
    context: SessionContext,
    session: Session,
    notices: N,
    work_log: W,
    mailbox_rx: mpsc::Receiver<Mailbox>,
    /// Cloned into timer tasks so they can post back into this actor
    mailbox_tx: mpsc::Sender<Mailbox>,
    /// Cancelled when the bot parts the channel; stops the actor and its timers
    shutdown: CancellationToken,
}

impl<N, W> SessionRuntime<N, W>
where
    N: NoticeSink + 'static,
    W: WorkLog + 'static,
{
    pub fn new(
        context: SessionContext,
        notices: N,
        work_log: W,
        mailbox_rx: mpsc::Receiver<Mailbox>,
        mailbox_tx: mpsc::Sender<Mailbox>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            context,
            session: Session::default(),
            notices,
            work_log,
            mailbox_rx,
            mailbox_tx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(channel = %self.context.channel, "Starting session runtime");

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                Some(message) = self.mailbox_rx.recv() => {
                    self.handle_message(message).await;
                }

                else => break,
            }
        }

        tracing::info!(channel = %self.context.channel, "Session runtime stopped");
    }

    async fn handle_message(&mut self, message: Mailbox) {
        match message {
            Mailbox::Command { event, reply } => {
                let result = self.process_event(event).await;
                match &result {
                    Err(e) if e.is_user_facing() => {
                        tracing::debug!(channel = %self.context.channel, error = %e, "Command rejected");
                    }
                    Err(e) => {
                        tracing::warn!(channel = %self.context.channel, error = %e, "Command produced no transition");
                    }
                    Ok(()) => {}
                }
                // The caller may have given up waiting; the transition stands either way
                let _ = reply.send(result);
            }

            Mailbox::Timer(timer) => {
                let event = Event::TimerFired {
                    timer,
                    at: Utc::now(),
                };
                match self.process_event(event).await {
                    Ok(()) => {}
                    Err(e @ TransitionError::StaleTimer { .. }) => {
                        tracing::debug!(channel = %self.context.channel, error = %e, "Ignoring stale timer");
                    }
                    Err(e) => {
                        tracing::warn!(channel = %self.context.channel, error = %e, "Timer rejected");
                    }
                }
            }

            Mailbox::Snapshot(reply) => {
                let _ = reply.send(self.session.clone());
            }
        }
    }

    async fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();

        // Pure state transition
        let result = transition(&self.session, &self.context, event)?;

        let old = std::mem::replace(&mut self.session, result.new_session);
        if old.state.name() != self.session.state.name() || old.generation != self.session.generation
        {
            tracing::info!(
                channel = %self.context.channel,
                event = event_name,
                from = old.state.name(),
                to = self.session.state.name(),
                mode = ?self.session.state.mode(),
                generation = %self.session.generation,
                participants = self.session.participants.len(),
                "Session state change"
            );
        }

        for effect in result.effects {
            self.execute_effect(effect).await;
        }

        Ok(())
    }

    /// Execute an effect. Failures are logged; the session has already moved on.
    async fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::Notify { target, text } => {
                if let Err(e) = self.notices.notify(&target, &text).await {
                    tracing::warn!(recipient = %target, error = %e, "Failed to deliver notice");
                }
            }

            Effect::ScheduleTimer { delay, timer } => {
                self.schedule(delay, timer);
            }

            Effect::RecordWork {
                identity,
                mode,
                goal,
            } => {
                if let Err(e) = self.work_log.record(&identity, mode, &goal).await {
                    tracing::error!(identity = %identity, error = %e, "Failed to record work log entry");
                }
            }
        }
    }

    fn schedule(&self, delay: Duration, timer: Timer) {
        let mailbox_tx = self.mailbox_tx.clone();
        let shutdown = self.shutdown.clone();

        tracing::debug!(
            channel = %self.context.channel,
            kind = ?timer.kind,
            generation = %timer.generation,
            delay_secs = delay.as_secs(),
            "Scheduling timer"
        );

        tokio::spawn(async move {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {}

                () = tokio::time::sleep(delay) => {
                    let _ = mailbox_tx.send(Mailbox::Timer(timer)).await;
                }
            }
        });
    }
}
