//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::SessionRegistry;
use crate::state_machine::Mode;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Recording Notice Sink
// ============================================================================

/// Notice sink that keeps every (target, text) pair it was given
#[derive(Default)]
pub struct RecordingNotices {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts sent to `target`, in order
    pub fn to(&self, target: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn any_to_starting_with(&self, target: &str, prefix: &str) -> bool {
        self.to(target).iter().any(|text| text.starts_with(prefix))
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl NoticeSink for RecordingNotices {
    async fn notify(&self, target: &str, text: &str) -> Result<(), String> {
        self.sent
            .lock()
            .unwrap()
            .push((target.to_string(), text.to_string()));
        Ok(())
    }
}

// ============================================================================
// In-Memory Work Log
// ============================================================================

#[derive(Default)]
pub struct InMemoryWorkLog {
    entries: Mutex<Vec<(String, Mode, String)>>,
}

impl InMemoryWorkLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, Mode, String)> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkLog for InMemoryWorkLog {
    async fn record(&self, identity: &str, mode: Mode, goal: &str) -> Result<(), String> {
        self.entries
            .lock()
            .unwrap()
            .push((identity.to_string(), mode, goal.to_string()));
        Ok(())
    }
}

// ============================================================================
// Test Registry
// ============================================================================

/// Registry wired to recording mocks
pub struct TestRegistry {
    pub registry: SessionRegistry,
    pub notices: Arc<RecordingNotices>,
    pub work_log: Arc<InMemoryWorkLog>,
}

impl TestRegistry {
    pub fn new() -> TestRegistryBuilder {
        TestRegistryBuilder::default()
    }
}

pub struct TestRegistryBuilder {
    registration_delay: Duration,
}

impl Default for TestRegistryBuilder {
    fn default() -> Self {
        Self {
            registration_delay: Duration::from_secs(300),
        }
    }
}

impl TestRegistryBuilder {
    pub fn registration_delay(mut self, delay: Duration) -> Self {
        self.registration_delay = delay;
        self
    }

    pub fn build(self) -> TestRegistry {
        let notices = Arc::new(RecordingNotices::new());
        let work_log = Arc::new(InMemoryWorkLog::new());
        let registry = SessionRegistry::new(
            notices.clone(),
            work_log.clone(),
            self.registration_delay,
        );
        TestRegistry {
            registry,
            notices,
            work_log,
        }
    }
}

/// Let the clock run forward, firing any timers that come due
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeError;
    use crate::state_machine::{Event, SessionState, TransitionError};

    const CHANNEL: &str = "#pomodoro";

    fn start(mode: Mode, who: &str) -> Event {
        Event::Start {
            mode,
            initiated_by: who.to_string(),
        }
    }

    fn register(who: &str, goal: &str) -> Event {
        Event::Register {
            identity: who.to_string(),
            goal: goal.to_string(),
        }
    }

    fn vote(mode: Mode, who: &str) -> Event {
        Event::RequestModeChange {
            mode,
            initiated_by: who.to_string(),
        }
    }

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[tokio::test]
    async fn test_recording_notices() {
        let notices = RecordingNotices::new();
        notices.notify("#a", "one").await.unwrap();
        notices.notify("bob", "two").await.unwrap();

        assert_eq!(notices.to("#a"), vec!["one".to_string()]);
        assert_eq!(notices.all().len(), 2);
        notices.clear();
        assert!(notices.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cycle_through_runtime() {
        let rt = TestRegistry::new().build();
        rt.registry.join("#Pomodoro").await;

        rt.registry.dispatch(CHANNEL, start(Mode::Fast, "alice")).await.unwrap();
        assert!(rt
            .notices
            .any_to_starting_with(CHANNEL, "alice has started a new fast (25:5) pomodoro session"));

        rt.registry.dispatch(CHANNEL, register("bob", "writing tests")).await.unwrap();
        assert_eq!(
            rt.notices.to("bob"),
            vec!["You have registered for the next session.".to_string()]
        );
        assert_eq!(
            rt.work_log.entries(),
            vec![("bob".to_string(), Mode::Fast, "writing tests".to_string())]
        );

        // Registration window closes
        advance(Duration::from_secs(301)).await;
        let session = rt.registry.snapshot(CHANNEL).await.unwrap();
        assert_eq!(session.state, SessionState::Working { mode: Mode::Fast });
        assert!(rt.notices.any_to_starting_with(CHANNEL, "Pomodoro starts at :"));

        // Work interval ends
        advance(minutes(25)).await;
        let session = rt.registry.snapshot(CHANNEL).await.unwrap();
        assert!(matches!(session.state, SessionState::OnBreak { mode: Mode::Fast, .. }));
        assert!(session.participants.is_empty());
        assert!(rt.notices.to(CHANNEL).contains(&"5 minute break.".to_string()));

        // Nobody re-registered
        advance(minutes(5)).await;
        let session = rt.registry.snapshot(CHANNEL).await.unwrap();
        assert_eq!(session.state, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registration_during_break_continues_cycle() {
        let rt = TestRegistry::new().registration_delay(Duration::ZERO).build();
        rt.registry.join(CHANNEL).await;

        rt.registry.dispatch(CHANNEL, start(Mode::Test, "alice")).await.unwrap();
        advance(Duration::from_secs(61)).await;
        assert!(matches!(
            rt.registry.snapshot(CHANNEL).await.unwrap().state,
            SessionState::OnBreak { .. }
        ));

        rt.registry.dispatch(CHANNEL, register("carol", "reading")).await.unwrap();
        advance(Duration::from_secs(60)).await;

        let session = rt.registry.snapshot(CHANNEL).await.unwrap();
        assert_eq!(session.state, SessionState::Working { mode: Mode::Test });
        assert_eq!(session.participants["carol"], "reading");
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_mode_completes_both_cycle_endings() {
        let rt = TestRegistry::new().registration_delay(Duration::ZERO).build();

        for mode in Mode::ALL {
            let ending = format!("#{mode}-ends");
            let continuing = format!("#{mode}-continues");
            rt.registry.join(&ending).await;
            rt.registry.join(&continuing).await;

            for channel in [&ending, &continuing] {
                rt.registry.dispatch(channel, start(mode, "alice")).await.unwrap();
                rt.registry.dispatch(channel, register("alice", "first cycle")).await.unwrap();
            }

            advance(mode.work_duration() + Duration::from_secs(1)).await;
            for channel in [&ending, &continuing] {
                let session = rt.registry.snapshot(channel).await.unwrap();
                assert!(matches!(session.state, SessionState::OnBreak { mode: m, .. } if m == mode));
            }

            rt.registry.dispatch(&continuing, register("bob", "b")).await.unwrap();
            rt.registry.dispatch(&continuing, register("carol", "c")).await.unwrap();

            advance(mode.break_duration()).await;
            let ended = rt.registry.snapshot(&ending).await.unwrap();
            assert_eq!(ended.state, SessionState::Idle, "{mode}");

            let next = rt.registry.snapshot(&continuing).await.unwrap();
            assert_eq!(next.state, SessionState::Working { mode });
            assert_eq!(
                next.participants.keys().cloned().collect::<Vec<_>>(),
                vec!["bob".to_string(), "carol".to_string()]
            );

            rt.registry.part(&ending).await;
            rt.registry.part(&continuing).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_vote_switches_mode_and_orphans_old_timers() {
        let rt = TestRegistry::new().registration_delay(Duration::ZERO).build();
        rt.registry.join(CHANNEL).await;

        rt.registry.dispatch(CHANNEL, start(Mode::Fast, "alice")).await.unwrap();
        advance(minutes(25) + Duration::from_secs(1)).await;

        rt.registry.dispatch(CHANNEL, register("alice", "a")).await.unwrap();
        rt.registry.dispatch(CHANNEL, register("bob", "b")).await.unwrap();

        // First request only canvasses
        rt.registry.dispatch(CHANNEL, vote(Mode::Lazy, "alice")).await.unwrap();
        rt.registry.dispatch(CHANNEL, vote(Mode::Lazy, "alice")).await.unwrap();
        rt.registry.dispatch(CHANNEL, vote(Mode::Lazy, "bob")).await.unwrap();
        assert_eq!(
            rt.notices.to("bob"),
            vec![
                "You have registered for the next session.".to_string(),
                "Your vote has been cast.".to_string()
            ]
        );

        advance(Duration::from_secs(1)).await;
        let session = rt.registry.snapshot(CHANNEL).await.unwrap();
        assert_eq!(session.state, SessionState::Working { mode: Mode::Lazy });

        // The fast-mode EndBreak timer comes due here and must be ignored
        advance(minutes(10)).await;
        let session = rt.registry.snapshot(CHANNEL).await.unwrap();
        assert_eq!(session.state, SessionState::Working { mode: Mode::Lazy });
    }

    #[tokio::test(start_paused = true)]
    async fn test_part_cancels_pending_timers() {
        let rt = TestRegistry::new().build();
        rt.registry.join(CHANNEL).await;
        rt.registry.dispatch(CHANNEL, start(Mode::Fast, "alice")).await.unwrap();

        assert!(rt.registry.part(CHANNEL).await);
        advance(minutes(10)).await;
        assert!(!rt.notices.any_to_starting_with(CHANNEL, "Pomodoro starts at"));

        // Re-join starts from scratch
        assert!(!rt.registry.join(CHANNEL).await);
        let session = rt.registry.snapshot(CHANNEL).await.unwrap();
        assert_eq!(session.state, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_channels_are_case_insensitive() {
        let rt = TestRegistry::new().build();
        assert!(!rt.registry.join("#Rust").await);
        assert!(!rt.registry.join("#go").await);
        assert_eq!(rt.registry.channels().await, vec!["#go", "#rust"]);

        assert!(rt.registry.part("#RUST").await);
        assert!(!rt.registry.part("#rust").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejoin_discards_running_session() {
        let rt = TestRegistry::new().build();
        rt.registry.join(CHANNEL).await;
        rt.registry.dispatch(CHANNEL, start(Mode::Fast, "alice")).await.unwrap();

        assert!(rt.registry.join("#POMODORO").await);
        let session = rt.registry.snapshot(CHANNEL).await.unwrap();
        assert_eq!(session.state, SessionState::Idle);

        // The discarded session's registration timer never fires
        advance(minutes(10)).await;
        assert!(!rt.notices.any_to_starting_with(CHANNEL, "Pomodoro starts at"));
    }

    #[tokio::test]
    async fn test_unknown_channel() {
        let rt = TestRegistry::new().build();
        let err = rt
            .registry
            .dispatch("#nowhere", start(Mode::Fast, "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ChannelNotFound(ref c) if c == "#nowhere"));
    }

    #[tokio::test]
    async fn test_transition_errors_reach_caller() {
        let rt = TestRegistry::new().build();
        rt.registry.join(CHANNEL).await;

        let err = rt
            .registry
            .dispatch(CHANNEL, register("bob", "x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Transition(TransitionError::NoActiveSession { .. })
        ));

        rt.registry.dispatch(CHANNEL, start(Mode::Long, "alice")).await.unwrap();
        let err = rt
            .registry
            .dispatch(CHANNEL, start(Mode::Fast, "bob"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "A pomodoro session is already running in this channel."
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_all_sessions() {
        let rt = TestRegistry::new().build();
        rt.registry.join("#a").await;
        rt.registry.join("#b").await;
        rt.registry.shutdown().await;
        assert!(rt.registry.channels().await.is_empty());
    }
}
