//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{InboundUpdate, UserRuntime};
use crate::generation::{GenerationError, IdeaGenerator, IdeaParams};
use crate::llm::LlmError;
use crate::session::{Idea, Session, SessionStore, UserId};
use crate::state_machine::{Event, Reply};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

// ============================================================================
// Mock Generator
// ============================================================================

/// Mock generator that returns queued results
#[derive(Default)]
pub struct MockGenerator {
    ideas: Mutex<VecDeque<Result<Vec<Idea>, GenerationError>>>,
    posts: Mutex<VecDeque<Result<String, GenerationError>>>,
    /// When set, idea generation waits for a permit before answering
    gate: Option<Arc<Notify>>,
    /// Record of all idea requests made
    pub idea_requests: Mutex<Vec<IdeaParams>>,
    /// Record of all post requests made
    pub post_requests: Mutex<Vec<(IdeaParams, Idea)>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn queue_ideas(&self, ideas: Vec<Idea>) {
        self.ideas.lock().unwrap().push_back(Ok(ideas));
    }

    pub fn queue_ideas_error(&self, error: GenerationError) {
        self.ideas.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_post(&self, post: impl Into<String>) {
        self.posts.lock().unwrap().push_back(Ok(post.into()));
    }

    pub fn queue_post_error(&self, error: GenerationError) {
        self.posts.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_idea_requests(&self) -> Vec<IdeaParams> {
        self.idea_requests.lock().unwrap().clone()
    }

    pub fn recorded_post_requests(&self) -> Vec<(IdeaParams, Idea)> {
        self.post_requests.lock().unwrap().clone()
    }
}

fn nothing_queued() -> GenerationError {
    GenerationError::Transport(LlmError::network("No mock result queued"))
}

#[async_trait]
impl IdeaGenerator for MockGenerator {
    async fn generate_ideas(&self, params: &IdeaParams) -> Result<Vec<Idea>, GenerationError> {
        self.idea_requests.lock().unwrap().push(params.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.ideas
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(nothing_queued()))
    }

    async fn generate_post(
        &self,
        params: &IdeaParams,
        idea: &Idea,
    ) -> Result<String, GenerationError> {
        self.post_requests
            .lock()
            .unwrap()
            .push((params.clone(), idea.clone()));
        self.posts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(nothing_queued()))
    }
}

// ============================================================================
// Recording Messenger
// ============================================================================

/// Everything the runtime asked the transport to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Reply { chat_id: i64, reply: Reply },
    Typing { chat_id: i64 },
    CallbackAnswered { callback_id: String },
}

/// Messenger that records outbound traffic instead of sending it
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Outbound>>,
    /// When set, every send fails with this message
    fail_with: Option<String>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn outbound(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies_to(None)
    }

    /// Replies, optionally only those sent to `chat_id`
    pub fn replies_to(&self, chat_id: Option<i64>) -> Vec<Reply> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|o| match o {
                Outbound::Reply { chat_id: to, reply } if chat_id.is_none_or(|c| c == *to) => {
                    Some(reply.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn last_reply(&self) -> Option<Reply> {
        self.replies().pop()
    }

    /// Poll until at least `count` replies reached `chat_id`
    pub async fn wait_for_replies(&self, chat_id: i64, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.replies_to(Some(chat_id)).len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    fn record(&self, outbound: Outbound) -> Result<(), String> {
        self.sent.lock().unwrap().push(outbound);
        match &self.fail_with {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), String> {
        self.record(Outbound::Reply {
            chat_id,
            reply: reply.clone(),
        })
    }

    async fn show_typing(&self, chat_id: i64) -> Result<(), String> {
        self.record(Outbound::Typing { chat_id })
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), String> {
        self.record(Outbound::CallbackAnswered {
            callback_id: callback_id.to_string(),
        })
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

pub const TEST_USER: UserId = UserId(42);
pub const TEST_CHAT: i64 = 4242;

/// A single user's runtime driven directly, without a spawned task
pub struct TestRuntime {
    pub runtime: UserRuntime<RecordingMessenger, MockGenerator>,
    pub store: Arc<SessionStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub generator: Arc<MockGenerator>,
    _update_tx: mpsc::Sender<InboundUpdate>,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self::with_messenger(RecordingMessenger::new())
    }

    pub fn with_messenger(messenger: RecordingMessenger) -> Self {
        let store = Arc::new(SessionStore::new());
        let messenger = Arc::new(messenger);
        let generator = Arc::new(MockGenerator::new());
        let (update_tx, update_rx) = mpsc::channel(8);
        let runtime = UserRuntime::new(
            TEST_USER,
            store.clone(),
            messenger.clone(),
            generator.clone(),
            update_rx,
        );
        Self {
            runtime,
            store,
            messenger,
            generator,
            _update_tx: update_tx,
        }
    }

    pub async fn with_session(self, session: Session) -> Self {
        self.store.put(TEST_USER, session).await;
        self
    }

    pub async fn send(&mut self, event: Event) {
        self.runtime
            .process_update(InboundUpdate {
                user: TEST_USER,
                chat_id: TEST_CHAT,
                callback_id: None,
                event,
            })
            .await;
    }

    pub async fn press(&mut self, callback_id: &str, event: Event) {
        self.runtime
            .process_update(InboundUpdate {
                user: TEST_USER,
                chat_id: TEST_CHAT,
                callback_id: Some(callback_id.to_string()),
                event,
            })
            .await;
    }

    pub async fn text(&mut self, text: &str) {
        self.send(Event::Text(text.to_string())).await;
    }

    pub async fn session(&self) -> Session {
        self.store.current(TEST_USER).await
    }
}

pub fn sample_ideas(n: usize) -> Vec<Idea> {
    (0..n)
        .map(|i| Idea::new(format!("Idea {i}"), format!("About {i}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::executor::TYPING_REFRESH;
    use crate::runtime::RuntimeManager;
    use crate::session::SessionState;
    use crate::state_machine::event::PICK_ANOTHER_LABEL;
    use crate::state_machine::{messages, Command, FollowUp, Markup};

    fn transport_error() -> GenerationError {
        GenerationError::Transport(LlmError::network("connection refused"))
    }

    fn selecting(n: usize) -> Session {
        Session {
            state: SessionState::AwaitingIdeaSelection,
            niche: Some("fitness".into()),
            goal: Some("grow audience".into()),
            format: Some("instagram post".into()),
            ideas: sample_ideas(n),
            selected_idea: None,
        }
    }

    fn awaiting_format() -> Session {
        Session {
            state: SessionState::AwaitingFormat,
            niche: Some("fitness".into()),
            goal: Some("grow audience".into()),
            ..Session::default()
        }
    }

    #[tokio::test]
    async fn test_mock_generator_records_and_drains() {
        let generator = MockGenerator::new();
        generator.queue_ideas(sample_ideas(2));
        let params = IdeaParams::new("a", "b", "c");

        assert_eq!(generator.generate_ideas(&params).await.unwrap().len(), 2);
        assert!(generator.generate_ideas(&params).await.is_err());
        assert_eq!(generator.recorded_idea_requests(), vec![params.clone(), params]);
    }

    /// /start, niche, goal, format, five ideas with buttons 0..4
    #[tokio::test]
    async fn test_full_dialogue_reaches_idea_selection() {
        let mut rt = TestRuntime::new();
        rt.generator.queue_ideas(sample_ideas(5));

        rt.send(Event::Command(Command::Start)).await;
        rt.text("fitness").await;
        rt.text("grow audience").await;
        rt.text("instagram post").await;

        let session = rt.session().await;
        assert_eq!(session.state, SessionState::AwaitingIdeaSelection);
        assert_eq!(session.ideas.len(), 5);
        assert_eq!(session.niche.as_deref(), Some("fitness"));
        assert_eq!(session.goal.as_deref(), Some("grow audience"));
        assert_eq!(session.format.as_deref(), Some("instagram post"));

        // One reply per inbound update
        let replies = rt.messenger.replies();
        assert_eq!(replies.len(), 4);
        match &replies[3].markup {
            Markup::Inline(buttons) => {
                let data: Vec<&str> = buttons.iter().map(|b| b.data.as_str()).collect();
                assert_eq!(data, ["idea_0", "idea_1", "idea_2", "idea_3", "idea_4"]);
            }
            other => panic!("expected idea buttons, got {other:?}"),
        }

        assert_eq!(
            rt.generator.recorded_idea_requests(),
            vec![IdeaParams::new("fitness", "grow audience", "instagram post")]
        );
        assert!(rt
            .messenger
            .outbound()
            .contains(&Outbound::Typing { chat_id: TEST_CHAT }));
    }

    /// Out-of-range selection leaves everything as it was
    #[tokio::test]
    async fn test_out_of_range_selection_rejected() {
        let mut rt = TestRuntime::new().with_session(selecting(3)).await;

        rt.press("cb-1", Event::IdeaSelected(5)).await;

        assert_eq!(rt.session().await, selecting(3));
        assert_eq!(rt.messenger.last_reply(), Some(messages::invalid_idea()));
        assert!(rt.generator.recorded_post_requests().is_empty());
    }

    /// A transport failure keeps AwaitingFormat; the same text retries
    #[tokio::test]
    async fn test_idea_failure_then_retry() {
        let mut rt = TestRuntime::new().with_session(awaiting_format()).await;
        rt.generator.queue_ideas_error(transport_error());
        rt.generator.queue_ideas(sample_ideas(5));

        rt.text("instagram post").await;
        assert_eq!(rt.session().await.state, SessionState::AwaitingFormat);
        assert_eq!(rt.messenger.last_reply(), Some(messages::ideas_failed()));

        rt.text("instagram post").await;
        let session = rt.session().await;
        assert_eq!(session.state, SessionState::AwaitingIdeaSelection);
        assert_eq!(session.ideas.len(), 5);

        let requests = rt.generator.recorded_idea_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_selection_produces_post_and_follow_ups() {
        let mut rt = TestRuntime::new().with_session(selecting(3)).await;
        rt.generator.queue_post("Ten-minute morning routine...");

        rt.press("cb-7", Event::IdeaSelected(1)).await;

        let outbound = rt.messenger.outbound();
        assert_eq!(
            outbound[0],
            Outbound::CallbackAnswered {
                callback_id: "cb-7".into()
            }
        );
        assert_eq!(
            rt.messenger.last_reply(),
            Some(messages::post("Ten-minute morning routine...", "Idea 1"))
        );
        assert_eq!(rt.messenger.replies().len(), 1);

        let (params, idea) = rt.generator.recorded_post_requests().remove(0);
        assert_eq!(params, IdeaParams::new("fitness", "grow audience", "instagram post"));
        assert_eq!(idea, sample_ideas(3)[1]);

        let session = rt.session().await;
        assert_eq!(session.selected_idea, None);
        assert_eq!(session.state, SessionState::AwaitingIdeaSelection);

        // The list is still there for another pick, via the reply keyboard
        rt.text(PICK_ANOTHER_LABEL).await;
        assert_eq!(
            rt.messenger.last_reply(),
            Some(messages::other_ideas(&sample_ideas(3)))
        );
    }

    #[tokio::test]
    async fn test_post_failure_keeps_ideas() {
        let mut rt = TestRuntime::new().with_session(selecting(3)).await;
        rt.generator.queue_post_error(transport_error());

        rt.send(Event::IdeaSelected(0)).await;

        assert_eq!(rt.messenger.last_reply(), Some(messages::post_failed()));
        assert_eq!(rt.session().await, selecting(3));
    }

    #[tokio::test]
    async fn test_cancel_removes_session() {
        let mut rt = TestRuntime::new().with_session(selecting(3)).await;

        rt.send(Event::Command(Command::Cancel)).await;

        assert!(rt.store.get(TEST_USER).await.is_none());
        assert_eq!(rt.messenger.last_reply(), Some(messages::cancelled()));
    }

    #[tokio::test]
    async fn test_new_ideas_restarts_from_selection() {
        let mut rt = TestRuntime::new().with_session(selecting(5)).await;

        rt.send(Event::FollowUp(FollowUp::NewIdeas)).await;

        assert_eq!(rt.session().await, Session::started());
    }

    #[tokio::test]
    async fn test_send_failure_does_not_change_state() {
        let mut rt =
            TestRuntime::with_messenger(RecordingMessenger::failing("chat not found"));

        rt.send(Event::Command(Command::Start)).await;
        rt.text("fitness").await;

        let session = rt.session().await;
        assert_eq!(session.state, SessionState::AwaitingGoal);
        assert_eq!(session.niche.as_deref(), Some("fitness"));
    }

    // ------------------------------------------------------------------------
    // Manager
    // ------------------------------------------------------------------------

    fn update(user: i64, event: Event) -> InboundUpdate {
        InboundUpdate {
            user: UserId(user),
            chat_id: user,
            callback_id: None,
            event,
        }
    }

    /// A slow generation for one user never blocks another user
    #[tokio::test]
    async fn test_users_do_not_block_each_other() {
        let gate = Arc::new(Notify::new());
        let generator = Arc::new(MockGenerator::gated(gate.clone()));
        generator.queue_ideas(sample_ideas(5));
        let messenger = Arc::new(RecordingMessenger::new());
        let manager = RuntimeManager::new(
            Arc::new(SessionStore::new()),
            messenger.clone(),
            generator.clone(),
        );
        manager.store().put(UserId(1), awaiting_format()).await;

        manager
            .dispatch(update(1, Event::Text("instagram post".into())))
            .await
            .unwrap();
        manager
            .dispatch(update(2, Event::Command(Command::Start)))
            .await
            .unwrap();

        assert!(messenger.wait_for_replies(2, 1, Duration::from_secs(2)).await);
        assert!(messenger.replies_to(Some(1)).is_empty());

        gate.notify_one();
        assert!(messenger.wait_for_replies(1, 1, Duration::from_secs(2)).await);
        assert_eq!(
            manager.store().current(UserId(1)).await.state,
            SessionState::AwaitingIdeaSelection
        );
    }

    /// A slow generation keeps the typing indicator alive until it answers
    #[tokio::test(start_paused = true)]
    async fn test_typing_refreshed_while_generating() {
        let gate = Arc::new(Notify::new());
        let generator = Arc::new(MockGenerator::gated(gate.clone()));
        generator.queue_ideas(sample_ideas(5));
        let messenger = Arc::new(RecordingMessenger::new());
        let manager = RuntimeManager::new(
            Arc::new(SessionStore::new()),
            messenger.clone(),
            generator.clone(),
        );
        manager.store().put(UserId(1), awaiting_format()).await;
        let typing = |m: &RecordingMessenger| {
            m.outbound()
                .iter()
                .filter(|o| matches!(o, Outbound::Typing { chat_id: 1 }))
                .count()
        };

        manager
            .dispatch(update(1, Event::Text("instagram post".into())))
            .await
            .unwrap();
        tokio::time::sleep(TYPING_REFRESH * 3 + Duration::from_secs(1)).await;

        // The initial action plus three refreshes
        assert_eq!(typing(&messenger), 4);
        assert!(messenger.replies_to(Some(1)).is_empty());

        gate.notify_one();
        assert!(messenger.wait_for_replies(1, 1, Duration::from_secs(1)).await);
        let settled = typing(&messenger);
        tokio::time::sleep(TYPING_REFRESH * 2).await;
        assert_eq!(typing(&messenger), settled);
    }

    /// Updates for one user are handled in arrival order
    #[tokio::test]
    async fn test_updates_for_one_user_stay_ordered() {
        let messenger = Arc::new(RecordingMessenger::new());
        let manager = RuntimeManager::new(
            Arc::new(SessionStore::new()),
            messenger.clone(),
            Arc::new(MockGenerator::new()),
        );

        for event in [
            Event::Command(Command::Start),
            Event::Text("fitness".into()),
            Event::Text("grow audience".into()),
        ] {
            manager.dispatch(update(7, event)).await.unwrap();
        }

        assert!(messenger.wait_for_replies(7, 3, Duration::from_secs(2)).await);
        let session = manager.store().current(UserId(7)).await;
        assert_eq!(session.state, SessionState::AwaitingFormat);
        assert_eq!(session.goal.as_deref(), Some("grow audience"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_actor_exits_and_respawns() {
        let messenger = Arc::new(RecordingMessenger::new());
        let manager = RuntimeManager::new(
            Arc::new(SessionStore::new()),
            messenger.clone(),
            Arc::new(MockGenerator::new()),
        )
        .with_idle_timeout(Duration::from_secs(60));

        manager
            .dispatch(update(3, Event::Command(Command::Start)))
            .await
            .unwrap();
        assert!(messenger.wait_for_replies(3, 1, Duration::from_secs(1)).await);
        assert_eq!(manager.active_users().await, 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(manager.active_users().await, 0);

        // The session outlives the actor
        manager
            .dispatch(update(3, Event::Text("fitness".into())))
            .await
            .unwrap();
        assert!(messenger.wait_for_replies(3, 2, Duration::from_secs(1)).await);
        assert_eq!(
            manager.store().current(UserId(3)).await.state,
            SessionState::AwaitingGoal
        );
    }
}
