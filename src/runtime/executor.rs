//! Per-user runtime executor

use super::traits::Messenger;
use super::{InboundUpdate, IDLE_TIMEOUT};

use crate::generation::IdeaGenerator;
use crate::session::{SessionStore, UserId};
use crate::state_machine::{transition, Effect, Event};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Telegram drops a chat action after about five seconds
pub const TYPING_REFRESH: Duration = Duration::from_secs(4);

/// Actor that owns one user's dialogue
pub struct UserRuntime<M, G>
where
    M: Messenger + ?Sized + 'static,
    G: IdeaGenerator + ?Sized + 'static,
{
    user: UserId,
    store: Arc<SessionStore>,
    messenger: Arc<M>,
    generator: Arc<G>,
    update_rx: mpsc::Receiver<InboundUpdate>,
    idle_timeout: Duration,
}

impl<M, G> UserRuntime<M, G>
where
    M: Messenger + ?Sized + 'static,
    G: IdeaGenerator + ?Sized + 'static,
{
    pub fn new(
        user: UserId,
        store: Arc<SessionStore>,
        messenger: Arc<M>,
        generator: Arc<G>,
        update_rx: mpsc::Receiver<InboundUpdate>,
    ) -> Self {
        Self {
            user,
            store,
            messenger,
            generator,
            update_rx,
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub async fn run(mut self) {
        tracing::debug!(user_id = %self.user, "Starting user runtime");

        loop {
            match tokio::time::timeout(self.idle_timeout, self.update_rx.recv()).await {
                Ok(Some(update)) => self.process_update(update).await,
                Ok(None) => break,
                Err(_) => {
                    // Refuse new updates, then finish whatever was already queued
                    self.update_rx.close();
                    while let Some(update) = self.update_rx.recv().await {
                        self.process_update(update).await;
                    }
                    tracing::debug!(user_id = %self.user, "User runtime idle");
                    break;
                }
            }
        }
    }

    /// Run one update and every completion event it causes
    pub async fn process_update(&mut self, update: InboundUpdate) {
        let InboundUpdate {
            chat_id,
            callback_id,
            event,
            ..
        } = update;

        if let Some(callback_id) = callback_id {
            if let Err(e) = self.messenger.answer_callback(&callback_id).await {
                tracing::warn!(user_id = %self.user, error = %e, "Failed to answer callback");
            }
        }

        let mut events = VecDeque::from([event]);
        while let Some(event) = events.pop_front() {
            let session = self.store.current(self.user).await;
            let event_kind = event.kind();

            let result = match transition(&session, event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(user_id = %self.user, error = %e, "Dropping stale event");
                    continue;
                }
            };

            let new_state = result.resulting_state(session.state);
            if new_state != session.state {
                tracing::info!(
                    user_id = %self.user,
                    event = event_kind,
                    from = %session.state,
                    to = %new_state,
                    "State changed"
                );
            }

            self.store.apply(self.user, result.session).await;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(chat_id, effect).await {
                    events.push_back(generated);
                }
            }
        }
    }

    /// Execute an effect and optionally return a completion event
    async fn execute_effect(&mut self, chat_id: i64, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Reply(reply) => {
                if let Err(e) = self.messenger.send_reply(chat_id, &reply).await {
                    tracing::error!(user_id = %self.user, error = %e, "Failed to send reply");
                }
                None
            }

            Effect::ShowTyping => {
                Self::show_typing(&self.messenger, self.user, chat_id).await;
                None
            }

            Effect::GenerateIdeas(params) => {
                let work = self.generator.generate_ideas(&params);
                let result = Self::while_typing(&self.messenger, self.user, chat_id, work).await;
                match &result {
                    Ok(ideas) => {
                        tracing::info!(user_id = %self.user, count = ideas.len(), "Ideas generated");
                    }
                    Err(e) => {
                        tracing::error!(user_id = %self.user, error = %e, "Idea generation failed");
                    }
                }
                Some(Event::IdeasGenerated(result))
            }

            Effect::GeneratePost { params, idea } => {
                let work = self.generator.generate_post(&params, &idea);
                let result = Self::while_typing(&self.messenger, self.user, chat_id, work).await;
                match &result {
                    Ok(post) => {
                        tracing::info!(user_id = %self.user, chars = post.chars().count(), "Post generated");
                    }
                    Err(e) => {
                        tracing::error!(user_id = %self.user, error = %e, "Post generation failed");
                    }
                }
                Some(Event::PostGenerated(result))
            }
        }
    }

    async fn show_typing(messenger: &M, user: UserId, chat_id: i64) {
        if let Err(e) = messenger.show_typing(chat_id).await {
            tracing::debug!(user_id = %user, error = %e, "Failed to show typing");
        }
    }

    /// Await `work`, re-sending the typing action until it finishes
    async fn while_typing<T>(
        messenger: &M,
        user: UserId,
        chat_id: i64,
        work: impl Future<Output = T>,
    ) -> T {
        tokio::pin!(work);
        let mut refresh = interval_at(Instant::now() + TYPING_REFRESH, TYPING_REFRESH);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                result = &mut work => return result,
                _ = refresh.tick() => Self::show_typing(messenger, user, chat_id).await,
            }
        }
    }
}
