//! Runtime for executing conversations
//!
//! One actor task per user. Updates for a user are processed strictly in
//! arrival order, and generation completions are fed back before the next
//! update is taken off the inbox. Different users never wait on each other.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::UserRuntime;
pub use traits::*;

use crate::generation::IdeaGenerator;
use crate::session::{SessionStore, UserId};
use crate::state_machine::Event;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Type alias for the production runtime with trait-object services
pub type ProductionRuntime = UserRuntime<dyn Messenger, dyn IdeaGenerator>;

/// An actor exits after this long without updates
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const INBOX_CAPACITY: usize = 32;

/// One classified inbound update, ready for the engine
#[derive(Debug, Clone)]
pub struct InboundUpdate {
    pub user: UserId,
    /// Where replies go
    pub chat_id: i64,
    /// Set for button presses, which must be acknowledged
    pub callback_id: Option<String>,
    pub event: Event,
}

/// Handle to interact with a running user actor
#[derive(Clone)]
pub struct UserHandle {
    pub update_tx: mpsc::Sender<InboundUpdate>,
}

/// Manager for all user runtimes
pub struct RuntimeManager {
    store: Arc<SessionStore>,
    messenger: Arc<dyn Messenger>,
    generator: Arc<dyn IdeaGenerator>,
    runtimes: RwLock<HashMap<UserId, UserHandle>>,
    idle_timeout: Duration,
}

impl RuntimeManager {
    pub fn new(
        store: Arc<SessionStore>,
        messenger: Arc<dyn Messenger>,
        generator: Arc<dyn IdeaGenerator>,
    ) -> Self {
        Self {
            store,
            messenger,
            generator,
            runtimes: RwLock::new(HashMap::new()),
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Get the running actor for a user, spawning one if there is none
    pub async fn get_or_create(&self, user: UserId) -> UserHandle {
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(&user) {
                if !handle.update_tx.is_closed() {
                    return handle.clone();
                }
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another update may have spawned it while we waited for the lock
        if let Some(handle) = runtimes.get(&user) {
            if !handle.update_tx.is_closed() {
                return handle.clone();
            }
        }

        runtimes.retain(|_, handle| !handle.update_tx.is_closed());

        let (update_tx, update_rx) = mpsc::channel(INBOX_CAPACITY);
        let runtime: ProductionRuntime = UserRuntime::new(
            user,
            self.store.clone(),
            self.messenger.clone(),
            self.generator.clone(),
            update_rx,
        )
        .with_idle_timeout(self.idle_timeout);

        tokio::spawn(async move {
            runtime.run().await;
            tracing::debug!(user_id = %user, "User runtime finished");
        });

        let handle = UserHandle { update_tx };
        runtimes.insert(user, handle.clone());
        handle
    }

    /// Queue an update on its user's actor
    pub async fn dispatch(&self, update: InboundUpdate) -> Result<(), String> {
        let user = update.user;
        let handle = self.get_or_create(user).await;
        match handle.update_tx.send(update).await {
            Ok(()) => Ok(()),
            // The actor went idle between lookup and send
            Err(mpsc::error::SendError(update)) => self
                .get_or_create(user)
                .await
                .update_tx
                .send(update)
                .await
                .map_err(|e| format!("Failed to queue update: {e}")),
        }
    }

    /// Number of users with a live actor
    #[cfg(test)]
    pub async fn active_users(&self) -> usize {
        self.runtimes
            .read()
            .await
            .values()
            .filter(|h| !h.update_tx.is_closed())
            .count()
    }
}
