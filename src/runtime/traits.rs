//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::state_machine::Reply;
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound side of the messaging transport
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one rendered reply to a chat
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), String>;

    /// Show a "typing" indicator in a chat
    async fn show_typing(&self, chat_id: i64) -> Result<(), String>;

    /// Acknowledge a button press so the client stops its spinner
    async fn answer_callback(&self, callback_id: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), String> {
        (**self).send_reply(chat_id, reply).await
    }

    async fn show_typing(&self, chat_id: i64) -> Result<(), String> {
        (**self).show_typing(chat_id).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), String> {
        (**self).answer_callback(callback_id).await
    }
}
