//! Telegram Bot API transport
//!
//! Inbound updates arrive on the webhook and are classified into engine
//! events; outbound replies go through [`TelegramClient`].
//!
//! API Reference: <https://core.telegram.org/bots/api>

mod client;
mod dispatch;
mod types;

pub use client::TelegramClient;
pub use dispatch::classify;
pub use types::Update;
