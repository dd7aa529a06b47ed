//! Outbound Bot API client

use super::types::{AnswerCallbackQuery, ApiResponse, ReplyMarkup, SendChatAction, SendMessage};
use crate::config::TelegramConfig;
use crate::runtime::Messenger;
use crate::state_machine::Reply;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Telegram rejects longer message texts
pub const MAX_MESSAGE_CHARS: usize = 4096;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(reqwest::Error),
    #[error("Telegram API error ({status}): {description}")]
    Api { status: u16, description: String },
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL embeds the bot token
        TelegramError::Http(e.without_url())
    }
}

pub struct TelegramClient {
    client: Client,
    /// `{api_url}/bot{token}`
    base_url: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }

    /// Call a Bot API method, failing unless the envelope says `ok`
    async fn call(&self, method: &str, body: &impl Serialize) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let envelope: Option<ApiResponse> = response.json().await.ok();

        match envelope {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            other => Err(TelegramError::Api {
                status: status.as_u16(),
                description: other
                    .and_then(|e| e.description)
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }

    /// Send HTML text, split to fit the length limit. Markup rides on the last chunk.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        mut markup: Option<ReplyMarkup>,
    ) -> Result<(), TelegramError> {
        let chunks = split_message(text, MAX_MESSAGE_CHARS);
        let last = chunks.len().saturating_sub(1);

        for (index, chunk) in chunks.iter().enumerate() {
            let body = SendMessage {
                chat_id,
                text: chunk,
                parse_mode: "HTML",
                reply_markup: if index == last { markup.take() } else { None },
            };
            self.call("sendMessage", &body).await?;
        }
        Ok(())
    }

    pub async fn send_typing(&self, chat_id: i64) -> Result<(), TelegramError> {
        let body = SendChatAction {
            chat_id,
            action: "typing",
        };
        self.call("sendChatAction", &body).await
    }

    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<(), TelegramError> {
        let body = AnswerCallbackQuery {
            callback_query_id: callback_id,
        };
        self.call("answerCallbackQuery", &body).await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), String> {
        self.send_message(chat_id, &reply.text, ReplyMarkup::from_markup(&reply.markup))
            .await
            .map_err(|e| e.to_string())
    }

    async fn show_typing(&self, chat_id: i64) -> Result<(), String> {
        self.send_typing(chat_id).await.map_err(|e| e.to_string())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), String> {
        self.answer_callback_query(callback_id)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Split text into chunks of at most `limit` characters, preferring line breaks
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // Whether `current` holds at least one line, possibly empty
    let mut started = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let separator = usize::from(started);

        if current_len + separator + line_len <= limit {
            if started {
                current.push('\n');
            }
            current.push_str(line);
            current_len += separator + line_len;
            started = true;
            continue;
        }

        if started {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
            started = false;
        }

        // A single line over the limit is cut on character boundaries
        let chars: Vec<char> = line.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let mut end = (start + limit).min(chars.len());
            if end < chars.len() {
                end = open_entity(&chars[start..end]).map_or(end, |at| start + at);
            }
            let piece: String = chars[start..end].iter().collect();
            if end < chars.len() {
                chunks.push(piece);
            } else {
                current = piece;
                current_len = end - start;
                started = true;
            }
            start = end;
        }
    }

    if started || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Offset of an HTML entity (`&amp;`, `&lt;`, ...) left unterminated at the
/// end of `piece`. Never 0, so every cut makes progress.
fn open_entity(piece: &[char]) -> Option<usize> {
    let amp = piece.iter().rposition(|&c| c == '&')?;
    let terminated = piece[amp..].contains(&';');
    (!terminated && amp > 0).then_some(amp)
}
