//! Bot API wire types
//!
//! Only the fields the bot reads are modelled; serde skips the rest.

use crate::state_machine::Markup;
use serde::{Deserialize, Serialize};

// ============================================================================
// Inbound
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// The message the button was attached to; absent when it is too old
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

// ============================================================================
// Outbound
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
pub struct SendChatAction {
    pub chat_id: i64,
    pub action: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
        one_time_keyboard: bool,
    },
    Remove {
        remove_keyboard: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl ReplyMarkup {
    /// Wire form of a reply's choices, one button per row
    pub fn from_markup(markup: &Markup) -> Option<Self> {
        match markup {
            Markup::None => None,
            Markup::Inline(buttons) => Some(ReplyMarkup::Inline {
                inline_keyboard: buttons
                    .iter()
                    .map(|b| {
                        vec![InlineKeyboardButton {
                            text: b.label.clone(),
                            callback_data: b.data.clone(),
                        }]
                    })
                    .collect(),
            }),
            Markup::Keyboard(labels) => Some(ReplyMarkup::Keyboard {
                keyboard: labels
                    .iter()
                    .map(|text| vec![KeyboardButton { text: text.clone() }])
                    .collect(),
                resize_keyboard: true,
                one_time_keyboard: true,
            }),
            Markup::RemoveKeyboard => Some(ReplyMarkup::Remove {
                remove_keyboard: true,
            }),
        }
    }
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
}
