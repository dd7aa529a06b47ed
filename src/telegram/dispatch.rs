//! Inbound dispatcher: turn one Bot API update into one engine event

use super::types::{CallbackQuery, Message, Update};
use crate::runtime::InboundUpdate;
use crate::session::UserId;
use crate::state_machine::{Command, Event};

/// Classify an update. `None` means there is nothing to answer
/// (edited messages, channel posts, updates from other bots).
pub fn classify(update: &Update) -> Option<InboundUpdate> {
    if let Some(query) = &update.callback_query {
        return classify_callback(query);
    }
    update.message.as_ref().and_then(classify_message)
}

fn classify_callback(query: &CallbackQuery) -> Option<InboundUpdate> {
    if query.from.is_bot {
        return None;
    }
    let event = query
        .data
        .as_deref()
        .and_then(Event::from_callback_data)
        .unwrap_or(Event::Unsupported);

    Some(InboundUpdate {
        user: UserId(query.from.id),
        // Old buttons may come without their message; a private chat id equals the user id
        chat_id: query.message.as_ref().map_or(query.from.id, |m| m.chat.id),
        callback_id: Some(query.id.clone()),
        event,
    })
}

fn classify_message(message: &Message) -> Option<InboundUpdate> {
    let from = message.from.as_ref().filter(|u| !u.is_bot)?;

    let event = match message.text.as_deref() {
        Some(text) => match Command::parse(text) {
            Some(Some(command)) => Event::Command(command),
            Some(None) => Event::Unsupported,
            // Keyboard labels stay text; the engine knows whether an answer is expected
            None => Event::Text(text.to_string()),
        },
        None => Event::Unsupported,
    };

    Some(InboundUpdate {
        user: UserId(from.id),
        chat_id: message.chat.id,
        callback_id: None,
        event,
    })
}
