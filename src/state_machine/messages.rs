//! User-facing message texts (Telegram HTML subset)

use super::effect::{Markup, Reply};
use super::event::Command;
use crate::session::{Idea, MAX_IDEAS};
use std::fmt::Write;

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn welcome() -> Reply {
    Reply::text(format!(
        "🎯 <b>Welcome to AI-IdeaFactory!</b>\n\n\
         I'll help you come up with great content ideas using AI.\n\n\
         <b>How it works:</b>\n\
         1️⃣ Tell me your niche\n\
         2️⃣ Set the goal of your content\n\
         3️⃣ Choose the content format\n\
         4️⃣ Get {MAX_IDEAS} ready-made ideas\n\
         5️⃣ Pick one and get a complete post\n\n\
         📌 Let's begin! What is your <b>niche</b>? \
         (for example: fitness, education, business, blogging)"
    ))
    .with_markup(Markup::RemoveKeyboard)
}

pub fn restarted() -> Reply {
    Reply::text("🎯 <b>New round of ideas!</b>\n\nWhat is your <b>niche</b>?")
        .with_markup(Markup::RemoveKeyboard)
}

pub fn ask_goal(niche: &str) -> Reply {
    Reply::text(format!(
        "✅ <b>Niche:</b> {}\n\n\
         Now tell me the <b>goal of your content</b>\n\
         (for example: grow an audience, educate, sell, entertain)",
        escape_html(niche)
    ))
}

pub fn ask_format(goal: &str) -> Reply {
    Reply::text(format!(
        "✅ <b>Goal:</b> {}\n\n\
         Now choose the <b>content format</b>\n\
         (for example: social media post, article, video, reel, carousel)",
        escape_html(goal)
    ))
}

/// Rejection for an answer shorter than two characters
pub fn invalid_answer(field: &str) -> Reply {
    Reply::text(format!(
        "❌ Please enter a valid {field} (at least 2 characters)"
    ))
}

pub fn idea_list(ideas: &[Idea], heading: &str) -> Reply {
    let mut text = format!("🎨 <b>{heading}</b>\n\n");
    for (index, idea) in ideas.iter().take(MAX_IDEAS).enumerate() {
        let _ = write!(
            text,
            "<b>💡 Idea {}:</b>\n<i>{}</i>\n{}\n\n",
            index + 1,
            escape_html(&idea.title),
            escape_html(&idea.description)
        );
    }
    text.push_str("👇 Pick an idea to get a ready-to-publish post:");
    Reply::text(text).with_markup(Markup::idea_buttons(ideas))
}

pub fn fresh_ideas(ideas: &[Idea]) -> Reply {
    idea_list(ideas, "Here are ideas for your content:")
}

pub fn other_ideas(ideas: &[Idea]) -> Reply {
    idea_list(ideas, "Pick another idea:")
}

pub fn post(post: &str, idea_title: &str) -> Reply {
    Reply::text(format!(
        "📝 <b>Your post:</b>\n\n{}\n\n<i>Based on the idea: {}</i>\n\nWhat's next?",
        escape_html(post),
        escape_html(idea_title)
    ))
    .with_markup(Markup::follow_ups())
}

pub fn ideas_failed() -> Reply {
    Reply::text(
        "❌ Something went wrong while generating ideas. \
         Send the format again to retry.",
    )
}

pub fn post_failed() -> Reply {
    Reply::text(
        "❌ Something went wrong while writing the post. \
         Pick the idea again to retry.",
    )
}

pub fn invalid_idea() -> Reply {
    Reply::text("❌ That idea is not on the list. Please pick one of the buttons.")
}

pub fn session_lost() -> Reply {
    Reply::text(format!(
        "❌ Your session data was lost. Start over with {}",
        Command::Start.as_str()
    ))
}

pub fn cancelled() -> Reply {
    Reply::text(format!(
        "❌ Dialogue cancelled. Send {} to begin again.",
        Command::Start.as_str()
    ))
    .with_markup(Markup::RemoveKeyboard)
}

pub fn need_start() -> Reply {
    Reply::text(format!(
        "Hi! Send {} to start working with the bot.",
        Command::Start.as_str()
    ))
}

pub fn fallback() -> Reply {
    Reply::text("I didn't understand that. Please follow the instructions above.")
}

pub fn help() -> Reply {
    Reply::text(format!(
        "<b>📖 How to use the bot:</b>\n\n\
         <b>{start}</b> - Start a new idea session\n\
         <b>{help}</b> - Show this help\n\
         <b>{cancel}</b> - Cancel the current dialogue\n\n\
         <b>🎯 How it works:</b>\n\
         1. Tell me your content niche\n\
         2. Set the goal of your content\n\
         3. Choose the content format\n\
         4. Get {MAX_IDEAS} ideas\n\
         5. Pick an idea and get a ready post\n\n\
         <b>💡 Examples:</b>\n\
         • Niche: fitness\n\
         • Goal: grow an audience\n\
         • Format: Instagram post",
        start = Command::Start.as_str(),
        help = Command::Help.as_str(),
        cancel = Command::Cancel.as_str(),
    ))
}
