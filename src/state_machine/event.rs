//! Events that drive the conversation

use crate::generation::GenerationError;
use crate::session::Idea;

/// Reply-keyboard label for starting over with new parameters
pub const NEW_IDEAS_LABEL: &str = "🔄 Create new ideas";
/// Reply-keyboard label for going back to the idea list
pub const PICK_ANOTHER_LABEL: &str = "⬅️ Pick another idea";

const NEW_IDEAS_CALLBACK: &str = "restart";
const PICK_ANOTHER_CALLBACK: &str = "select_other";
const IDEA_CALLBACK_PREFIX: &str = "idea_";

/// Slash commands understood in every state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
}

impl Command {
    /// Parse `/start`, `/start@SomeBot`, `/start with args`, ...
    ///
    /// Returns `None` for text that is not a slash command and
    /// `Some(None)` for an unknown command.
    pub fn parse(text: &str) -> Option<Option<Self>> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(n, _)| n);
        Some(match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "cancel" => Some(Command::Cancel),
            _ => None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Start => "/start",
            Command::Help => "/help",
            Command::Cancel => "/cancel",
        }
    }
}

/// Follow-up choices offered after a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Clear everything and ask for a niche again
    NewIdeas,
    /// Show the stored idea list again
    PickAnother,
}

impl FollowUp {
    /// Match a reply-keyboard press. Telegram sends the label back as text;
    /// clients may add or drop the emoji, so match on the words.
    pub fn from_label(text: &str) -> Option<Self> {
        let words = |label: &'static str| label.split_once(' ').map_or(label, |(_, w)| w);
        if text.contains(words(NEW_IDEAS_LABEL)) {
            Some(FollowUp::NewIdeas)
        } else if text.contains(words(PICK_ANOTHER_LABEL)) {
            Some(FollowUp::PickAnother)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FollowUp::NewIdeas => NEW_IDEAS_LABEL,
            FollowUp::PickAnother => PICK_ANOTHER_LABEL,
        }
    }
}

/// Opaque callback payload for the "pick idea `index`" button
pub fn idea_callback_data(index: usize) -> String {
    format!("{IDEA_CALLBACK_PREFIX}{index}")
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Command(Command),
    Text(String),
    IdeaSelected(usize),
    FollowUp(FollowUp),
    /// Anything else the user sent: stickers, photos, unknown commands
    Unsupported,

    // Generation events
    IdeasGenerated(Result<Vec<Idea>, GenerationError>),
    PostGenerated(Result<String, GenerationError>),
}

impl Event {
    /// Decode inline-button data. Unknown payloads yield `None`.
    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            NEW_IDEAS_CALLBACK => Some(Event::FollowUp(FollowUp::NewIdeas)),
            PICK_ANOTHER_CALLBACK => Some(Event::FollowUp(FollowUp::PickAnother)),
            _ => data
                .strip_prefix(IDEA_CALLBACK_PREFIX)
                .and_then(|index| index.parse().ok())
                .map(Event::IdeaSelected),
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Command(Command::Start) => "command_start",
            Event::Command(Command::Help) => "command_help",
            Event::Command(Command::Cancel) => "command_cancel",
            Event::Text(_) => "text",
            Event::IdeaSelected(_) => "idea_selected",
            Event::FollowUp(FollowUp::NewIdeas) => "new_ideas",
            Event::FollowUp(FollowUp::PickAnother) => "pick_another",
            Event::Unsupported => "unsupported",
            Event::IdeasGenerated(_) => "ideas_generated",
            Event::PostGenerated(_) => "post_generated",
        }
    }
}
