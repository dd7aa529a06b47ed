//! Effects produced by state transitions

use super::event::{idea_callback_data, FollowUp};
use crate::generation::IdeaParams;
use crate::session::{Idea, MAX_IDEAS};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a message to the user
    Reply(Reply),

    /// Show a "typing" indicator while a slow operation runs
    ShowTyping,

    /// Ask the gateway for ideas; completes with `Event::IdeasGenerated`
    GenerateIdeas(IdeaParams),

    /// Ask the gateway for a post; completes with `Event::PostGenerated`
    GeneratePost { params: IdeaParams, idea: Idea },
}

/// Transport-neutral outbound message: HTML text plus optional choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: Markup,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::None,
        }
    }

    #[must_use]
    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }
}

/// Choices attached to a reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Markup {
    #[default]
    None,
    /// Buttons under the message, one per row
    Inline(Vec<InlineButton>),
    /// A one-time reply keyboard with these labels, one per row
    Keyboard(Vec<String>),
    /// Hide any reply keyboard currently shown
    RemoveKeyboard,
}

impl Markup {
    /// One "💡 Idea N" button per idea, capped at [`MAX_IDEAS`]
    pub fn idea_buttons(ideas: &[Idea]) -> Self {
        Markup::Inline(
            (0..ideas.len().min(MAX_IDEAS))
                .map(|index| InlineButton {
                    label: format!("💡 Idea {}", index + 1),
                    data: idea_callback_data(index),
                })
                .collect(),
        )
    }

    /// The two choices shown after a post
    pub fn follow_ups() -> Self {
        Markup::Keyboard(
            [FollowUp::NewIdeas, FollowUp::PickAnother]
                .into_iter()
                .map(|f| f.label().to_string())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    /// Opaque payload echoed back in the callback
    pub data: String,
}
