//! Pure state transition function
//!
//! Given the stored session and one event, decide the session change and the
//! effects to run. No I/O happens here; validation always precedes mutation,
//! so a rejected input leaves the session untouched.

use super::effect::Effect;
use super::event::{Command, Event, FollowUp};
use super::messages;
use crate::generation::IdeaParams;
use crate::session::{Session, SessionChange, SessionState, MAX_IDEAS};
use thiserror::Error;

/// Minimum length, in characters, of a trimmed niche/goal/format answer
pub const MIN_ANSWER_CHARS: usize = 2;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub session: SessionChange,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: SessionChange) -> Self {
        Self {
            session,
            effects: vec![],
        }
    }

    pub fn keep() -> Self {
        Self::new(SessionChange::Keep)
    }

    pub fn replace(session: Session) -> Self {
        Self::new(SessionChange::Replace(session))
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_reply(self, reply: super::Reply) -> Self {
        self.with_effect(Effect::Reply(reply))
    }

    /// The state the user ends up in, given the state they started from
    pub fn resulting_state(&self, before: SessionState) -> SessionState {
        match &self.session {
            SessionChange::Keep => before,
            SessionChange::Replace(session) => session.state,
            SessionChange::Clear => SessionState::Uninitialized,
        }
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// A generation result arrived for a session that no longer expects it
    #[error("No transition from {state} on {event}")]
    InvalidTransition {
        state: SessionState,
        event: &'static str,
    },
}

/// Trimmed answer if it is long enough to accept
pub fn validate_answer(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (trimmed.chars().count() >= MIN_ANSWER_CHARS).then_some(trimmed)
}

/// Pure transition function
pub fn transition(session: &Session, event: Event) -> Result<TransitionResult, TransitionError> {
    let invalid = TransitionError::InvalidTransition {
        state: session.state,
        event: event.kind(),
    };

    match event {
        // ============================================================
        // Commands: valid in every state
        // ============================================================
        Event::Command(Command::Start) => {
            Ok(TransitionResult::replace(Session::started()).with_reply(messages::welcome()))
        }

        Event::Command(Command::Help) => Ok(TransitionResult::keep().with_reply(messages::help())),

        Event::Command(Command::Cancel) => {
            Ok(TransitionResult::new(SessionChange::Clear).with_reply(messages::cancelled()))
        }

        // ============================================================
        // Free text: the three dialogue answers
        // ============================================================
        Event::Text(text) => Ok(handle_text(session, &text)),

        Event::Unsupported => Ok(TransitionResult::keep().with_reply(
            if session.state == SessionState::Uninitialized {
                messages::need_start()
            } else {
                messages::fallback()
            },
        )),

        // ============================================================
        // Idea selection
        // ============================================================
        Event::FollowUp(choice) => Ok(follow_up(session, choice)),

        Event::IdeaSelected(index) => Ok(select_idea(session, index)),

        // ============================================================
        // Generation results
        // ============================================================
        Event::IdeasGenerated(result) => {
            if session.state != SessionState::AwaitingFormat || session.format.is_none() {
                return Err(invalid);
            }
            match result {
                Ok(mut ideas) if !ideas.is_empty() => {
                    ideas.truncate(MAX_IDEAS);
                    let reply = messages::fresh_ideas(&ideas);
                    let next = Session {
                        state: SessionState::AwaitingIdeaSelection,
                        ideas,
                        selected_idea: None,
                        ..session.clone()
                    };
                    Ok(TransitionResult::replace(next).with_reply(reply))
                }
                // An empty list is reported like any other failure
                Ok(_) | Err(_) => Ok(TransitionResult::keep().with_reply(messages::ideas_failed())),
            }
        }

        Event::PostGenerated(result) => {
            let selected = session
                .selected_idea
                .filter(|_| session.state == SessionState::AwaitingIdeaSelection)
                .and_then(|index| session.ideas.get(index));
            let Some(idea) = selected else {
                return Err(invalid);
            };

            let reply = match &result {
                Ok(post) => messages::post(post, &idea.title),
                Err(_) => messages::post_failed(),
            };
            let next = Session {
                selected_idea: None,
                ..session.clone()
            };
            Ok(TransitionResult::replace(next).with_reply(reply))
        }
    }
}

/// "New ideas" restarts from anywhere; "pick another" re-shows the stored list
fn follow_up(session: &Session, choice: FollowUp) -> TransitionResult {
    match choice {
        FollowUp::NewIdeas => {
            TransitionResult::replace(Session::started()).with_reply(messages::restarted())
        }
        FollowUp::PickAnother => {
            let reply = if session.ideas.is_empty() {
                messages::session_lost()
            } else {
                messages::other_ideas(&session.ideas)
            };
            TransitionResult::keep().with_reply(reply)
        }
    }
}

fn handle_text(session: &Session, text: &str) -> TransitionResult {
    // Keyboard labels arrive as plain text. While an answer is expected the
    // text is the answer, even when it happens to contain a label.
    let (field, next_state) = match session.state {
        SessionState::Uninitialized | SessionState::AwaitingIdeaSelection => {
            if let Some(choice) = FollowUp::from_label(text) {
                return follow_up(session, choice);
            }
            let reply = if session.state == SessionState::Uninitialized {
                messages::need_start()
            } else {
                messages::fallback()
            };
            return TransitionResult::keep().with_reply(reply);
        }
        SessionState::AwaitingNiche => ("niche", SessionState::AwaitingGoal),
        SessionState::AwaitingGoal => ("goal", SessionState::AwaitingFormat),
        // Stays put until the ideas arrive
        SessionState::AwaitingFormat => ("format", SessionState::AwaitingFormat),
    };

    let Some(answer) = validate_answer(text) else {
        return TransitionResult::keep().with_reply(messages::invalid_answer(field));
    };
    let answer = answer.to_string();

    match session.state {
        SessionState::AwaitingNiche => {
            let reply = messages::ask_goal(&answer);
            TransitionResult::replace(Session {
                state: next_state,
                niche: Some(answer),
                ..session.clone()
            })
            .with_reply(reply)
        }
        SessionState::AwaitingGoal => {
            let reply = messages::ask_format(&answer);
            TransitionResult::replace(Session {
                state: next_state,
                goal: Some(answer),
                ..session.clone()
            })
            .with_reply(reply)
        }
        _ => {
            let (Some(niche), Some(goal)) = (&session.niche, &session.goal) else {
                return TransitionResult::keep().with_reply(messages::session_lost());
            };
            let params = IdeaParams::new(niche.clone(), goal.clone(), answer.clone());
            TransitionResult::replace(Session {
                state: next_state,
                format: Some(answer),
                ..session.clone()
            })
            .with_effect(Effect::ShowTyping)
            .with_effect(Effect::GenerateIdeas(params))
        }
    }
}

fn select_idea(session: &Session, index: usize) -> TransitionResult {
    if session.ideas.is_empty() {
        return TransitionResult::keep().with_reply(messages::session_lost());
    }
    let Some(idea) = session.ideas.get(index) else {
        return TransitionResult::keep().with_reply(messages::invalid_idea());
    };
    let (Some(niche), Some(goal), Some(format)) = (&session.niche, &session.goal, &session.format)
    else {
        return TransitionResult::keep().with_reply(messages::session_lost());
    };

    let params = IdeaParams::new(niche.clone(), goal.clone(), format.clone());
    TransitionResult::replace(Session {
        selected_idea: Some(index),
        ..session.clone()
    })
    .with_effect(Effect::ShowTyping)
    .with_effect(Effect::GeneratePost {
        params,
        idea: idea.clone(),
    })
}
