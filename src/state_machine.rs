//! Conversation engine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition(session, event)` decides, the runtime executes the effects.

mod effect;
pub mod event;
pub mod messages;
pub(crate) mod transition;


pub use effect::{Effect, Markup, Reply};
pub use event::{Command, Event, FollowUp};
pub use transition::{transition, TransitionResult};
