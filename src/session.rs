//! Per-user dialogue sessions
//!
//! Sessions live only in process memory. An absent entry is the same as a
//! session in [`SessionState::Uninitialized`].

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// Placeholder used when the model omits an idea title
pub const UNTITLED_IDEA: &str = "Untitled idea";
/// Placeholder used when the model omits an idea description
pub const NO_DESCRIPTION: &str = "No description";

/// Maximum number of ideas kept and offered for selection
pub const MAX_IDEAS: usize = 5;

/// Messaging-platform user identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dialogue progress. Only moves forward, except through a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Uninitialized,
    AwaitingNiche,
    AwaitingGoal,
    AwaitingFormat,
    AwaitingIdeaSelection,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::AwaitingNiche => "awaiting_niche",
            SessionState::AwaitingGoal => "awaiting_goal",
            SessionState::AwaitingFormat => "awaiting_format",
            SessionState::AwaitingIdeaSelection => "awaiting_idea_selection",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed content concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Idea {
    pub title: String,
    pub description: String,
}

impl Idea {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Build from one element of the model's JSON array, tolerating
    /// missing or non-string fields
    pub fn from_value(value: &serde_json::Value) -> Self {
        let field = |name: &str, fallback: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            title: field("title", UNTITLED_IDEA),
            description: field("description", NO_DESCRIPTION),
        }
    }
}

/// Per-user mutable record of dialogue progress
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Session {
    pub state: SessionState,
    pub niche: Option<String>,
    pub goal: Option<String>,
    pub format: Option<String>,
    /// At most [`MAX_IDEAS`]; only populated once `format` is set
    pub ideas: Vec<Idea>,
    /// Set while a post for `ideas[i]` is being generated
    pub selected_idea: Option<usize>,
}

impl Session {
    /// A blank session waiting for the niche
    pub fn started() -> Self {
        Self {
            state: SessionState::AwaitingNiche,
            ..Self::default()
        }
    }
}

/// What a transition wants done to the stored session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Keep,
    Replace(Session),
    /// Remove the entry entirely
    Clear,
}

/// Process-wide map from user identity to session
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user: UserId) -> Option<Session> {
        self.sessions.read().await.get(&user).cloned()
    }

    /// Current session, treating absence as `Uninitialized`
    pub async fn current(&self, user: UserId) -> Session {
        self.get(user).await.unwrap_or_default()
    }

    #[allow(dead_code)] // The runtime reads through `current` and writes whole sessions
    pub async fn get_or_create(&self, user: UserId) -> Session {
        self.sessions
            .write()
            .await
            .entry(user)
            .or_default()
            .clone()
    }

    #[allow(dead_code)] // Contract completeness; transitions replace whole sessions
    pub async fn set_state(&self, user: UserId, state: SessionState) {
        self.sessions.write().await.entry(user).or_default().state = state;
    }

    pub async fn put(&self, user: UserId, session: Session) {
        self.sessions.write().await.insert(user, session);
    }

    /// Remove the user's entry. Returns whether one existed.
    pub async fn clear(&self, user: UserId) -> bool {
        self.sessions.write().await.remove(&user).is_some()
    }

    pub async fn apply(&self, user: UserId, change: SessionChange) {
        match change {
            SessionChange::Keep => {}
            SessionChange::Replace(session) => self.put(user, session).await,
            SessionChange::Clear => {
                self.clear(user).await;
            }
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
