//! Generation gateway
//!
//! Turns dialogue parameters into completion requests and normalizes the
//! replies. Both operations are fail-soft: every transport or parse problem
//! comes back as a [`GenerationError`]. Nothing is retried here.

mod parse;
mod prompts;

use parse::parse_ideas;

use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::session::Idea;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

pub const DEFAULT_IDEAS_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_POST_TEMPERATURE: f32 = 0.8;

const IDEAS_MAX_TOKENS: u32 = 2000;
const POST_MAX_TOKENS: u32 = 3000;

/// Upper bound for one generation call, including the HTTP round-trip
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Why a generation call produced nothing usable
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] LlmError),
    #[error("could not parse generated ideas: {0}")]
    Parse(String),
}

/// The three answers collected from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaParams {
    pub niche: String,
    pub goal: String,
    pub format: String,
}

impl IdeaParams {
    pub fn new(
        niche: impl Into<String>,
        goal: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            niche: niche.into(),
            goal: goal.into(),
            format: format.into(),
        }
    }
}

/// Source of ideas and posts. The runtime depends on this, not on HTTP.
#[async_trait]
pub trait IdeaGenerator: Send + Sync {
    /// Ask for five ideas. The returned list may be shorter or longer.
    async fn generate_ideas(&self, params: &IdeaParams) -> Result<Vec<Idea>, GenerationError>;

    /// Expand one idea into a publish-ready post, returned verbatim
    async fn generate_post(
        &self,
        params: &IdeaParams,
        idea: &Idea,
    ) -> Result<String, GenerationError>;
}

#[async_trait]
impl<T: IdeaGenerator + ?Sized> IdeaGenerator for Arc<T> {
    async fn generate_ideas(&self, params: &IdeaParams) -> Result<Vec<Idea>, GenerationError> {
        (**self).generate_ideas(params).await
    }

    async fn generate_post(
        &self,
        params: &IdeaParams,
        idea: &Idea,
    ) -> Result<String, GenerationError> {
        (**self).generate_post(params, idea).await
    }
}

/// [`IdeaGenerator`] backed by a chat-completions model
pub struct GenerationGateway {
    llm: Arc<dyn LlmService>,
    ideas_temperature: f32,
    post_temperature: f32,
    timeout: Duration,
}

impl GenerationGateway {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            ideas_temperature: DEFAULT_IDEAS_TEMPERATURE,
            post_temperature: DEFAULT_POST_TEMPERATURE,
            timeout: GENERATION_TIMEOUT,
        }
    }

    #[must_use]
    #[allow(dead_code)] // Tuning hook; production uses the defaults
    pub fn with_temperatures(mut self, ideas: f32, post: f32) -> Self {
        self.ideas_temperature = ideas;
        self.post_temperature = post;
        self
    }

    #[must_use]
    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn complete_text(&self, request: LlmRequest) -> Result<String, GenerationError> {
        match timeout(self.timeout, self.llm.complete(&request)).await {
            Ok(Ok(response)) => Ok(response.text),
            Ok(Err(e)) => Err(GenerationError::Transport(e)),
            Err(_) => Err(GenerationError::Transport(LlmError::network(format!(
                "Generation timed out after {}s",
                self.timeout.as_secs()
            )))),
        }
    }
}

#[async_trait]
impl IdeaGenerator for GenerationGateway {
    async fn generate_ideas(&self, params: &IdeaParams) -> Result<Vec<Idea>, GenerationError> {
        let request = LlmRequest::single_turn(
            Some(prompts::SYSTEM_PROMPT),
            prompts::ideas_prompt(params),
        )
        .with_temperature(self.ideas_temperature)
        .with_max_tokens(IDEAS_MAX_TOKENS);

        let text = self.complete_text(request).await?;
        let ideas = parse_ideas(&text).inspect_err(|e| {
            tracing::warn!(error = %e, raw = %text, "Model returned unparseable ideas");
        })?;

        tracing::debug!(count = ideas.len(), "Parsed generated ideas");
        Ok(ideas)
    }

    async fn generate_post(
        &self,
        params: &IdeaParams,
        idea: &Idea,
    ) -> Result<String, GenerationError> {
        let request = LlmRequest::single_turn(
            Some(prompts::SYSTEM_PROMPT),
            prompts::post_prompt(params, idea),
        )
        .with_temperature(self.post_temperature)
        .with_max_tokens(POST_MAX_TOKENS);

        let post = self.complete_text(request).await?;
        if post.trim().is_empty() {
            return Err(GenerationError::Transport(LlmError::malformed(
                "Empty completion",
            )));
        }
        Ok(post)
    }
}
