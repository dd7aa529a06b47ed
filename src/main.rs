//! AI-IdeaFactory - Telegram bot that turns a niche, a goal and a format
//! into content ideas and ready-to-publish posts.
//!
//! A pure dialogue state machine driven by per-user runtimes, with an
//! OpenAI-compatible generation backend.

mod api;
mod config;
mod generation;
mod llm;
mod runtime;
mod session;
mod state_machine;
mod telegram;

use api::{create_router, AppState};
use config::Config;
use generation::GenerationGateway;
use llm::{LlmService, LoggingService, OpenAIService};
use runtime::RuntimeManager;
use session::SessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use telegram::TelegramClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idea_factory=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration; anything missing is fatal before we bind
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Generation backend
    let openai = OpenAIService::new(&config.llm)?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(openai)));
    tracing::info!(
        model = %llm.model_id(),
        base_url = %config.llm.base_url,
        "Generation backend configured"
    );
    let gateway = Arc::new(GenerationGateway::new(llm));

    // Transport and runtime
    let messenger = Arc::new(TelegramClient::new(&config.telegram)?);
    let store = Arc::new(SessionStore::new());
    let runtime = Arc::new(RuntimeManager::new(store, messenger, gateway));

    let state = AppState::new(runtime, config.telegram.webhook_secret.clone());
    let app = create_router(state);

    match &config.telegram.webhook_url {
        Some(base) => {
            tracing::info!(
                webhook = %format!("{}/webhook", base.trim_end_matches('/')),
                "Expected webhook; register it with Telegram's setWebhook"
            );
        }
        None => tracing::warn!("WEBHOOK_URL is not set; make sure the webhook points at /webhook"),
    }

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("AI-IdeaFactory bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
