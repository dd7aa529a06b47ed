//! HTTP request handlers

use super::types::ErrorResponse;
use super::AppState;
use crate::telegram::{classify, Update};
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

/// Header Telegram sets when the webhook was registered with a secret
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "AI-IdeaFactory Bot is running! 🤖"
}

async fn health() -> &'static str {
    "OK"
}

// ============================================================
// Webhook
// ============================================================

/// Accept one update, queue it on the user's runtime and return at once
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if let Some(expected) = &state.webhook_secret {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected.as_ref()) {
            tracing::warn!("Webhook call with a missing or wrong secret token");
            return Err(AppError::Forbidden("Invalid secret token".to_string()));
        }
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !is_json {
        return Err(AppError::Forbidden("Expected application/json".to_string()));
    }

    let update: Update = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid update: {e}")))?;

    let Some(inbound) = classify(&update) else {
        tracing::debug!(update_id = update.update_id, "Ignoring update");
        return Ok(StatusCode::OK);
    };

    tracing::debug!(
        update_id = update.update_id,
        user_id = %inbound.user,
        event = inbound.event.kind(),
        "Update received"
    );

    state
        .runtime
        .dispatch(inbound)
        .await
        .map_err(AppError::Internal)?;

    Ok(StatusCode::OK)
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Forbidden(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
