use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use teloxide::types::Update;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::platform::telegram::incoming_from_update;
use crate::relay::{relay, AppState};

pub const STATUS_TEXT: &str = "Bot is running. Check the logs for the model list.";

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/webhook", post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status() -> &'static str {
    STATUS_TEXT
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("application/json"))
}

/// Telegram webhook endpoint. The update is relayed before the response is sent.
async fn webhook(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    if !is_json(&headers) {
        warn!(
            "Rejected webhook call with content-type {:?}",
            headers.get(CONTENT_TYPE)
        );
        return (StatusCode::FORBIDDEN, "Error").into_response();
    }

    // Decode straight from the bytes: teloxide's Update does not survive a Value round trip
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) if e.is_syntax() || e.is_eof() => {
            warn!("Webhook body is not valid JSON: {}", e);
            return (StatusCode::BAD_REQUEST, "Error").into_response();
        }
        Err(e) => {
            warn!("Ignoring payload that is not a Telegram update: {}", e);
            return StatusCode::OK.into_response();
        }
    };

    match incoming_from_update(&update) {
        Some(msg) => {
            // One update at a time, in delivery order
            let _gate = state.relay_gate.lock().await;
            relay(&state, &msg).await
        }
        None => debug!("Ignoring update {} without a text message", update.id.0),
    }

    StatusCode::OK.into_response()
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let bind_address = state.config.server.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
