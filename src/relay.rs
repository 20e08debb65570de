use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::llm::CompletionService;
use crate::platform::{IncomingMessage, Messenger};

pub const MISSING_TOKEN_REPLY: &str = "Error: TELEGRAM_TOKEN is missing.";
pub const MISSING_KEY_REPLY: &str = "Error: GEMINI_API_KEY is missing.";
pub const EMPTY_RESPONSE_REPLY: &str = "The model returned an empty response.";

/// Shared application state, read-only after startup
pub struct AppState {
    pub config: Config,
    pub llm: Arc<dyn CompletionService>,
    pub messenger: Arc<dyn Messenger>,
    /// Held for the whole relay of one update
    pub relay_gate: Mutex<()>,
}

impl AppState {
    pub fn new(
        config: Config,
        llm: Arc<dyn CompletionService>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            config,
            llm,
            messenger,
            relay_gate: Mutex::new(()),
        }
    }
}

/// Diagnostic to send instead of generating, if a secret is missing
fn missing_config_reply(config: &Config) -> Option<&'static str> {
    if !config.has_telegram_token() {
        Some(MISSING_TOKEN_REPLY)
    } else if !config.has_gemini_key() {
        Some(MISSING_KEY_REPLY)
    } else {
        None
    }
}

/// Relay one chat message to the model and send the answer back.
/// Every failure is handled here; nothing propagates to the caller.
pub async fn relay(state: &AppState, msg: &IncomingMessage) {
    info!(
        "Message from {} in chat {}: {}",
        msg.user_name.as_deref().unwrap_or("unknown"),
        msg.chat_id,
        msg.text
    );

    if let Some(diagnostic) = missing_config_reply(&state.config) {
        warn!("Configuration incomplete, replying with: {}", diagnostic);
        if let Err(e) = state.messenger.reply(msg, diagnostic).await {
            error!("Failed to send configuration diagnostic: {:#}", e);
        }
        return;
    }

    if let Err(e) = state.messenger.send_typing(msg.chat_id).await {
        debug!("Typing indicator failed for chat {}: {:#}", msg.chat_id, e);
    }

    if let Err(e) = answer(state, msg).await {
        error!("Relay failed for chat {}: {:#}", msg.chat_id, e);
        let notice = format!("⚠️ Error: {:#}", e);
        if let Err(e) = state.messenger.reply(msg, &notice).await {
            error!("Failed to report error to chat {}: {:#}", msg.chat_id, e);
        }
    }
}

/// Generate the completion and deliver it. Either step failing is reported by the caller.
async fn answer(state: &AppState, msg: &IncomingMessage) -> Result<()> {
    let text = state.llm.complete(&msg.text).await?;

    if text.trim().is_empty() {
        warn!("Empty completion for chat {}", msg.chat_id);
        state.messenger.reply(msg, EMPTY_RESPONSE_REPLY).await
    } else {
        state.messenger.reply(msg, &text).await
    }
}
