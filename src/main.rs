mod config;
mod llm;
mod platform;
mod relay;
mod server;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::llm::GeminiClient;
use crate::platform::telegram::TelegramMessenger;
use crate::relay::AppState;

/// Log the models this key can call, to help pick a valid model name
async fn log_available_models(client: &GeminiClient) {
    match client.list_models().await {
        Ok(models) => {
            info!("--- Models supporting generateContent ---");
            for model in models.iter().filter(|m| m.supports_generate_content()) {
                info!("  {}", model.name);
            }
            info!("--- End of model list ---");
        }
        Err(e) => warn!("Could not list models: {:#}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gemini_relay_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded");
    info!("  Model: {}", config.gemini.model);
    info!("  Bind address: {}", config.server.bind_address);
    if !config.has_gemini_key() {
        warn!("GEMINI_API_KEY is not set; every message will get a diagnostic reply");
    }
    if !config.has_telegram_token() {
        warn!("TELEGRAM_TOKEN is not set; replies cannot be delivered");
    }

    let gemini = GeminiClient::new(config.gemini.clone());
    if config.has_gemini_key() && config.gemini.list_models_on_startup {
        log_available_models(&gemini).await;
    }

    let messenger = TelegramMessenger::new(&config.telegram)?;

    let state = Arc::new(AppState::new(config, Arc::new(gemini), Arc::new(messenger)));

    info!("Relay is starting...");
    server::serve(state).await?;

    Ok(())
}
