use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Log the models that support generateContent when the server starts
    #[serde(default = "default_true")]
    pub list_models_on_startup: bool,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_gemini_base_url(),
            list_models_on_startup: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Custom Bot API server, e.g. a self-hosted telegram-bot-api instance
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_model() -> String {
    "gemini-1.5-flash-001".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_true() -> bool {
    true
}

/// Treat unset and blank values the same way
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn has_gemini_key(&self) -> bool {
        self.gemini.api_key.is_some()
    }

    pub fn has_telegram_token(&self) -> bool {
        self.telegram.bot_token.is_some()
    }

    /// Load settings from an optional TOML file, then apply the process environment.
    /// A missing file is not an error: every setting has a default or comes from env.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(content.as_deref(), |name| std::env::var(name).ok())
    }

    /// Build the configuration from file content and an environment lookup.
    /// Environment values take precedence over the file.
    pub fn from_sources<F>(content: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = match content {
            Some(text) => toml::from_str(text).context("Failed to parse config file")?,
            None => Config::default(),
        };

        if let Some(key) = non_empty(env("GEMINI_API_KEY")) {
            config.gemini.api_key = Some(key);
        }
        if let Some(model) = non_empty(env("GEMINI_MODEL")) {
            config.gemini.model = model;
        }
        if let Some(url) = non_empty(env("GEMINI_BASE_URL")) {
            config.gemini.base_url = url;
        }
        if let Some(token) = non_empty(env("TELEGRAM_TOKEN")) {
            config.telegram.bot_token = Some(token);
        }
        if let Some(url) = non_empty(env("TELEGRAM_API_URL")) {
            config.telegram.api_url = Some(url);
        }

        if let Some(addr) = non_empty(env("BIND_ADDRESS")) {
            config.server.bind_address = addr;
        } else if let Some(port) = non_empty(env("PORT")) {
            let port: u16 = port
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
            config.server.bind_address = format!("0.0.0.0:{}", port);
        }

        // Blank secrets in the file count as missing
        config.gemini.api_key = non_empty(config.gemini.api_key.take());
        config.telegram.bot_token = non_empty(config.telegram.bot_token.take());
        config.gemini.base_url = config.gemini.base_url.trim_end_matches('/').to_string();

        Ok(config)
    }
}
