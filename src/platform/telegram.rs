use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, MessageId, ReplyParameters, UpdateKind};

use crate::config::TelegramConfig;
use crate::platform::{IncomingMessage, Messenger};

/// Extract the relayable message from a webhook update.
/// Only new messages with text are relayed; everything else is ignored.
pub fn incoming_from_update(update: &Update) -> Option<IncomingMessage> {
    let msg = match &update.kind {
        UpdateKind::Message(msg) => msg,
        _ => return None,
    };

    let text = msg.text()?.to_string();

    Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        user_name: msg.from.as_ref().map(|user| user.first_name.clone()),
        text,
    })
}

/// Telegram Bot API messenger.
/// Built without a token, it fails every call instead of contacting Telegram.
pub struct TelegramMessenger {
    bot: Option<Bot>,
}

impl TelegramMessenger {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let Some(token) = config.bot_token.as_deref() else {
            return Ok(Self { bot: None });
        };

        let mut bot = Bot::new(token);
        if let Some(api_url) = config.api_url.as_deref() {
            let url = reqwest::Url::parse(api_url)
                .with_context(|| format!("Invalid Telegram API URL: {}", api_url))?;
            bot = bot.set_api_url(url);
        }

        Ok(Self { bot: Some(bot) })
    }

    fn bot(&self) -> Result<&Bot> {
        self.bot.as_ref().context("TELEGRAM_TOKEN is missing")
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot()?
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .context("Failed to send typing indicator")?;
        Ok(())
    }

    async fn reply(&self, message: &IncomingMessage, text: &str) -> Result<()> {
        self.bot()?
            .send_message(ChatId(message.chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(message.message_id)))
            .await
            .with_context(|| format!("Failed to send message to chat {}", message.chat_id))?;
        Ok(())
    }
}
