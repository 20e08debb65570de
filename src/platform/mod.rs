pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// A chat message received from the messaging platform
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    /// Platform-specific chat ID
    pub chat_id: i64,
    /// ID of the message inside its chat, used to thread the reply
    pub message_id: i32,
    /// Display name of the sender, when the platform provides one
    pub user_name: Option<String>,
    /// The message text
    pub text: String,
}

/// Outbound side of the messaging platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Show a transient "typing" status in the chat
    async fn send_typing(&self, chat_id: i64) -> Result<()>;

    /// Send `text` to the message's chat as a reply to it
    async fn reply(&self, message: &IncomingMessage, text: &str) -> Result<()>;
}
