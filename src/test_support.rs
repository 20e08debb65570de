//! Test doubles for the two external collaborators.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::llm::CompletionService;
use crate::platform::{IncomingMessage, Messenger};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Typing(i64),
    Reply { chat_id: i64, reply_to: i32, text: String },
}

/// Records every outbound call; optionally fails them.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_typing: bool,
    pub fail_replies: bool,
    pub fail_first_reply: bool,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Reply { text, .. } => Some(text),
                Sent::Typing(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Typing(chat_id));
        if self.fail_typing {
            anyhow::bail!("typing failed");
        }
        Ok(())
    }

    async fn reply(&self, message: &IncomingMessage, text: &str) -> Result<()> {
        let first = {
            let mut sent = self.sent.lock().unwrap();
            let first = !sent.iter().any(|s| matches!(s, Sent::Reply { .. }));
            sent.push(Sent::Reply {
                chat_id: message.chat_id,
                reply_to: message.message_id,
                text: text.to_string(),
            });
            first
        };
        if first && self.fail_first_reply {
            anyhow::bail!("Bad Request: message is too long");
        }
        if self.fail_replies {
            anyhow::bail!("Bad Request: chat not found");
        }
        Ok(())
    }
}

enum Outcome {
    Text(String),
    Error { message: String, context: Option<String> },
}

/// Answers every prompt with a fixed outcome and records the prompts.
pub struct ScriptedCompletion {
    outcome: Outcome,
    calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn text(text: &str) -> Self {
        Self::with_outcome(Outcome::Text(text.to_string()))
    }

    pub fn error(message: &str) -> Self {
        Self::with_outcome(Outcome::Error {
            message: message.to_string(),
            context: None,
        })
    }

    /// Fails with `cause` wrapped in an outer `context`, like a transport error
    pub fn error_with_context(context: &str, cause: &str) -> Self {
        Self::with_outcome(Outcome::Error {
            message: cause.to_string(),
            context: Some(context.to_string()),
        })
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.outcome {
            Outcome::Text(text) => Ok(text.clone()),
            Outcome::Error { message, context } => {
                let err = anyhow::anyhow!(message.clone());
                Err(match context {
                    Some(context) => err.context(context.clone()),
                    None => err,
                })
            }
        }
    }
}

/// Takes `delay` per prompt and tracks how many calls overlap.
pub struct SlowCompletion {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowCompletion {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for SlowCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("echo: {}", prompt))
    }
}

pub fn message(chat_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id,
        message_id: 7,
        user_name: Some("Ann".to_string()),
        text: text.to_string(),
    }
}
