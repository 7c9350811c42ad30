use std::sync::Arc;
use teloxide::types::{ChatId, MessageId};

use crate::bot::transport::ChatTransport;
use crate::error::BotResult;

/// Feedback types for different command outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackType {
    Success,
    Warning,
    Error,
    Info,
    Prompt,
}

impl FeedbackType {
    pub fn emoji(&self) -> &'static str {
        match self {
            FeedbackType::Success => "✅",
            FeedbackType::Warning => "⚠️",
            FeedbackType::Error => "❌",
            FeedbackType::Info => "ℹ️",
            FeedbackType::Prompt => "✏️",
        }
    }
}

/// Prefixes a reply with the emoji of its feedback type.
pub fn format_feedback(feedback_type: FeedbackType, message: &str) -> String {
    format!("{} {}", feedback_type.emoji(), message)
}

/// Centralized feedback for one chat.
///
/// Every send returns the id of the posted message so flows can queue it for
/// cleanup.
pub struct CommandFeedback {
    transport: Arc<dyn ChatTransport>,
    chat_id: ChatId,
}

impl CommandFeedback {
    pub fn new(transport: Arc<dyn ChatTransport>, chat_id: ChatId) -> Self {
        Self { transport, chat_id }
    }

    /// Send immediate feedback message
    pub async fn send(&self, feedback_type: FeedbackType, message: &str) -> BotResult<MessageId> {
        self.transport
            .send_message(self.chat_id, &format_feedback(feedback_type, message))
            .await
    }

    /// Send a message without any prefix
    pub async fn plain(&self, message: &str) -> BotResult<MessageId> {
        self.transport.send_message(self.chat_id, message).await
    }

    pub async fn success(&self, message: &str) -> BotResult<MessageId> {
        self.send(FeedbackType::Success, message).await
    }

    pub async fn error(&self, message: &str) -> BotResult<MessageId> {
        self.send(FeedbackType::Error, message).await
    }

    pub async fn info(&self, message: &str) -> BotResult<MessageId> {
        self.send(FeedbackType::Info, message).await
    }
}
