//! Boundary between the dialogue core and the chat platform.
//!
//! The core only talks to [`ChatTransport`]; [`TelegramTransport`] is the
//! production implementation over teloxide, with every request bounded by a
//! timeout so a slow API call can never stall a flow.

use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::{ApiError, RequestError};

use crate::error::{BotError, BotResult};
use crate::utils::logging::log_timeout;

/// A member's standing in a chat, as far as authorization cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Administrator,
    Member,
    /// Left, banned, restricted or otherwise unprivileged.
    Other,
}

impl MemberRole {
    pub fn is_privileged(self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Administrator)
    }
}

/// A poll as published by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPoll {
    pub poll_id: String,
    pub options: Vec<String>,
}

/// Outbound operations the bot needs from the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> BotResult<MessageId>;

    /// Fails with [`BotError::NotDeletable`] when the message is already gone.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> BotResult<()>;

    async fn send_poll(
        &self,
        chat_id: ChatId,
        question: &str,
        options: &[String],
        anonymous: bool,
        multiple_answers: bool,
    ) -> BotResult<SentPoll>;

    async fn member_role(&self, chat_id: ChatId, user_id: UserId) -> BotResult<MemberRole>;
}

pub struct TelegramTransport {
    bot: Bot,
    timeout: Duration,
}

impl TelegramTransport {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }

    async fn bounded<F, T>(&self, operation: &str, request: F) -> BotResult<T>
    where
        F: IntoFuture<Output = Result<T, RequestError>>,
    {
        match tokio::time::timeout(self.timeout, request.into_future()).await {
            Ok(result) => result.map_err(|e| BotError::Transport(format!("{operation}: {e}"))),
            Err(_) => {
                log_timeout(operation, self.timeout.as_secs(), None);
                Err(BotError::Transport(format!("{operation}: timed out")))
            }
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> BotResult<MessageId> {
        let message = self
            .bounded("send_message", self.bot.send_message(chat_id, text))
            .await?;
        Ok(message.id)
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> BotResult<()> {
        let request = self.bot.delete_message(chat_id, message_id);
        match tokio::time::timeout(self.timeout, request.into_future()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(RequestError::Api(ApiError::MessageToDeleteNotFound)))
            | Ok(Err(RequestError::Api(ApiError::MessageCantBeDeleted))) => {
                Err(BotError::NotDeletable(message_id.0))
            }
            Ok(Err(e)) => Err(BotError::Transport(format!("delete_message: {e}"))),
            Err(_) => {
                log_timeout("delete_message", self.timeout.as_secs(), None);
                Err(BotError::Transport("delete_message: timed out".to_string()))
            }
        }
    }

    async fn send_poll(
        &self,
        chat_id: ChatId,
        question: &str,
        options: &[String],
        anonymous: bool,
        multiple_answers: bool,
    ) -> BotResult<SentPoll> {
        let request = self
            .bot
            .send_poll(chat_id, question, options.to_vec())
            .is_anonymous(anonymous)
            .allows_multiple_answers(multiple_answers);
        let message = self.bounded("send_poll", request).await?;

        let poll = message
            .poll()
            .ok_or_else(|| BotError::Transport("send_poll: response carried no poll".to_string()))?;

        Ok(SentPoll {
            poll_id: poll.id.clone(),
            options: poll.options.iter().map(|o| o.text.clone()).collect(),
        })
    }

    async fn member_role(&self, chat_id: ChatId, user_id: UserId) -> BotResult<MemberRole> {
        let member = self
            .bounded("get_chat_member", self.bot.get_chat_member(chat_id, user_id))
            .await?;

        let role = if member.is_owner() {
            MemberRole::Owner
        } else if member.is_administrator() {
            MemberRole::Administrator
        } else if member.is_member() {
            MemberRole::Member
        } else {
            MemberRole::Other
        };
        Ok(role)
    }
}
