use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use tokio::task::JoinHandle;

use crate::bot::transport::ChatTransport;
use crate::error::BotError;
use crate::utils::logging::log_cleanup;

/// Messages a finished flow wants removed after a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRequest {
    pub chat_id: ChatId,
    pub message_ids: Vec<MessageId>,
    pub delay: Duration,
}

/// Counts from one executed cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: usize,
    pub already_gone: usize,
    pub failed: usize,
}

/// Deletes transient flow messages in the background.
#[derive(Clone)]
pub struct MessageCleaner {
    transport: Arc<dyn ChatTransport>,
}

impl MessageCleaner {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Fire-and-forget: waits out the delay on a spawned task, then deletes.
    pub fn schedule(&self, request: CleanupRequest) -> JoinHandle<CleanupReport> {
        let cleaner = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(request.delay).await;
            cleaner.run(&request).await
        })
    }

    /// Deletes every listed message now. Messages that are already gone are
    /// expected and only counted; other failures are logged and skipped.
    pub async fn run(&self, request: &CleanupRequest) -> CleanupReport {
        let mut report = CleanupReport::default();

        for &message_id in &request.message_ids {
            match self.transport.delete_message(request.chat_id, message_id).await {
                Ok(()) => report.deleted += 1,
                Err(BotError::NotDeletable(_)) => report.already_gone += 1,
                Err(e) => {
                    tracing::debug!("Failed to delete message {} in chat {}: {}", message_id.0, request.chat_id.0, e);
                    report.failed += 1;
                }
            }
        }

        log_cleanup(request.chat_id.0, report.deleted, report.already_gone, report.failed);
        report
    }
}
