//! Per-user dialogue engine for the add, delete and rate flows.
//!
//! Every entry point locks the (chat, user) session for the whole event,
//! runs one step, and settles the outcome: either the session stays in its
//! new state, or the flow ends, the session returns to `Idle` and a
//! [`CleanupRequest`] for every message the flow produced is handed back to
//! the caller. No error escapes an entry point; failures become replies.

mod add;
mod delete;
mod rate;

use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::bot::auth::AuthorizationGate;
use crate::bot::session_store::{SessionKey, SessionStore};
use crate::bot::state::{DialogueState, Session};
use crate::bot::transport::ChatTransport;
use crate::database::connection::DatabaseManager;
use crate::error::{BotError, BotResult};
use crate::services::cleanup::CleanupRequest;
use crate::utils::feedback::{format_feedback, FeedbackType};
use crate::utils::logging::{
    log_command_start, log_database_error, log_flow_aborted, log_flow_transition,
};

const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";

/// A text message as the dialogue engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub message_id: MessageId,
    pub text: String,
}

impl IncomingMessage {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.chat_id, self.user_id)
    }
}

/// Timing and scope knobs for the flows.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Delay before a finished flow's messages are removed.
    pub cleanup_delay: Duration,
    /// Longer delay used when a privileged command is refused.
    pub denied_cleanup_delay: Duration,
    /// Chats where places may be added. Empty allows every chat.
    pub allowed_chat_ids: Vec<ChatId>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            cleanup_delay: Duration::from_secs(1),
            denied_cleanup_delay: Duration::from_secs(10),
            allowed_chat_ids: Vec::new(),
        }
    }
}

impl FlowSettings {
    pub fn chat_allowed(&self, chat_id: ChatId) -> bool {
        self.allowed_chat_ids.is_empty() || self.allowed_chat_ids.contains(&chat_id)
    }
}

/// What a step decided about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Keep waiting for the next input.
    Stay,
    /// Return to idle and clean up after the given delay.
    End(Duration),
}

pub struct DialogueController {
    db: DatabaseManager,
    sessions: SessionStore,
    transport: Arc<dyn ChatTransport>,
    auth: AuthorizationGate,
    settings: FlowSettings,
}

impl DialogueController {
    pub fn new(
        db: DatabaseManager,
        transport: Arc<dyn ChatTransport>,
        auth: AuthorizationGate,
        settings: FlowSettings,
    ) -> Self {
        Self {
            db,
            sessions: SessionStore::new(),
            transport,
            auth,
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// Current dialogue state of a user, `Idle` when nothing is tracked.
    pub async fn state_of(&self, chat_id: ChatId, user_id: UserId) -> DialogueState {
        self.sessions
            .get(SessionKey::new(chat_id, user_id))
            .await
            .map(|session| session.state)
            .unwrap_or_default()
    }

    /// Feeds a non-command text message into the user's current flow.
    /// Messages from idle users are ignored.
    pub async fn handle_text(&self, msg: &IncomingMessage) -> Option<CleanupRequest> {
        let key = msg.key();
        let mut session = self.sessions.lock(key).await;

        if session.state.is_idle() {
            drop(session);
            self.sessions.release(key);
            return None;
        }

        session.track(msg.message_id);
        let outcome = match session.state.clone() {
            DialogueState::Idle => Ok(Transition::Stay),
            DialogueState::AddPlace(step) => self.add_step(&mut session, step, msg).await,
            DialogueState::DeletePlace { attempts_left } => {
                self.delete_step(&mut session, attempts_left, msg).await
            }
            DialogueState::RatePlace(step) => self.rate_step(&mut session, step, msg).await,
        };

        let request = self.settle(&mut session, msg, outcome).await;
        drop(session);
        self.sessions.release(key);
        request
    }

    /// Ends whatever flow the user is in.
    pub async fn cancel(&self, msg: &IncomingMessage) -> Option<CleanupRequest> {
        log_command_start("/cancel", msg.user_id.0, msg.chat_id.0);
        let key = msg.key();
        let mut session = self.sessions.lock(key).await;

        let was_idle = session.state.is_idle();
        if !was_idle {
            log_flow_aborted(session.state.flow(), "cancelled by user", msg.user_id.0, msg.chat_id.0);
        }
        session.track(msg.message_id);

        let text = if was_idle { "Nothing to cancel." } else { "Cancelled." };
        let outcome = self
            .reply(&mut session, msg.chat_id, FeedbackType::Info, text)
            .await
            .map(|_| Transition::End(self.settings.cleanup_delay));

        let request = self.settle(&mut session, msg, outcome).await;
        drop(session);
        self.sessions.release(key);
        request
    }

    /// Drops the user's flow because a command that is not a flow arrived.
    /// Messages of the abandoned flow are handed back for cleanup.
    pub async fn abandon(&self, msg: &IncomingMessage) -> Option<CleanupRequest> {
        let key = msg.key();
        let mut session = self.sessions.lock(key).await;

        if !session.state.is_idle() {
            log_flow_aborted(session.state.flow(), "superseded by a new command", msg.user_id.0, msg.chat_id.0);
        }
        let pending = session.finish();

        drop(session);
        self.sessions.release(key);
        self.cleanup(msg.chat_id, pending, self.settings.cleanup_delay)
    }

    /// Locks the session for a command that opens a flow.
    ///
    /// A flow in progress is dropped in favour of the new one; its queued
    /// messages stay queued and are cleaned up when the new flow ends.
    async fn enter(&self, msg: &IncomingMessage) -> tokio::sync::OwnedMutexGuard<Session> {
        let mut session = self.sessions.lock(msg.key()).await;
        if !session.state.is_idle() {
            log_flow_aborted(session.state.flow(), "superseded by a new command", msg.user_id.0, msg.chat_id.0);
            session.state = DialogueState::Idle;
        }
        session.track(msg.message_id);
        session
    }

    async fn leave(
        &self,
        mut session: tokio::sync::OwnedMutexGuard<Session>,
        msg: &IncomingMessage,
        outcome: BotResult<Transition>,
    ) -> Option<CleanupRequest> {
        let request = self.settle(&mut session, msg, outcome).await;
        drop(session);
        self.sessions.release(msg.key());
        request
    }

    async fn settle(
        &self,
        session: &mut Session,
        msg: &IncomingMessage,
        outcome: BotResult<Transition>,
    ) -> Option<CleanupRequest> {
        match outcome {
            Ok(Transition::Stay) => None,
            Ok(Transition::End(delay)) => {
                let pending = session.finish();
                self.cleanup(msg.chat_id, pending, delay)
            }
            Err(e) => {
                let flow = session.state.flow();
                if e.is_fatal() {
                    log_database_error("flow step", flow, &e.to_string());
                } else {
                    tracing::error!("Flow {} failed for user {}: {}", flow, msg.user_id.0, e);
                }
                log_flow_aborted(flow, "step failed", msg.user_id.0, msg.chat_id.0);

                // Best effort: the transport itself may be what failed.
                if let Err(send_err) = self
                    .reply(session, msg.chat_id, FeedbackType::Error, GENERIC_FAILURE)
                    .await
                {
                    tracing::warn!("Could not report failure to chat {}: {}", msg.chat_id.0, send_err);
                }

                let pending = session.finish();
                self.cleanup(msg.chat_id, pending, self.settings.cleanup_delay)
            }
        }
    }

    fn cleanup(&self, chat_id: ChatId, message_ids: Vec<MessageId>, delay: Duration) -> Option<CleanupRequest> {
        if message_ids.is_empty() {
            return None;
        }
        Some(CleanupRequest {
            chat_id,
            message_ids,
            delay,
        })
    }

    /// Sends a reply and queues it for cleanup with the rest of the flow.
    async fn reply(
        &self,
        session: &mut Session,
        chat_id: ChatId,
        feedback_type: FeedbackType,
        text: &str,
    ) -> BotResult<()> {
        let id = self
            .transport
            .send_message(chat_id, &format_feedback(feedback_type, text))
            .await?;
        session.track(id);
        Ok(())
    }

    fn advance(&self, session: &mut Session, next: DialogueState, msg: &IncomingMessage) {
        log_flow_transition(
            next.flow(),
            session.state.step(),
            next.step(),
            msg.user_id.0,
            msg.chat_id.0,
        );
        session.state = next;
    }

    /// Shared retry policy of the delete and rate flows.
    ///
    /// Spends one attempt; re-prompts with the remaining count, or cancels
    /// the flow once none are left.
    async fn retry_or_cancel<F>(
        &self,
        session: &mut Session,
        msg: &IncomingMessage,
        attempts_left: u8,
        problem: &str,
        retry_state: F,
    ) -> BotResult<Transition>
    where
        F: FnOnce(u8) -> DialogueState,
    {
        let left = attempts_left.saturating_sub(1);
        if left == 0 {
            let text = format!("{problem}\n\nNo attempts left, the operation is cancelled.");
            self.reply(session, msg.chat_id, FeedbackType::Error, &text).await?;
            log_flow_aborted(session.state.flow(), "attempts exhausted", msg.user_id.0, msg.chat_id.0);
            return Ok(Transition::End(self.settings.cleanup_delay));
        }

        let text = format!("{problem}\n\nAttempts left: {left}");
        self.reply(session, msg.chat_id, FeedbackType::Warning, &text).await?;
        self.advance(session, retry_state(left), msg);
        Ok(Transition::Stay)
    }
}

/// The part of an error worth showing to a user.
fn describe(error: &BotError) -> String {
    match error {
        BotError::Validation(reason) => reason.clone(),
        other => other.to_string(),
    }
}
