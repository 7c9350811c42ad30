use super::{describe, DialogueController, IncomingMessage, Transition};
use crate::bot::state::{DialogueState, Session};
use crate::database::models::Place;
use crate::error::BotResult;
use crate::services::cleanup::CleanupRequest;
use crate::utils::feedback::FeedbackType;
use crate::utils::logging::{log_command_start, log_flow_aborted};
use crate::utils::validation::normalize_place_name;

const NOT_AUTHORIZED: &str = "You are not an administrator of this chat and have no permission to delete places!";

impl DialogueController {
    /// `/del`: asks an administrator which place to remove.
    pub async fn begin_delete(&self, msg: &IncomingMessage) -> Option<CleanupRequest> {
        log_command_start("/del", msg.user_id.0, msg.chat_id.0);
        let mut session = self.enter(msg).await;
        let outcome = self.open_delete(&mut session, msg).await;
        self.leave(session, msg, outcome).await
    }

    async fn open_delete(&self, session: &mut Session, msg: &IncomingMessage) -> BotResult<Transition> {
        if !self.authorized(msg).await {
            return self.refuse(session, msg).await;
        }

        self.reply(session, msg.chat_id, FeedbackType::Prompt, "Enter the name of the place to delete:")
            .await?;
        self.advance(session, DialogueState::start_delete(), msg);
        Ok(Transition::Stay)
    }

    pub(super) async fn delete_step(
        &self,
        session: &mut Session,
        attempts_left: u8,
        msg: &IncomingMessage,
    ) -> BotResult<Transition> {
        // Roles can change while the dialogue is open.
        if !self.authorized(msg).await {
            return self.refuse(session, msg).await;
        }

        let problem = match normalize_place_name(&msg.text) {
            Ok(name) => {
                if Place::delete(&self.db.pool, &name).await? {
                    tracing::info!("Place '{}' deleted by user {} in chat {}", name, msg.user_id.0, msg.chat_id.0);
                    let text = format!("Place '{name}' deleted!");
                    self.reply(session, msg.chat_id, FeedbackType::Success, &text).await?;
                    return Ok(Transition::End(self.settings.cleanup_delay));
                }
                format!("There is no place called '{name}'.")
            }
            Err(e) => describe(&e),
        };

        self.retry_or_cancel(session, msg, attempts_left, &problem, |left| {
            DialogueState::DeletePlace { attempts_left: left }
        })
        .await
    }

    async fn authorized(&self, msg: &IncomingMessage) -> bool {
        self.auth
            .is_authorized(self.transport.as_ref(), msg.chat_id, msg.user_id)
            .await
    }

    async fn refuse(&self, session: &mut Session, msg: &IncomingMessage) -> BotResult<Transition> {
        log_flow_aborted("delete", "not authorized", msg.user_id.0, msg.chat_id.0);
        self.reply(session, msg.chat_id, FeedbackType::Error, NOT_AUTHORIZED).await?;
        Ok(Transition::End(self.settings.denied_cleanup_delay))
    }
}
