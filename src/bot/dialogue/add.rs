use super::{describe, DialogueController, IncomingMessage, Transition};
use crate::bot::state::{AddStep, DialogueState, Session};
use crate::database::models::Place;
use crate::error::{BotError, BotResult};
use crate::services::cleanup::CleanupRequest;
use crate::utils::feedback::FeedbackType;
use crate::utils::logging::{log_command_start, log_validation_error};
use crate::utils::validation::{normalize_place_name, validate_address};

impl DialogueController {
    /// `/add`: asks for the name of a new place.
    pub async fn begin_add(&self, msg: &IncomingMessage) -> Option<CleanupRequest> {
        log_command_start("/add", msg.user_id.0, msg.chat_id.0);
        let mut session = self.enter(msg).await;
        let outcome = self.open_add(&mut session, msg).await;
        self.leave(session, msg, outcome).await
    }

    async fn open_add(&self, session: &mut Session, msg: &IncomingMessage) -> BotResult<Transition> {
        if !self.settings.chat_allowed(msg.chat_id) {
            self.reply(session, msg.chat_id, FeedbackType::Error, "Adding places is not enabled in this chat.")
                .await?;
            return Ok(Transition::End(self.settings.cleanup_delay));
        }

        self.reply(session, msg.chat_id, FeedbackType::Prompt, "Enter the name of the place:")
            .await?;
        self.advance(session, DialogueState::start_add(), msg);
        Ok(Transition::Stay)
    }

    pub(super) async fn add_step(
        &self,
        session: &mut Session,
        step: AddStep,
        msg: &IncomingMessage,
    ) -> BotResult<Transition> {
        match step {
            AddStep::AwaitingName => {
                let name = match normalize_place_name(&msg.text) {
                    Ok(name) => name,
                    Err(e) => {
                        log_validation_error("add", "name", &msg.text, &e.to_string(), msg.user_id.0, msg.chat_id.0);
                        let text = format!("{}. Enter the name of the place:", describe(&e));
                        self.reply(session, msg.chat_id, FeedbackType::Warning, &text).await?;
                        return Ok(Transition::Stay);
                    }
                };

                if Place::exists(&self.db.pool, &name).await? {
                    let text = format!("'{name}' is already on the list!");
                    self.reply(session, msg.chat_id, FeedbackType::Error, &text).await?;
                    return Ok(Transition::End(self.settings.cleanup_delay));
                }

                let text = format!("Enter the address of '{name}':");
                self.reply(session, msg.chat_id, FeedbackType::Prompt, &text).await?;
                self.advance(session, DialogueState::AddPlace(AddStep::AwaitingAddress { name }), msg);
                Ok(Transition::Stay)
            }
            AddStep::AwaitingAddress { name } => {
                let address = match validate_address(&msg.text) {
                    Ok(address) => address,
                    Err(e) => {
                        log_validation_error("add", "address", &msg.text, &e.to_string(), msg.user_id.0, msg.chat_id.0);
                        let text = format!("{}. Enter the address of '{name}':", describe(&e));
                        self.reply(session, msg.chat_id, FeedbackType::Warning, &text).await?;
                        return Ok(Transition::Stay);
                    }
                };

                // Someone may have added the same name since the name step.
                let (kind, text) = match Place::insert(&self.db.pool, &name, &address).await {
                    Ok(place) => {
                        tracing::info!("Place '{}' added by user {} in chat {}", place.name, msg.user_id.0, msg.chat_id.0);
                        (FeedbackType::Success, format!("Place '{}' added!", place.name))
                    }
                    Err(BotError::Duplicate(name)) => {
                        (FeedbackType::Error, format!("'{name}' is already on the list!"))
                    }
                    Err(e) => return Err(e),
                };
                self.reply(session, msg.chat_id, kind, &text).await?;
                Ok(Transition::End(self.settings.cleanup_delay))
            }
        }
    }
}
