use super::{describe, DialogueController, IncomingMessage, Transition};
use crate::bot::state::{DialogueState, RateStep, Session, RATE_ATTEMPTS};
use crate::database::models::Place;
use crate::error::{BotError, BotResult};
use crate::services::cleanup::CleanupRequest;
use crate::utils::feedback::FeedbackType;
use crate::utils::logging::{log_command_start, log_validation_error};
use crate::utils::validation::{normalize_place_name, parse_score, MAX_SCORE, MIN_SCORE};

impl DialogueController {
    /// `/rating`: asks which place to score.
    pub async fn begin_rate(&self, msg: &IncomingMessage) -> Option<CleanupRequest> {
        log_command_start("/rating", msg.user_id.0, msg.chat_id.0);
        let mut session = self.enter(msg).await;
        let outcome = self.open_rate(&mut session, msg).await;
        self.leave(session, msg, outcome).await
    }

    async fn open_rate(&self, session: &mut Session, msg: &IncomingMessage) -> BotResult<Transition> {
        self.reply(session, msg.chat_id, FeedbackType::Prompt, "Enter the name of the place you want to rate:")
            .await?;
        self.advance(session, DialogueState::start_rate(), msg);
        Ok(Transition::Stay)
    }

    pub(super) async fn rate_step(
        &self,
        session: &mut Session,
        step: RateStep,
        msg: &IncomingMessage,
    ) -> BotResult<Transition> {
        match step {
            RateStep::AwaitingName { attempts_left } => {
                let problem = match normalize_place_name(&msg.text) {
                    Ok(name) => {
                        if Place::exists(&self.db.pool, &name).await? {
                            let text = format!("Rate '{name}' from {MIN_SCORE} to {MAX_SCORE}:");
                            self.reply(session, msg.chat_id, FeedbackType::Prompt, &text).await?;
                            let next = RateStep::AwaitingScore {
                                name,
                                attempts_left: RATE_ATTEMPTS,
                            };
                            self.advance(session, DialogueState::RatePlace(next), msg);
                            return Ok(Transition::Stay);
                        }
                        format!("There is no place called '{name}'.")
                    }
                    Err(e) => describe(&e),
                };

                self.retry_or_cancel(session, msg, attempts_left, &problem, |left| {
                    DialogueState::RatePlace(RateStep::AwaitingName { attempts_left: left })
                })
                .await
            }
            RateStep::AwaitingScore { name, attempts_left } => {
                let score = match parse_score(&msg.text) {
                    Ok(score) => score,
                    Err(e) => {
                        log_validation_error("rate", "score", &msg.text, &e.to_string(), msg.user_id.0, msg.chat_id.0);
                        let problem = format!("{}. Send a whole number from {MIN_SCORE} to {MAX_SCORE}.", describe(&e));
                        return self
                            .retry_or_cancel(session, msg, attempts_left, &problem, |left| {
                                DialogueState::RatePlace(RateStep::AwaitingScore {
                                    name: name.clone(),
                                    attempts_left: left,
                                })
                            })
                            .await;
                    }
                };

                match Place::record_rating(&self.db.pool, &name, score).await {
                    Ok(average) => {
                        tracing::info!("User {} rated '{}' {} (average {:.2})", msg.user_id.0, name, score, average);
                        let text = format!("Rating saved! '{name}' now averages {average:.1}.");
                        self.reply(session, msg.chat_id, FeedbackType::Success, &text).await?;
                    }
                    // Deleted by an administrator while this user was choosing a score.
                    Err(BotError::NotFound(_)) => {
                        let text = format!("'{name}' is no longer on the list.");
                        self.reply(session, msg.chat_id, FeedbackType::Error, &text).await?;
                    }
                    Err(e) => return Err(e),
                }
                Ok(Transition::End(self.settings.cleanup_delay))
            }
        }
    }
}
