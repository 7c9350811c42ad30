//! Weekly "when and where" polls.
//!
//! The coordinator publishes a time-slot poll and a place poll, counts the
//! votes that come back, and announces the winners. It owns no timers: the
//! scheduler service (or `/poll`) decides when each step runs.

use std::sync::Arc;
use teloxide::types::ChatId;

use crate::bot::transport::ChatTransport;
use crate::database::connection::DatabaseManager;
use crate::database::models::{Place, PollKind, PollRecord, PollResult};
use crate::error::{BotError, BotResult};
use crate::utils::feedback::{format_feedback, FeedbackType};
use crate::utils::validation::MIN_POLL_OPTIONS;

/// Most places offered in one poll.
pub const MAX_PLACE_OPTIONS: usize = 7;

const TIME_QUESTION: &str = "When shall we meet?";
const PLACE_QUESTION: &str = "Where shall we go?";

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Chat the polls and results are posted to.
    pub chat_id: ChatId,
    pub time_slots: Vec<String>,
}

/// Result of a tally cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    Winners { time_slot: String, place: String },
    NotEnoughData,
}

#[derive(Clone)]
pub struct PollCoordinator {
    db: DatabaseManager,
    transport: Arc<dyn ChatTransport>,
    settings: PollSettings,
}

impl PollCoordinator {
    pub fn new(db: DatabaseManager, transport: Arc<dyn ChatTransport>, settings: PollSettings) -> Self {
        Self { db, transport, settings }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Publishes the time-slot poll and a poll over up to seven random places.
    ///
    /// With fewer than two places there is nothing to vote on: a notice is
    /// posted instead and [`BotError::InsufficientData`] returned.
    pub async fn send_scheduled_polls(&self) -> BotResult<Vec<PollRecord>> {
        let chat_id = self.settings.chat_id;
        let places = Place::sample(&self.db.pool, MAX_PLACE_OPTIONS).await?;

        if places.len() < MIN_POLL_OPTIONS {
            let notice = format_feedback(
                FeedbackType::Info,
                "Not enough places for a poll yet. Add at least two with /add.",
            );
            self.transport.send_message(chat_id, &notice).await?;
            return Err(BotError::InsufficientData);
        }

        let time_poll = self
            .transport
            .send_poll(chat_id, TIME_QUESTION, &self.settings.time_slots, false, true)
            .await?;
        let time_record =
            PollRecord::create(&self.db.pool, &time_poll.poll_id, PollKind::TimeSlot, &time_poll.options).await?;

        let names: Vec<String> = places.into_iter().map(|place| place.name).collect();
        let place_poll = self
            .transport
            .send_poll(chat_id, PLACE_QUESTION, &names, false, true)
            .await?;
        let place_record =
            PollRecord::create(&self.db.pool, &place_poll.poll_id, PollKind::Place, &place_poll.options).await?;

        tracing::info!(
            "Published polls {} and {} to chat {}",
            time_record.poll_id, place_record.poll_id, chat_id.0
        );
        Ok(vec![time_record, place_record])
    }

    /// Counts one vote per selected option. Polls the bot did not publish are
    /// ignored. Returns how many votes were recorded.
    pub async fn on_vote(&self, poll_id: &str, option_indices: &[i64]) -> BotResult<usize> {
        if !PollRecord::exists(&self.db.pool, poll_id).await? {
            tracing::debug!("Ignoring answer for unknown poll {}", poll_id);
            return Ok(0);
        }

        for &index in option_indices {
            PollResult::record_vote(&self.db.pool, poll_id, index).await?;
        }
        Ok(option_indices.len())
    }

    /// Announces the winning time slot and place, then clears every poll.
    ///
    /// Poll data is cleared even when there was not enough data to announce
    /// winners, so the next cycle starts from scratch.
    pub async fn tally_and_announce(&self) -> BotResult<Announcement> {
        let decided = self.decide().await;

        if let Ok(announcement) = &decided {
            let text = self.render(announcement).await;
            if let Err(e) = self.transport.send_message(self.settings.chat_id, &text).await {
                tracing::warn!("Failed to announce poll results: {}", e);
            }
        }

        let cleared = PollResult::clear_all(&self.db.pool).await;
        let announcement = decided?;
        cleared?;
        Ok(announcement)
    }

    async fn decide(&self) -> BotResult<Announcement> {
        let mut time_slot = None;
        let mut place = None;

        for poll in PollRecord::list(&self.db.pool).await? {
            let slot = match poll.kind {
                PollKind::TimeSlot => &mut time_slot,
                PollKind::Place => &mut place,
            };
            if slot.is_some() {
                continue;
            }

            match PollResult::tally(&self.db.pool, &poll.poll_id).await {
                Ok(index) => *slot = poll.options.get(index).cloned(),
                Err(BotError::InsufficientData) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(match (time_slot, place) {
            (Some(time_slot), Some(place)) => Announcement::Winners { time_slot, place },
            _ => Announcement::NotEnoughData,
        })
    }

    async fn render(&self, announcement: &Announcement) -> String {
        match announcement {
            Announcement::Winners { time_slot, place } => {
                let address = match Place::find(&self.db.pool, place).await {
                    Ok(Some(found)) => format!(" ({})", found.address),
                    _ => String::new(),
                };
                format!("📊 The votes are in!\n\n🕐 When: {time_slot}\n📍 Where: {place}{address}")
            }
            Announcement::NotEnoughData => format_feedback(
                FeedbackType::Info,
                "Not enough votes to pick a time and a place this time.",
            ),
        }
    }
}
