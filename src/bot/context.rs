use std::sync::Arc;
use teloxide::types::ChatId;

use crate::bot::auth::AuthorizationGate;
use crate::bot::dialogue::{DialogueController, FlowSettings};
use crate::bot::transport::ChatTransport;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::services::cleanup::MessageCleaner;
use crate::services::polls::{PollCoordinator, PollSettings};
use crate::utils::feedback::CommandFeedback;

/// Everything a handler needs, built once at startup and shared by `Arc`.
pub struct AppContext {
    pub db: DatabaseManager,
    pub transport: Arc<dyn ChatTransport>,
    pub controller: DialogueController,
    pub polls: PollCoordinator,
    pub cleaner: MessageCleaner,
}

impl AppContext {
    pub fn new(
        db: DatabaseManager,
        transport: Arc<dyn ChatTransport>,
        auth: AuthorizationGate,
        flow_settings: FlowSettings,
        poll_settings: PollSettings,
    ) -> Self {
        let controller = DialogueController::new(db.clone(), transport.clone(), auth, flow_settings);
        let polls = PollCoordinator::new(db.clone(), transport.clone(), poll_settings);
        let cleaner = MessageCleaner::new(transport.clone());

        Self {
            db,
            transport,
            controller,
            polls,
            cleaner,
        }
    }

    pub fn from_config(db: DatabaseManager, transport: Arc<dyn ChatTransport>, config: &Config) -> Self {
        let auth = AuthorizationGate::new(config.admin_ids.iter().copied());
        let flow_settings = FlowSettings {
            cleanup_delay: config.cleanup_delay,
            denied_cleanup_delay: config.denied_cleanup_delay,
            allowed_chat_ids: config.allowed_chat_ids.iter().map(|&id| ChatId(id)).collect(),
        };
        let poll_settings = PollSettings {
            chat_id: ChatId(config.poll_chat_id),
            time_slots: config.poll_time_slots.clone(),
        };
        Self::new(db, transport, auth, flow_settings, poll_settings)
    }

    pub fn feedback(&self, chat_id: ChatId) -> CommandFeedback {
        CommandFeedback::new(self.transport.clone(), chat_id)
    }
}
