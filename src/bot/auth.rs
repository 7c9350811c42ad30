use std::collections::HashSet;
use teloxide::types::{ChatId, UserId};

use super::transport::ChatTransport;

/// Decides who may run privileged commands.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    admin_ids: HashSet<u64>,
}

impl AuthorizationGate {
    pub fn new(admin_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            admin_ids: admin_ids.into_iter().collect(),
        }
    }

    pub fn is_allow_listed(&self, user_id: UserId) -> bool {
        self.admin_ids.contains(&user_id.0)
    }

    /// True for allow-listed users and for owners/administrators of the chat.
    /// A failed role lookup counts as no role.
    pub async fn is_authorized(
        &self,
        transport: &dyn ChatTransport,
        chat_id: ChatId,
        user_id: UserId,
    ) -> bool {
        if self.is_allow_listed(user_id) {
            return true;
        }

        match transport.member_role(chat_id, user_id).await {
            Ok(role) => role.is_privileged(),
            Err(e) => {
                tracing::warn!(
                    "Could not look up role of user {} in chat {}: {}",
                    user_id.0, chat_id.0, e
                );
                false
            }
        }
    }
}
