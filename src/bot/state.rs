use teloxide::types::MessageId;

/// Name attempts granted to an administrator deleting a place.
pub const DELETE_ATTEMPTS: u8 = 3;
/// Attempts granted at each step of the rating flow.
pub const RATE_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddStep {
    AwaitingName,
    AwaitingAddress { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateStep {
    AwaitingName { attempts_left: u8 },
    AwaitingScore { name: String, attempts_left: u8 },
}

/// Where a user currently is in a conversation with the bot.
///
/// `Idle` is both the initial and the terminal state of every flow. Each flow
/// carries its own collected fields, so a step can never read a field that an
/// earlier step did not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogueState {
    #[default]
    Idle,
    AddPlace(AddStep),
    DeletePlace { attempts_left: u8 },
    RatePlace(RateStep),
}

impl DialogueState {
    pub fn start_add() -> Self {
        DialogueState::AddPlace(AddStep::AwaitingName)
    }

    pub fn start_delete() -> Self {
        DialogueState::DeletePlace { attempts_left: DELETE_ATTEMPTS }
    }

    pub fn start_rate() -> Self {
        DialogueState::RatePlace(RateStep::AwaitingName { attempts_left: RATE_ATTEMPTS })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DialogueState::Idle)
    }

    /// Flow name used in logs.
    pub fn flow(&self) -> &'static str {
        match self {
            DialogueState::Idle => "idle",
            DialogueState::AddPlace(_) => "add",
            DialogueState::DeletePlace { .. } => "delete",
            DialogueState::RatePlace(_) => "rate",
        }
    }

    /// Step name used in logs.
    pub fn step(&self) -> &'static str {
        match self {
            DialogueState::Idle => "Idle",
            DialogueState::AddPlace(AddStep::AwaitingName) => "AwaitingName",
            DialogueState::AddPlace(AddStep::AwaitingAddress { .. }) => "AwaitingAddress",
            DialogueState::DeletePlace { .. } => "AwaitingName",
            DialogueState::RatePlace(RateStep::AwaitingName { .. }) => "AwaitingName",
            DialogueState::RatePlace(RateStep::AwaitingScore { .. }) => "AwaitingScore",
        }
    }
}

/// Ephemeral conversation memory for one user in one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: DialogueState,
    /// Messages to delete once the current flow ends, in posting order.
    pub pending_message_ids: Vec<MessageId>,
}

impl Session {
    pub fn track(&mut self, message_id: MessageId) {
        self.pending_message_ids.push(message_id);
    }

    /// Returns to `Idle` and hands back every message queued for cleanup.
    pub fn finish(&mut self) -> Vec<MessageId> {
        self.state = DialogueState::Idle;
        std::mem::take(&mut self.pending_message_ids)
    }
}
