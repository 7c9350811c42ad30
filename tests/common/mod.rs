#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};
use teloxide::types::{ChatId, MessageId, UserId};

use places_bot::bot::auth::AuthorizationGate;
use places_bot::bot::dialogue::{DialogueController, FlowSettings, IncomingMessage};
use places_bot::bot::transport::{ChatTransport, MemberRole, SentPoll};
use places_bot::database::connection::DatabaseManager;
use places_bot::error::{BotError, BotResult};

pub const CHAT: ChatId = ChatId(-100_200);
pub const ADMIN: UserId = UserId(1);
pub const MEMBER: UserId = UserId(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPoll {
    pub chat_id: ChatId,
    pub question: String,
    pub options: Vec<String>,
    pub anonymous: bool,
    pub multiple_answers: bool,
}

/// In-memory chat platform. Records everything the bot sends.
#[derive(Default)]
pub struct FakeTransport {
    next_id: AtomicI32,
    pub sent: Mutex<Vec<SentMessage>>,
    pub deleted: Mutex<Vec<MessageId>>,
    pub polls: Mutex<Vec<PublishedPoll>>,
    roles: Mutex<HashMap<(i64, u64), MemberRole>>,
    gone: Mutex<HashSet<i32>>,
    broken_ids: Mutex<HashSet<i32>>,
    fail_role_lookups: AtomicBool,
    fail_sends: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_role(&self, chat_id: ChatId, user_id: UserId, role: MemberRole) {
        self.roles.lock().unwrap().insert((chat_id.0, user_id.0), role);
    }

    pub fn fail_role_lookups(&self, fail: bool) {
        self.fail_role_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Marks a message as already removed by someone else.
    pub fn mark_gone(&self, message_id: MessageId) {
        self.gone.lock().unwrap().insert(message_id.0);
    }

    /// Makes deleting a message fail with a transport error.
    pub fn break_message(&self, message_id: MessageId) {
        self.broken_ids.lock().unwrap().insert(message_id.0);
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }

    pub fn last_text(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|m| m.text.clone())
            .unwrap_or_default()
    }

    pub fn sent_ids(&self) -> Vec<MessageId> {
        self.sent.lock().unwrap().iter().map(|m| m.message_id).collect()
    }

    pub fn published(&self) -> Vec<PublishedPoll> {
        self.polls.lock().unwrap().clone()
    }

    fn allocate_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> BotResult<MessageId> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BotError::Transport("send failed".to_string()));
        }
        let message_id = self.allocate_id();
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(message_id)
    }

    async fn delete_message(&self, _chat_id: ChatId, message_id: MessageId) -> BotResult<()> {
        if self.broken_ids.lock().unwrap().contains(&message_id.0) {
            return Err(BotError::Transport("delete failed".to_string()));
        }
        if !self.gone.lock().unwrap().insert(message_id.0) {
            return Err(BotError::NotDeletable(message_id.0));
        }
        self.deleted.lock().unwrap().push(message_id);
        Ok(())
    }

    async fn send_poll(
        &self,
        chat_id: ChatId,
        question: &str,
        options: &[String],
        anonymous: bool,
        multiple_answers: bool,
    ) -> BotResult<SentPoll> {
        let mut polls = self.polls.lock().unwrap();
        polls.push(PublishedPoll {
            chat_id,
            question: question.to_string(),
            options: options.to_vec(),
            anonymous,
            multiple_answers,
        });
        Ok(SentPoll {
            poll_id: format!("poll-{}", polls.len()),
            options: options.to_vec(),
        })
    }

    async fn member_role(&self, chat_id: ChatId, user_id: UserId) -> BotResult<MemberRole> {
        if self.fail_role_lookups.load(Ordering::SeqCst) {
            return Err(BotError::Transport("getChatMember timed out".to_string()));
        }
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&(chat_id.0, user_id.0))
            .copied()
            .unwrap_or(MemberRole::Member))
    }
}

pub async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.ensure_schema().await?;

    Ok((db_manager, temp_dir))
}

/// A controller over a fresh database and a fake transport. `ADMIN` is on
/// the allow-list.
pub struct TestBot {
    pub db: DatabaseManager,
    pub transport: Arc<FakeTransport>,
    pub controller: DialogueController,
    _temp_dir: TempDir,
    next_user_message: AtomicI32,
}

impl TestBot {
    pub async fn new() -> Result<Self> {
        Self::with_settings(FlowSettings::default()).await
    }

    pub async fn with_settings(settings: FlowSettings) -> Result<Self> {
        let (db, temp_dir) = setup_test_db().await?;
        let transport = FakeTransport::new();
        let controller = DialogueController::new(
            db.clone(),
            transport.clone(),
            AuthorizationGate::new([ADMIN.0]),
            settings,
        );
        Ok(Self {
            db,
            transport,
            controller,
            _temp_dir: temp_dir,
            next_user_message: AtomicI32::new(10_000),
        })
    }

    /// A message from `user` in the test chat, with a fresh id.
    pub fn message(&self, user: UserId, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: CHAT,
            user_id: user,
            message_id: MessageId(self.next_user_message.fetch_add(1, Ordering::SeqCst)),
            text: text.to_string(),
        }
    }
}
