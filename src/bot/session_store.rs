//! In-memory session table keyed by (chat, user).
//!
//! Each session sits behind its own async mutex. A handler takes the owned
//! guard from [`SessionStore::lock`] and keeps it for the whole event, so two
//! messages from the same user are handled one after the other while other
//! users proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use teloxide::types::{ChatId, UserId};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::state::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl SessionKey {
    pub fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }
}

type Slot = Arc<AsyncMutex<Session>>;

#[derive(Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<SessionKey, Slot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<SessionKey, Slot>> {
        // The map is only touched by short, panic-free sections; a poisoned
        // lock still holds consistent data.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn slot(&self, key: SessionKey) -> Slot {
        self.slots().entry(key).or_default().clone()
    }

    /// Exclusive access to the session for `key`, creating an idle one if needed.
    pub async fn lock(&self, key: SessionKey) -> OwnedMutexGuard<Session> {
        self.slot(key).lock_owned().await
    }

    /// Snapshot of the session, if one is being tracked.
    pub async fn get(&self, key: SessionKey) -> Option<Session> {
        let slot = self.slots().get(&key).cloned()?;
        let session = slot.lock().await;
        Some(session.clone())
    }

    /// Replaces whatever the user had with a fresh idle session.
    pub async fn start(&self, key: SessionKey) -> Session {
        let mut session = self.lock(key).await;
        *session = Session::default();
        session.clone()
    }

    pub async fn update<F>(&self, key: SessionKey, mutator: F)
    where
        F: FnOnce(&mut Session),
    {
        let mut session = self.lock(key).await;
        mutator(&mut session);
    }

    /// Forgets the session entirely.
    pub async fn end(&self, key: SessionKey) {
        {
            let mut session = self.lock(key).await;
            *session = Session::default();
        }
        self.release(key);
    }

    /// Drops the entry for `key` when it is idle and nobody else holds it.
    ///
    /// Must be called after the caller's own guard is dropped.
    pub fn release(&self, key: SessionKey) {
        let mut slots = self.slots();
        let removable = match slots.get(&key) {
            Some(slot) => {
                Arc::strong_count(slot) == 1
                    && slot
                        .try_lock()
                        .map(|session| session.state.is_idle() && session.pending_message_ids.is_empty())
                        .unwrap_or(false)
            }
            None => false,
        };
        if removable {
            slots.remove(&key);
        }
    }

    /// Number of (chat, user) pairs currently tracked.
    pub fn active_sessions(&self) -> usize {
        self.slots().len()
    }
}
