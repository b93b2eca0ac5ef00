//! Per-user dialog sessions.
//!
//! One async mutex per user serialises that user's events: the lock is
//! held for the whole handling of an inbound event, so two messages from
//! the same user never interleave reads and writes of the dialog scratch.
//! Different users never contend beyond the short map lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::state::DialogState;
use crate::models::UserId;

pub type SessionHandle = Arc<tokio::sync::Mutex<DialogState>>;

#[derive(Default)]
pub struct DialogSessions {
    sessions: Mutex<HashMap<UserId, SessionHandle>>,
}

impl DialogSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `user_id`, created in `Idle` on first use.
    pub fn session(&self, user_id: UserId) -> SessionHandle {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.entry(user_id).or_default().clone()
    }

    /// Current state without holding the lock afterwards.
    pub async fn snapshot(&self, user_id: UserId) -> DialogState {
        let handle = self.session(user_id);
        let state = handle.lock().await;
        state.clone()
    }

    /// Drops idle sessions nobody is holding. Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(state) => !state.is_idle(),
                Err(_) => true,
            }
        });
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
