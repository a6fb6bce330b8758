//! Per-user conversational session state.
//!
//! A session exists only while a multi-step contact flow is in progress.
//! Absence of a session is the steady state and behaves like an implicit
//! "none" step.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::package::Category;

/// Current step of an in-flight contact flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ChoosingCategory,
    AwaitingMessage,
    AwaitingContactInfo,
}

/// Ephemeral state for one user's contact flow.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub step: Step,
    pub category: Option<Category>,
    pub pending_message: Option<String>,
    pub contact_info: Option<String>,
    /// Creation timestamp (milliseconds since epoch); recorded for a
    /// potential staleness policy, none is enforced.
    pub started_at: i64,
}

impl UserSession {
    fn new(step: Step) -> Self {
        Self {
            step,
            category: None,
            pending_message: None,
            contact_info: None,
            started_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// In-memory store of user sessions, keyed by conversation ID.
///
/// Cheaply cloneable; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, UserSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of a user's session, if one exists.
    pub async fn get(&self, user: &str) -> Option<UserSession> {
        self.sessions.read().await.get(user).cloned()
    }

    /// Start a fresh session at `step`, overwriting any prior session.
    pub async fn start(&self, user: &str, step: Step) -> UserSession {
        let session = UserSession::new(step);
        self.sessions
            .write()
            .await
            .insert(user.to_string(), session.clone());
        session
    }

    /// Mutate an existing session in place. No-op when none exists;
    /// callers that require existence must check `get` first.
    pub async fn update<F>(&self, user: &str, mutator: F)
    where
        F: FnOnce(&mut UserSession),
    {
        if let Some(session) = self.sessions.write().await.get_mut(user) {
            mutator(session);
        }
    }

    /// Remove a user's session. Idempotent.
    pub async fn clear(&self, user: &str) {
        self.sessions.write().await.remove(user);
    }

    /// Number of in-flight sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
