//! In-memory session lifecycle with TTL expiry.
//!
//! Constructed once and injected through [`crate::state::AppState`]; nothing
//! in the crate reaches for a process-global table.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::session::Session;

pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a session for a user and records its creation time.
    pub fn create_session(&self, user_id: Uuid) -> Result<Session> {
        if user_id.is_nil() {
            return Err(AppError::Validation("user id is empty".to_string()));
        }
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .expect("session lock poisoned")
            .insert(session.id, session.clone());
        Ok(session)
    }

    /// Resolves a session id; evicts and fails if the session has expired.
    pub fn get_session(&self, session_id: Uuid) -> Result<Session> {
        let expired = {
            let sessions = self.sessions.read().expect("session lock poisoned");
            let session = sessions
                .get(&session_id)
                .ok_or_else(|| AppError::Authentication("session not found".to_string()))?;
            if Utc::now() - session.created_at < self.ttl {
                return Ok(session.clone());
            }
            session.id
        };
        // Lazy eviction on first check past the TTL.
        self.sessions
            .write()
            .expect("session lock poisoned")
            .remove(&expired);
        Err(AppError::Authentication("session is expired".to_string()))
    }

    /// Validity check used as an authorization gate.
    pub fn check_session(&self, session_id: Uuid) -> Result<()> {
        self.get_session(session_id).map(|_| ())
    }

    /// Explicit revocation of one session.
    pub fn delete_session(&self, session_id: Uuid) {
        self.sessions
            .write()
            .expect("session lock poisoned")
            .remove(&session_id);
    }

    /// Revokes every session belonging to a user (logout-everywhere).
    pub fn delete_all_sessions(&self, user_id: Uuid) {
        self.sessions
            .write()
            .expect("session lock poisoned")
            .retain(|_, s| s.user_id != user_id);
    }

    #[cfg(test)]
    fn insert_backdated(&self, user_id: Uuid, age: Duration) -> Uuid {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now() - age,
        };
        let id = session.id;
        self.sessions
            .write()
            .expect("session lock poisoned")
            .insert(id, session);
        id
    }
}
