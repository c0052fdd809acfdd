use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered account on the server.
///
/// Only the argon2 verifier hash is kept; the plaintext secret is never
/// stored or transmitted past authentication.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
