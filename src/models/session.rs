use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An authenticated session. Scopes every operation to its owner.
#[derive(Debug, Clone)]
pub struct Session {
    /// The session token handed to the client.
    pub id: Uuid,
    /// The user this session authenticates as.
    pub user_id: Uuid,
    /// Creation time; validity is `now - created_at < TTL`.
    pub created_at: DateTime<Utc>,
}
