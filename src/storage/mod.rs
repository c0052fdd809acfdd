//! The durable persistence collaborator.
//!
//! The reconciliation engine only ever needs this narrow contract; the
//! concrete backend stays swappable (Postgres in production, in-memory for
//! tests and single-node demos).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::envelope::Envelope;
use crate::models::user::User;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the complete envelope set for an owner, tombstones included.
    async fn get_by_owner(&self, owner_id: Uuid) -> Result<Vec<Envelope>>;

    /// Conditional upsert: insert if absent, replace only when the incoming
    /// `updated_at` is strictly newer and the owner matches the stored row.
    /// Returns whether the write was applied.
    async fn upsert_if_newer(&self, envelope: &Envelope) -> Result<bool>;

    /// Hard-removes an envelope (distinct from tombstoning).
    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn find_user(&self, email: &str) -> Result<Option<User>>;

    /// Fails with a validation error when the email is already taken.
    async fn create_user(&self, user: &User) -> Result<()>;
}
