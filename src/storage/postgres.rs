//! PostgreSQL [`Storage`] implementation.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::envelope::Envelope;
use crate::models::user::User;
use crate::storage::Storage;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS envelopes (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL REFERENCES users (id),
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT NOT NULL DEFAULT 0,
    data BYTEA NOT NULL
);

CREATE INDEX IF NOT EXISTS envelopes_owner_idx ON envelopes (owner_id);
"#;

pub struct PostgresStorage {
    pool: Pool,
}

impl PostgresStorage {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }
}

fn row_to_envelope(row: &Row) -> Result<Envelope> {
    let kind: String = row.try_get("kind")?;
    Ok(Envelope {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        kind: kind.parse()?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
        data: row.try_get("data")?,
    })
}

fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn get_by_owner(&self, owner_id: Uuid) -> Result<Vec<Envelope>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, owner_id, kind, name, created_at, updated_at, deleted_at, data
                FROM envelopes
                WHERE owner_id = $1
                "#,
                &[&owner_id],
            )
            .await?;
        rows.iter().map(row_to_envelope).collect()
    }

    async fn upsert_if_newer(&self, envelope: &Envelope) -> Result<bool> {
        let client = self.pool.get().await?;
        // The ON CONFLICT guard is the whole merge policy: the row only
        // moves forward in updated_at, and never across owners.
        let affected = client
            .execute(
                r#"
                INSERT INTO envelopes (id, owner_id, kind, name, created_at, updated_at, deleted_at, data)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO UPDATE
                SET kind = EXCLUDED.kind,
                    name = EXCLUDED.name,
                    updated_at = EXCLUDED.updated_at,
                    deleted_at = EXCLUDED.deleted_at,
                    data = EXCLUDED.data
                WHERE envelopes.owner_id = EXCLUDED.owner_id
                  AND envelopes.updated_at < EXCLUDED.updated_at
                "#,
                &[
                    &envelope.id,
                    &envelope.owner_id,
                    &envelope.kind.as_str(),
                    &envelope.name,
                    &envelope.created_at,
                    &envelope.updated_at,
                    &envelope.deleted_at,
                    &envelope.data,
                ],
            )
            .await?;
        Ok(affected > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM envelopes WHERE id = $1", &[&id])
            .await?;
        Ok(())
    }

    async fn find_user(&self, email: &str) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, email, password, created_at
                FROM users
                WHERE email = $1
                "#,
                &[&email],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO users (id, email, password, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
                &[&user.id, &user.email, &user.password_hash, &user.created_at],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::Validation("user with this email already exists".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(())
    }
}
