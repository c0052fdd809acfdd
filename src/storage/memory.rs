//! In-memory [`Storage`] implementation for tests and single-node demos.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::envelope::Envelope;
use crate::models::user::User;
use crate::storage::Storage;

#[derive(Default)]
pub struct MemoryStorage {
    users: RwLock<HashMap<Uuid, User>>,
    envelopes: RwLock<HashMap<Uuid, Envelope>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_by_owner(&self, owner_id: Uuid) -> Result<Vec<Envelope>> {
        let envelopes = self.envelopes.read().expect("envelope lock poisoned");
        Ok(envelopes
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn upsert_if_newer(&self, envelope: &Envelope) -> Result<bool> {
        let mut envelopes = self.envelopes.write().expect("envelope lock poisoned");
        match envelopes.get(&envelope.id) {
            None => {
                envelopes.insert(envelope.id, envelope.clone());
                Ok(true)
            }
            Some(stored)
                if stored.owner_id == envelope.owner_id
                    && envelope.updated_at > stored.updated_at =>
            {
                envelopes.insert(envelope.id, envelope.clone());
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.envelopes
            .write()
            .expect("envelope lock poisoned")
            .remove(&id);
        Ok(())
    }

    async fn find_user(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().expect("user lock poisoned");
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().expect("user lock poisoned");
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Validation(
                "user with this email already exists".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}
