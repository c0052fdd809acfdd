//! The client's encrypted local cache.
//!
//! Envelopes live in memory for the process lifetime; deletes tombstone
//! instead of removing so the next sync can propagate them, and each
//! successful sync replaces the whole map via [`LocalCache::swap`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::client::credentials::CredentialSource;
use crate::error::{AppError, Result};
use crate::models::envelope::{unix_now, Envelope};
use crate::models::item::Item;

/// The signed-in account this vault encrypts for.
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    pub user_id: Uuid,
}

pub struct LocalCache {
    credentials: Arc<dyn CredentialSource>,
    identity: RwLock<Option<Identity>>,
    entries: RwLock<HashMap<Uuid, Envelope>>,
}

impl LocalCache {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            credentials,
            identity: RwLock::new(None),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialSource> {
        &self.credentials
    }

    /// Records who this vault belongs to; called after sign-in/sign-up.
    pub fn set_identity(&self, email: &str, user_id: Uuid) {
        *self.identity.write().expect("identity lock poisoned") = Some(Identity {
            email: email.to_string(),
            user_id,
        });
    }

    pub fn identity(&self) -> Result<Identity> {
        self.identity
            .read()
            .expect("identity lock poisoned")
            .clone()
            .ok_or_else(|| AppError::Authentication("not signed in".to_string()))
    }

    /// Encrypts an item with the current user's passphrase and stores it.
    ///
    /// A `None` id creates a fresh envelope (new id, `created_at` stamped);
    /// a known id updates it in place. Either way `updated_at` moves
    /// forward and any tombstone is cleared.
    pub fn add_encrypted(&self, item: &Item, name: &str, id: Option<Uuid>) -> Result<Envelope> {
        let identity = self.identity()?;
        let passphrase = self.credentials.get_passphrase(&identity.email)?;
        let data = item.encrypt(&passphrase)?;
        let now = unix_now();

        let mut entries = self.entries.write().expect("vault lock poisoned");
        let envelope = match id.and_then(|id| entries.get(&id).cloned()) {
            Some(mut existing) => {
                existing.kind = item.kind();
                existing.name = name.to_string();
                existing.owner_id = identity.user_id;
                // unix seconds: bump past the previous stamp so a
                // same-second edit still wins the server-side merge
                existing.updated_at = now.max(existing.updated_at + 1);
                existing.deleted_at = 0;
                existing.data = data;
                existing
            }
            None => Envelope {
                id: id.unwrap_or_else(Uuid::new_v4),
                owner_id: identity.user_id,
                kind: item.kind(),
                name: name.to_string(),
                created_at: now,
                updated_at: now,
                deleted_at: 0,
                data,
            },
        };
        entries.insert(envelope.id, envelope.clone());
        Ok(envelope)
    }

    /// Looks up an envelope and decrypts it according to its kind.
    ///
    /// Fails with [`AppError::Deleted`] when the id is absent or
    /// tombstoned; decryption failures surface per item without touching
    /// the stored envelope.
    pub fn find_decrypt(&self, id: Uuid) -> Result<(Item, Envelope)> {
        let identity = self.identity()?;
        let envelope = {
            let entries = self.entries.read().expect("vault lock poisoned");
            entries
                .get(&id)
                .filter(|e| !e.is_tombstone())
                .cloned()
                .ok_or(AppError::Deleted)?
        };
        let passphrase = self.credentials.get_passphrase(&identity.email)?;
        let item = Item::decrypt(envelope.kind, &passphrase, &envelope.data)?;
        Ok((item, envelope))
    }

    /// Tombstones an envelope so the deletion propagates on the next sync.
    pub fn delete(&self, id: Uuid) -> Result<()> {
        let mut entries = self.entries.write().expect("vault lock poisoned");
        let envelope = entries.get_mut(&id).ok_or(AppError::Deleted)?;
        let now = unix_now();
        envelope.updated_at = now.max(envelope.updated_at + 1);
        envelope.deleted_at = envelope.updated_at;
        envelope.data.clear();
        Ok(())
    }

    /// Wholesale-replaces the local set with the server's authoritative one.
    pub fn swap(&self, envelopes: Vec<Envelope>) {
        let mut entries = self.entries.write().expect("vault lock poisoned");
        entries.clear();
        entries.extend(envelopes.into_iter().map(|e| (e.id, e)));
    }

    /// A clone of the full local set, tombstones included, for the sync
    /// request body.
    pub fn snapshot(&self) -> Vec<Envelope> {
        let entries = self.entries.read().expect("vault lock poisoned");
        let mut set: Vec<Envelope> = entries.values().cloned().collect();
        set.sort_by_key(|e| (e.created_at, e.id));
        set
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("vault lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
