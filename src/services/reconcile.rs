//! Server-side half of the sync round trip: per-item owner filter, LWW
//! merge, full-snapshot response assembly.

use uuid::Uuid;

use crate::cache::CachedStore;
use crate::error::Result;
use crate::models::envelope::Envelope;

/// Merges a client's submitted envelope set into the owner's server state
/// and returns the complete, current set for that owner.
///
/// - Envelopes claiming a different owner are dropped and logged, never
///   errored; the rest of the batch proceeds (partial acceptance).
/// - Each accepted envelope goes through a conditional upsert; a losing
///   write (not strictly newer) is dropped without error.
/// - The returned set is always a full snapshot, never a delta.
pub async fn merge_owner_set(
    store: &CachedStore,
    user_id: Uuid,
    incoming: Vec<Envelope>,
) -> Result<Vec<Envelope>> {
    for mut envelope in incoming {
        if envelope.owner_id != user_id {
            tracing::warn!(
                item = %envelope.id,
                claimed_owner = %envelope.owner_id,
                session_owner = %user_id,
                "dropping envelope with foreign owner"
            );
            continue;
        }
        if envelope.is_tombstone() && !envelope.data.is_empty() {
            // tombstones carry no payload
            envelope.data.clear();
        }

        let applied = store.upsert_if_newer(envelope.clone()).await?;
        if !applied {
            tracing::debug!(item = %envelope.id, "stored version is newer, write dropped");
        }
    }

    store.get_by_owner(user_id).await
}
