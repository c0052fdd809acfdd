//! The encrypted-at-rest record plus its metadata: the unit of storage and
//! synchronization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::item::ItemKind;

/// An opaque ciphertext envelope.
///
/// Invariants:
/// - `id` is assigned once at creation and never changes.
/// - `updated_at` is non-decreasing across the envelope's lifetime.
/// - `deleted_at > 0` (tombstone) implies `data` is empty.
/// - `owner_id` partitions all reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Plaintext label used for list display; never encrypted.
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub deleted_at: i64,
    /// Sealed item payload, base64 on the wire; empty for tombstones.
    #[serde(with = "base64_bytes", default)]
    pub data: Vec<u8>,
}

impl Envelope {
    /// Whether this envelope is a soft-deleted marker.
    pub fn is_tombstone(&self) -> bool {
        self.deleted_at > 0
    }
}

/// Current wall-clock time as unix seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Serde adapter: `Vec<u8>` as a base64 string on the wire.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            kind: ItemKind::Login,
            name: "site1".to_string(),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_100,
            deleted_at: 0,
            data: vec![1, 2, 3, 4],
        }
    }

    #[test]
    fn wire_shape_uses_type_tag_and_base64_data() {
        let env = sample();
        let json = sonic_rs::to_string(&env).unwrap();
        assert!(json.contains(r#""type":"login""#));
        assert!(json.contains(r#""data":"AQIDBA==""#));
        let back: Envelope = sonic_rs::from_str(&json).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn tombstone_predicate() {
        let mut env = sample();
        assert!(!env.is_tombstone());
        env.deleted_at = env.updated_at;
        assert!(env.is_tombstone());
    }
}
