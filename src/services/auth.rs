use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use zeroize::Zeroize;

use crate::cache::CachedStore;
use crate::error::{AppError, Result};
use crate::models::user::User;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes a secret into an argon2id PHC verifier string.
fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Encryption(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Encryption(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a secret against a stored verifier hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Encryption(format!("Hash parse error: {}", e)))?;
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Creates a user record with a verifier hash; the plaintext secret is
/// never stored.
pub async fn create_user(store: &CachedStore, email: &str, password: &str) -> Result<User> {
    let user = User::new(email.to_string(), hash_password(password)?);
    store.create_user(user.clone()).await?;
    tracing::info!(user = %user.id, "user registered");
    Ok(user)
}

/// Resolves email + secret to a user.
///
/// Unknown email and wrong secret produce the same error so accounts
/// cannot be enumerated.
pub async fn authenticate_user(store: &CachedStore, email: &str, password: &str) -> Result<User> {
    let user = store
        .find_user(email)
        .await?
        .ok_or_else(|| AppError::Authentication("invalid email or password".to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::Authentication(
            "invalid email or password".to_string(),
        ));
    }

    tracing::debug!(user = %user.id, "user authenticated");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn store() -> CachedStore {
        CachedStore::new(Arc::new(MemoryStorage::new()), 6)
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let store = store();
        let created = create_user(&store, "a@b.c", "secret-pass").await.unwrap();

        let user = authenticate_user(&store, "a@b.c", "secret-pass").await.unwrap();
        assert_eq!(user.id, created.id);
        assert_ne!(user.password_hash, "secret-pass");

        assert!(matches!(
            authenticate_user(&store, "a@b.c", "wrong").await,
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(
            authenticate_user(&store, "nobody@b.c", "secret-pass").await,
            Err(AppError::Authentication(_))
        ));
    }
}
