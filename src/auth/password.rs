use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Argon2 is CPU bound, so both operations run on the blocking pool.
pub async fn hash_password(plain: &str) -> anyhow::Result<String> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!(error = %e, "password hashing failed");
                anyhow::anyhow!("password hashing failed: {e}")
            })
    })
    .await
    .context("password hashing task panicked")?
}

/// `Ok(false)` on mismatch; an unparseable stored hash is an error.
pub async fn verify_password(plain: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let plain = plain.to_owned();
    let stored_hash = stored_hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash).map_err(|e| {
            error!(error = %e, "stored password hash is malformed");
            anyhow::anyhow!("malformed password hash: {e}")
        })?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .context("password verification task panicked")?
}
