use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to hash credential")]
    Hash,
    #[error("stored credential is not a valid PHC string")]
    InvalidHash,
}

#[cfg(not(test))]
fn argon2_instance() -> Argon2<'static> {
    Argon2::default()
}

// Reduced cost so the test suite stays fast. Never used outside tests.
#[cfg(test)]
fn argon2_instance() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};

    match Params::new(1024, 1, 1, None) {
        Ok(params) => Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        Err(_) => Argon2::default(),
    }
}

/// Hash a plaintext secret into an Argon2id PHC string.
pub fn hash_secret(secret: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2_instance()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CredentialError::Hash)
}

pub fn verify_secret(secret: &str, stored: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(stored).map_err(|_| CredentialError::InvalidHash)?;
    Ok(argon2_instance()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}
