//! Password credential value object.
//!
//! A [`PasswordDigest`] only ever holds an Argon2 PHC string. It can be built
//! by hashing a plaintext password or by parsing an already-hashed value, and
//! there is no way to get the plaintext back out of it.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::DeriveValueType;
use std::fmt;
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid password hash format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported password hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),
}

#[derive(Clone, PartialEq, Eq, DeriveValueType)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hash a plaintext password with Argon2id using the configured cost parameters.
    ///
    /// This is CPU-bound; async callers should run it on a blocking thread.
    pub fn hash(plaintext: &str, config: &SecurityConfig) -> Result<Self, CredentialError> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| CredentialError::Hashing(format!("invalid Argon2 params: {e}")))?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;

        Ok(Self(hash.to_string()))
    }

    /// Accept a digest computed elsewhere. Only Argon2 PHC strings are allowed.
    pub fn parse(phc: &str) -> Result<Self, CredentialError> {
        let parsed =
            PasswordHash::new(phc).map_err(|e| CredentialError::InvalidFormat(e.to_string()))?;

        let algorithm = parsed.algorithm.as_str();
        if !matches!(algorithm, "argon2id" | "argon2i" | "argon2d") {
            return Err(CredentialError::UnsupportedAlgorithm(algorithm.to_string()));
        }

        Ok(Self(phc.to_string()))
    }

    /// Check a plaintext password against this digest.
    ///
    /// Cost parameters are read from the stored PHC string, so digests created
    /// under older settings still verify.
    #[must_use]
    pub fn verify(&self, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.0) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}
