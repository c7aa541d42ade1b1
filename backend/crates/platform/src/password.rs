//! Password Hashing and Policy
//!
//! - Argon2id hashing with the library's fixed default cost parameters
//! - Zeroization of clear-text material
//! - Minimal length policy; breach-corpus membership via [`BreachListLookup`]
//!
//! Policy and breach check are separate on purpose: callers must accept a
//! password only when `satisfies_policy(pw)` holds AND the breach lookup
//! reports it absent.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::generate_secure_token;

/// Minimum password length after trimming
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of generated throwaway credentials (144 bits of entropy)
pub const THROWAWAY_PASSWORD_LENGTH: usize = 24;

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Check the password policy: trimmed length of at least 8 characters.
///
/// Counts Unicode code points, not bytes.
pub fn satisfies_policy(password: &str) -> bool {
    password.trim().chars().count() >= MIN_PASSWORD_LENGTH
}

/// Membership check against a known-breached password corpus.
///
/// Backed by an externally loaded dataset; loading is not this crate's
/// concern. Callers pass the lowercased candidate. Lookup failures are
/// reported as "not present" so a degraded corpus never blocks signups.
#[trait_variant::make(BreachListLookup: Send)]
pub trait LocalBreachListLookup {
    async fn contains(&self, lowercased_password: &str) -> bool;
}

/// Clear text password with automatic memory zeroization
///
/// Does not implement `Clone`; debug output is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: String) -> Self {
        Self(raw)
    }

    /// Generate a high-entropy throwaway credential.
    ///
    /// Used when an account is created without a password: the account
    /// gets an unguessable credential nobody knows, forcing a password
    /// reset before password login is possible.
    pub fn generate_throwaway() -> Self {
        Self(generate_secure_token(THROWAWAY_PASSWORD_LENGTH))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash the password using Argon2id
    ///
    /// Returns a PHC-formatted hash string wrapped in [`HashedPassword`].
    pub fn hash(&self) -> Result<HashedPassword, PasswordHashError> {
        // Random 128-bit salt per hash
        let salt = SaltString::generate(OsRng);

        // Argon2id with the crate's fixed default parameters
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(self.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Hashed password in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();

        // Validate it's a valid PHC string
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;

        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash
    ///
    /// Argon2 uses constant-time comparison internally.
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
