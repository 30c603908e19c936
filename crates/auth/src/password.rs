//! One-way password comparison.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Compares a plaintext password with a stored hash.
pub trait PasswordComparator: Send + Sync {
    fn matches(&self, password: &str, hash: &str) -> bool;
}

/// Argon2 PHC-string comparator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Comparator;

impl PasswordComparator for Argon2Comparator {
    fn matches(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Hash a password into a PHC string for storage.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
