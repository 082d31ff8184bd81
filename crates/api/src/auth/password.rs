//! bcrypt password hashing and verification.
//!
//! Hashes use the modular crypt format, so cost and salt travel inside the
//! stored string.

/// Hash a plaintext password with the default bcrypt cost.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

/// Hash with an explicit cost. Tests use a low cost to stay fast.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// Returns `Ok(true)` when the password matches, `Ok(false)` when it does not.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}
