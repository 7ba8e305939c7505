//! Hashing for admin passwords, member PINs and submission PINs.
//!
//! New hashes are argon2id with a per-record salt, so a PIN can only be checked
//! by verifying against each candidate hash in turn. bcrypt hashes imported
//! from the previous backend still verify.
//!
//! Both algorithms are deliberately slow. Request handlers go through the
//! `*_blocking` variants, which run on actix's blocking thread pool.

use actix_web::web;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

pub fn hash_secret(secret: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("Failed to hash secret: {e}"))
}

fn is_bcrypt(stored_hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| stored_hash.starts_with(prefix))
}

/// A malformed stored hash never verifies.
pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    if is_bcrypt(stored_hash) {
        return bcrypt::verify(secret, stored_hash).unwrap_or(false);
    }
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn pool_error(e: actix_web::error::BlockingError) -> String {
    format!("Hashing task failed: {e}")
}

pub async fn hash_blocking(secret: String) -> Result<String, String> {
    web::block(move || hash_secret(&secret))
        .await
        .map_err(pool_error)?
}

pub async fn verify_blocking(secret: String, stored_hash: String) -> Result<bool, String> {
    web::block(move || verify_secret(&secret, &stored_hash))
        .await
        .map_err(pool_error)
}

/// Index of the first hash `secret` verifies against. Stops at the first hit.
pub async fn first_match_blocking(
    secret: String,
    hashes: Vec<String>,
) -> Result<Option<usize>, String> {
    web::block(move || hashes.iter().position(|h| verify_secret(&secret, h)))
        .await
        .map_err(pool_error)
}

/// Whether `secret` verifies against each hash, in input order.
pub async fn verify_each_blocking(secret: String, hashes: Vec<String>) -> Result<Vec<bool>, String> {
    web::block(move || hashes.iter().map(|h| verify_secret(&secret, h)).collect::<Vec<_>>())
        .await
        .map_err(pool_error)
}

/// PINs are exactly four ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}
