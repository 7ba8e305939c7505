//! Access-token and secret hashing checks.
//!
//! Tokens are minted locally with the same HS256 secret the server uses, so no
//! running server or database is needed.
//!
//! Run with: `cargo test --test auth_test`
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use formfolio_backend::auth::jwt::{Claims, JwtKeys};
use formfolio_backend::auth::middleware::AuthContext;
use formfolio_backend::auth::password::{hash_secret, is_valid_pin, verify_secret};
use formfolio_backend::error::ApiError;
use formfolio_backend::models::users::Role;

/// A fake secret for testing, never the deployed one.
const TEST_SECRET: &str = "test-secret-at-least-256-bits-long-for-hs256-xxxxxxx";

fn keys() -> JwtKeys {
    JwtKeys::new(TEST_SECRET, Duration::from_secs(900))
}

#[test]
fn test_issued_token_round_trips_identity() {
    let user_id = Uuid::new_v4();
    let token = keys().issue(user_id, Role::SuperAdmin).unwrap();

    let claims = keys().validate(&token).expect("Token should be valid");

    assert_eq!(claims.user_id().unwrap(), user_id);
    assert_eq!(claims.role, Role::SuperAdmin);
    assert_eq!(claims.exp - claims.iat, 900);
}

#[test]
fn test_expired_token_is_rejected() {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: Role::Admin,
        exp: now - 300, // well past the 60s default leeway
        iat: now - 1200,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let result = keys().validate(&token);
    assert!(result.unwrap_err().contains("ExpiredSignature"));
}

#[test]
fn test_wrong_secret_is_rejected() {
    let token = keys().issue(Uuid::new_v4(), Role::Admin).unwrap();

    let other = JwtKeys::new(
        "completely-wrong-secret-xxxxxxxxxxxxxxxxxxx",
        Duration::from_secs(900),
    );
    let result = other.validate(&token);
    assert!(result.unwrap_err().contains("InvalidSignature"));
}

#[test]
fn test_garbage_token_is_rejected() {
    assert!(keys().validate("not.a.valid.jwt").is_err());
}

#[test]
fn test_non_uuid_subject_is_reported() {
    let claims = Claims {
        sub: "not-a-uuid".to_string(),
        role: Role::Admin,
        exp: 0,
        iat: 0,
    };
    assert!(claims.user_id().is_err());
}

#[test]
fn test_role_gates() {
    let admin = AuthContext {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    };
    let super_admin = AuthContext {
        role: Role::SuperAdmin,
        ..admin
    };

    assert!(admin.require_admin().is_ok());
    assert!(matches!(
        admin.require_super_admin(),
        Err(ApiError::Forbidden(_))
    ));
    assert!(super_admin.require_admin().is_ok());
    assert!(super_admin.require_super_admin().is_ok());
}

#[test]
fn test_roles_serialize_upper_case() {
    assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SUPER_ADMIN\"");
    assert_eq!(
        serde_json::from_str::<Role>("\"ADMIN\"").unwrap(),
        Role::Admin
    );
}

#[test]
fn test_secret_hash_verifies_only_the_original() {
    let hash = hash_secret("1234").unwrap();

    assert_ne!(hash, "1234");
    assert!(verify_secret("1234", &hash));
    assert!(!verify_secret("4321", &hash));
}

#[test]
fn test_same_secret_hashes_differently() {
    let a = hash_secret("hunter2").unwrap();
    let b = hash_secret("hunter2").unwrap();

    assert_ne!(a, b);
    assert!(verify_secret("hunter2", &a));
    assert!(verify_secret("hunter2", &b));
}

#[test]
fn test_legacy_bcrypt_hash_verifies() {
    // Rows carried over from the previous backend hold `$2a$`/`$2b$` hashes.
    let legacy = bcrypt::hash("1234", 4).unwrap();

    assert!(legacy.starts_with("$2"));
    assert!(verify_secret("1234", &legacy));
    assert!(!verify_secret("4321", &legacy));
}

#[test]
fn test_malformed_hash_never_verifies() {
    assert!(!verify_secret("1234", "plain-text"));
    assert!(!verify_secret("1234", ""));
}

#[test]
fn test_pin_format() {
    assert!(is_valid_pin("0000"));
    assert!(is_valid_pin("1234"));
    assert!(!is_valid_pin("123"));
    assert!(!is_valid_pin("12345"));
    assert!(!is_valid_pin("12a4"));
    assert!(!is_valid_pin(" 123"));
    assert!(!is_valid_pin("١٢٣٤"));
}

#[test]
fn test_refresh_tokens_are_namespaced() {
    assert_eq!(
        formfolio_backend::sessions::keys::refresh_token("abc"),
        "refresh:abc"
    );
}
