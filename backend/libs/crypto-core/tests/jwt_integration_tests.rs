/// Integration tests for crypto-core token and password helpers
///
/// Exercises the public API the blog service relies on:
/// - token pair issuing and typed validation
/// - expiry driven by configured lifetimes
/// - password hashing round trips
use crypto_core::{hash_password, verify_password, JwtKeys, TokenTtl, TokenType};

// FOR TESTING ONLY - never use these keys in production
const TEST_PRIVATE_KEY: &str = include_str!("../testdata/test_private_key.pem");
const TEST_PUBLIC_KEY: &str = include_str!("../testdata/test_public_key.pem");

fn keys() -> JwtKeys {
    JwtKeys::from_rsa_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY).expect("test keys should parse")
}

#[test]
fn test_token_pair_round_trip() {
    let keys = keys();
    let pair = keys.generate_token_pair(17, "carol").expect("pair");

    let access = keys
        .validate_access_token(&pair.access_token)
        .expect("access token validates");
    assert_eq!(access.user_id().unwrap(), 17);
    assert_eq!(access.username, "carol");
    assert_eq!(access.token_type, TokenType::Access);

    let refresh = keys
        .validate_refresh_token(&pair.refresh_token)
        .expect("refresh token validates");
    assert_eq!(refresh.user_id().unwrap(), 17);
    assert_eq!(refresh.token_type, TokenType::Refresh);
}

#[test]
fn test_access_token_cannot_refresh() {
    let keys = keys();
    let access = keys.generate_access_token(1, "alice").unwrap();

    let err = keys.validate_refresh_token(&access).unwrap_err();
    assert!(err.to_string().contains("expected Refresh token"));
}

#[test]
fn test_expired_lifetime_is_rejected() {
    let keys = keys().with_ttl(TokenTtl {
        access_secs: -3600,
        refresh_secs: -3600,
    });
    let pair = keys.generate_token_pair(1, "alice").unwrap();

    assert!(keys.validate_access_token(&pair.access_token).is_err());
    assert!(keys.validate_refresh_token(&pair.refresh_token).is_err());
}

#[test]
fn test_every_token_has_a_distinct_id() {
    let keys = keys();
    let first = keys
        .validate_access_token(&keys.generate_access_token(1, "alice").unwrap())
        .unwrap();
    let second = keys
        .validate_access_token(&keys.generate_access_token(1, "alice").unwrap())
        .unwrap();

    assert_ne!(first.token_id().unwrap(), second.token_id().unwrap());
}

#[test]
fn test_garbage_public_key_is_rejected() {
    assert!(JwtKeys::validation_only("not a pem").is_err());
    assert!(JwtKeys::from_rsa_pem(TEST_PRIVATE_KEY, "not a pem").is_err());
}

#[test]
fn test_password_hash_round_trip() {
    let hash = hash_password("correct horse battery").expect("hash");

    assert_ne!(hash, "correct horse battery");
    assert!(verify_password("correct horse battery", &hash).unwrap());
    assert!(!verify_password("wrong horse", &hash).unwrap());
}
