//! Shared test fixtures and helper utilities.
//!
//! Provides pre-built JWT tokens, fixture paths, and helpers that sign
//! tokens through the library so the CLI can be checked against them.
#![allow(dead_code)]

use std::path::PathBuf;

use keyprobe::core::JsonObject;
use keyprobe::core::expiry::ExpiresIn;
use keyprobe::core::keys::KeyDescriptor;
use keyprobe::core::signer::{SignOptions, sign_token};

/// A well-known HS256-signed JWT.
///
/// Header: `{"alg":"HS256","typ":"JWT"}`
/// Payload: `{"sub":"1234567890","name":"Test User","iat":1516239022}`
pub const VALID_HS256_TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
     eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IlRlc3QgVXNlciIsImlhdCI6MTUxNjIzOTAyMn0.\
     SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";

/// A malformed token with only two parts (missing signature).
pub const MALFORMED_TOKEN_TWO_PARTS: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxMjM0NTY3ODkwIn0";

/// A completely invalid token string.
pub const INVALID_TOKEN: &str = "not-a-valid-jwt";

/// HMAC secret used to sign test tokens for verify tests.
pub const HMAC_TEST_SECRET: &str = "verify-test-secret-key";

pub const RSA_PRIVATE_JWK: &str = include_str!("../fixtures/rsa_private.jwk.json");
pub const RSA_PUBLIC_JWK: &str = include_str!("../fixtures/rsa_public.jwk.json");
pub const EC_P256_PRIVATE_JWK: &str = include_str!("../fixtures/ec_p256_private.jwk.json");

/// Absolute path of a file under `tests/fixtures/`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Same as [`fixture`], as a `String` for use in argument lists.
pub fn fixture_arg(name: &str) -> String {
    fixture(name).display().to_string()
}

/// Sign `claims` with `key` through the library.
pub fn sign(claims: &serde_json::Value, key: &KeyDescriptor, alg: &str, expires_in: i64) -> String {
    let payload: JsonObject = claims.as_object().cloned().unwrap();
    let options = SignOptions {
        algorithm: alg.to_string(),
        expires_in: ExpiresIn::from(expires_in),
    };
    sign_token(&payload, key, &options).into_result().unwrap()
}

/// An HS256 token under [`HMAC_TEST_SECRET`] valid for an hour.
pub fn hs256_token(claims: &serde_json::Value) -> String {
    sign(
        claims,
        &KeyDescriptor::from_secret(HMAC_TEST_SECRET.as_bytes()),
        "HS256",
        3600,
    )
}

/// An HS256 token under [`HMAC_TEST_SECRET`] that expired a minute ago.
pub fn expired_hs256_token() -> String {
    sign(
        &standard_claims(),
        &KeyDescriptor::from_secret(HMAC_TEST_SECRET.as_bytes()),
        "HS256",
        -60,
    )
}

/// An RS256 token signed with the RSA fixture key (header `kid` is
/// `rsa-key-1`).
pub fn rs256_token(claims: &serde_json::Value) -> String {
    let key = KeyDescriptor::from_json(RSA_PRIVATE_JWK).unwrap();
    sign(claims, &key, "RS256", 3600)
}

/// A JWKS document holding the RSA public fixture key.
pub fn rsa_jwks() -> String {
    let key: serde_json::Value = serde_json::from_str(RSA_PUBLIC_JWK).unwrap();
    serde_json::json!({ "keys": [key] }).to_string()
}

/// Standard test claims used across verify tests.
pub fn standard_claims() -> serde_json::Value {
    serde_json::json!({
        "sub": "1234567890",
        "name": "Test User",
        "iat": 1516239022
    })
}
