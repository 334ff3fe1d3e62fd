//! Core business logic for token, key, and certificate operations.
//!
//! This module contains the engine, separated from CLI concerns.
//! All types and functions here are testable without the CLI layer.

pub mod certificate;
pub mod codec;
pub mod decoder;
pub mod expiry;
pub mod jwks;
pub mod keys;
pub mod signer;
pub mod verifier;

use jsonwebtoken::errors::ErrorKind;

/// An insertion-ordered JSON object, as found in token headers, token
/// payloads, and key descriptors.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Sanitize a `jsonwebtoken` error kind into a user-facing reason.
///
/// Raw library messages can include key or token fragments; only fixed
/// strings are returned.
pub fn sanitize_jwt_error(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::InvalidToken => "invalid token structure",
        ErrorKind::InvalidSignature => "signature does not match",
        ErrorKind::InvalidAlgorithm => "algorithm mismatch between token and key",
        ErrorKind::InvalidAlgorithmName => "unknown algorithm name",
        ErrorKind::MissingAlgorithm => "key does not declare an algorithm",
        ErrorKind::InvalidKeyFormat => "key material has an invalid format",
        ErrorKind::InvalidEcdsaKey => "invalid ECDSA key",
        ErrorKind::InvalidRsaKey(_) => "invalid RSA key",
        ErrorKind::RsaFailedSigning => "RSA signing failed",
        ErrorKind::Base64(_) => "invalid base64url encoding",
        ErrorKind::Json(_) => "invalid JSON in token",
        ErrorKind::Utf8(_) => "invalid UTF-8 in token",
        ErrorKind::Crypto(_) => "cryptographic operation failed",
        _ => "unexpected validation error",
    }
    .to_string()
}
