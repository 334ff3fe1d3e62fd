//! Domain error types for keyprobe.
//!
//! All engine errors are defined here using `thiserror`. Engine entry
//! points carry them inside outcome structs rather than returning them
//! as faults; the CLI boundary converts them to user-facing messages.

use thiserror::Error;

/// Coarse classification of a [`KeyprobeError`].
///
/// Callers that only care about *why* trust failed (bad input, no key,
/// bad signature, rejected claim) can branch on this instead of on the
/// individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed token, Base64, JSON, or certificate text.
    Format,
    /// The remote key set could not be fetched or read.
    KeyFetch,
    /// No key in the key set matched the token.
    KeyNotFound,
    /// The key material does not fit the requested algorithm.
    KeyImport,
    /// The signature did not verify.
    Signature,
    /// The signature verified but a claim check failed.
    Claim,
    /// The caller supplied unusable input (missing token, bad env var, ...).
    Input,
}

/// Errors that can occur during token, key, and certificate operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyprobeError {
    /// The token is not three dot-separated segments.
    #[error("Invalid token format")]
    InvalidTokenFormat,

    /// Failed to decode a base64url-encoded token segment.
    #[error("failed to decode {segment}: invalid base64url encoding")]
    Base64DecodeError {
        /// `header` or `payload`.
        segment: String,
    },

    /// A decoded segment is not a JSON object.
    #[error("failed to parse {segment} as JSON: {reason}")]
    JsonParseError {
        /// `header` or `payload`.
        segment: String,
        /// Description of the parsing failure.
        reason: String,
    },

    /// Text could not be represented as a byte-level binary string.
    #[error("Invalid input for Base64 encoding: {reason}")]
    Base64Encoding {
        /// Description of the offending input.
        reason: String,
    },

    /// Input is not valid Base64 / Base64-URL.
    #[error("Invalid Base64 string: {reason}")]
    InvalidBase64 {
        /// Description of the decoding failure.
        reason: String,
    },

    /// Key, key set, or payload JSON supplied by the caller is unusable.
    #[error("invalid {what}: {reason}")]
    InvalidKeyMaterial {
        /// What was being parsed (e.g., "JWK", "JWKS", "payload").
        what: String,
        /// Description of the parsing failure.
        reason: String,
    },

    /// Zero or several key sources were supplied for one request.
    #[error("invalid key source: {reason}")]
    InvalidKeySource {
        /// Description of the conflict.
        reason: String,
    },

    /// Failed to fetch a JWKS from the remote endpoint.
    #[error("failed to fetch JWKS from '{url}': {reason}")]
    KeyFetch {
        /// The (sanitized) JWKS endpoint URL.
        url: String,
        /// Sanitized cause.
        reason: String,
    },

    /// No key in the key set carries the token's key id.
    #[error("no matching key found in JWKS for kid '{kid}'")]
    KeyNotFound {
        /// The header `kid`, sanitized for display.
        kid: String,
    },

    /// The token header has no `kid`, so no key can be selected from a set.
    #[error("token header has no 'kid'; cannot select a key from the key set")]
    MissingKeyId,

    /// The algorithm name is unknown, or is `none`.
    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// The name as given.
        algorithm: String,
    },

    /// Key material could not be imported for the requested algorithm.
    #[error("failed to import key: {reason}")]
    KeyImport {
        /// Description of the import failure.
        reason: String,
    },

    /// Building or signing the token failed.
    #[error("failed to sign token: {reason}")]
    Signing {
        /// Description of the signing failure.
        reason: String,
    },

    /// The token header's key id differs from the expected one.
    #[error("key id mismatch: expected '{expected}', token has {actual}")]
    KeyIdMismatch {
        /// The key id the caller expected.
        expected: String,
        /// The key id found in the header, already quoted, or "no kid".
        actual: String,
    },

    /// The signature did not verify, or `jsonwebtoken` rejected the token.
    #[error("signature validation failed: {reason}")]
    SignatureInvalid {
        /// Sanitized cause.
        reason: String,
    },

    /// The token's `exp` is in the past.
    #[error("Token has expired")]
    TokenExpired,

    /// The token's `nbf` is in the future.
    #[error("Token is not yet valid")]
    TokenNotYetValid,

    /// A registered claim did not match the caller's expectation.
    #[error("{claim} claim validation failed: {reason}")]
    ClaimMismatch {
        /// The claim that failed (e.g., "iss", "aud").
        claim: String,
        /// Description of the mismatch.
        reason: String,
    },

    /// The certificate text is neither PEM nor Base64 DER.
    #[error("Invalid certificate format: {reason}")]
    InvalidCertificate {
        /// Description of the failure.
        reason: String,
    },

    /// Failed to read an input file.
    #[error("failed to read file '{path}': {reason}")]
    FileError {
        /// Path to the file.
        path: String,
        /// Description of the read failure.
        reason: String,
    },

    /// Argument, `--token-env`, and stdin were all empty.
    #[error("no token provided: pass a token as an argument, via --token-env, or through stdin")]
    NoTokenProvided,

    /// No input was provided to a command that needs some.
    #[error("no input provided: pass {what} as an argument, via a file option, or through stdin")]
    NoInputProvided {
        /// What the command expected.
        what: String,
    },

    /// The variable is unset or not valid Unicode.
    #[error("environment variable '{name}' is not set")]
    EnvVarNotFound {
        /// Variable name.
        name: String,
    },

    /// The environment variable name cannot be looked up safely.
    #[error("invalid environment variable name '{name}'")]
    InvalidEnvVarName {
        /// The rejected name.
        name: String,
    },
}

impl KeyprobeError {
    /// Map this error onto the engine's error taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTokenFormat
            | Self::Base64DecodeError { .. }
            | Self::JsonParseError { .. }
            | Self::Base64Encoding { .. }
            | Self::InvalidBase64 { .. }
            | Self::InvalidCertificate { .. } => ErrorCategory::Format,
            Self::KeyFetch { .. } => ErrorCategory::KeyFetch,
            Self::KeyNotFound { .. } | Self::MissingKeyId => ErrorCategory::KeyNotFound,
            Self::UnsupportedAlgorithm { .. }
            | Self::KeyImport { .. }
            | Self::InvalidKeyMaterial { .. } => ErrorCategory::KeyImport,
            Self::Signing { .. } | Self::SignatureInvalid { .. } => ErrorCategory::Signature,
            Self::KeyIdMismatch { .. }
            | Self::TokenExpired
            | Self::TokenNotYetValid
            | Self::ClaimMismatch { .. } => ErrorCategory::Claim,
            Self::InvalidKeySource { .. }
            | Self::FileError { .. }
            | Self::NoTokenProvided
            | Self::NoInputProvided { .. }
            | Self::EnvVarNotFound { .. }
            | Self::InvalidEnvVarName { .. } => ErrorCategory::Input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_token_format_display() {
        let err = KeyprobeError::InvalidTokenFormat;
        assert_eq!(err.to_string(), "Invalid token format");
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_base64_decode_error_display_includes_segment() {
        let err = KeyprobeError::Base64DecodeError {
            segment: "header".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to decode header: invalid base64url encoding"
        );
    }

    #[test]
    fn test_json_parse_error_display_includes_segment_and_reason() {
        let err = KeyprobeError::JsonParseError {
            segment: "payload".to_string(),
            reason: "unexpected EOF".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse payload as JSON: unexpected EOF"
        );
    }

    #[test]
    fn test_key_fetch_error_display() {
        let err = KeyprobeError::KeyFetch {
            url: "https://auth.example.com/.well-known/jwks.json".to_string(),
            reason: "connection timed out".to_string(),
        };
        assert!(err.to_string().contains("auth.example.com"));
        assert!(err.to_string().contains("connection timed out"));
        assert_eq!(err.category(), ErrorCategory::KeyFetch);
    }

    #[test]
    fn test_key_not_found_display() {
        let err = KeyprobeError::KeyNotFound {
            kid: "abc123".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no matching key found in JWKS for kid 'abc123'"
        );
        assert_eq!(err.category(), ErrorCategory::KeyNotFound);
        assert_eq!(
            KeyprobeError::MissingKeyId.category(),
            ErrorCategory::KeyNotFound
        );
    }

    #[test]
    fn test_token_expired_mentions_expiration() {
        let err = KeyprobeError::TokenExpired;
        assert_eq!(err.to_string(), "Token has expired");
        assert_eq!(err.category(), ErrorCategory::Claim);
    }

    #[test]
    fn test_unsupported_algorithm_is_import_failure() {
        let err = KeyprobeError::UnsupportedAlgorithm {
            algorithm: "none".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported algorithm: none");
        assert_eq!(err.category(), ErrorCategory::KeyImport);
    }

    #[test]
    fn test_signing_failure_display() {
        let err = KeyprobeError::Signing {
            reason: "InvalidRsaKey".to_string(),
        };
        assert_eq!(err.to_string(), "failed to sign token: InvalidRsaKey");
        assert_eq!(err.category(), ErrorCategory::Signature);
    }

    #[test]
    fn test_key_id_mismatch_display() {
        let err = KeyprobeError::KeyIdMismatch {
            expected: "k1".to_string(),
            actual: "'k2'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "key id mismatch: expected 'k1', token has 'k2'"
        );
    }

    #[test]
    fn test_no_token_provided_display() {
        let err = KeyprobeError::NoTokenProvided;
        assert!(err.to_string().contains("no token provided"));
        assert!(err.to_string().contains("--token-env"));
        assert!(err.to_string().contains("stdin"));
    }

    #[test]
    fn test_env_var_not_found_display() {
        let err = KeyprobeError::EnvVarNotFound {
            name: "JWT_TOKEN".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "environment variable 'JWT_TOKEN' is not set"
        );
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeyprobeError>();
    }
}
