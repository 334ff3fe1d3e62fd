//! Token signing.
//!
//! Builds a compact signed token from a JSON payload and a private key
//! descriptor. The `exp` claim is always derived from the expiry policy
//! and replaces any `exp` already in the payload.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Header, encode};
use serde_json::Value;
use tracing::debug;

use crate::core::JsonObject;
use crate::core::expiry::ExpiresIn;
use crate::core::keys::{KeyDescriptor, parse_algorithm};
use crate::error::KeyprobeError;

/// Algorithm used when none is specified.
pub const DEFAULT_SIGNING_ALGORITHM: &str = "RS256";

/// Signing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    /// Algorithm name, e.g. `RS256`, `ES256`, `HS256`, `EdDSA`.
    pub algorithm: String,
    /// Token lifetime from the moment of signing.
    pub expires_in: ExpiresIn,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            algorithm: DEFAULT_SIGNING_ALGORITHM.to_string(),
            expires_in: ExpiresIn::default(),
        }
    }
}

/// The signed token, or the reason signing failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOutcome {
    /// The compact token; empty when `error` is set.
    pub token: String,
    /// Why signing failed, if it did.
    pub error: Option<KeyprobeError>,
}

impl SignOutcome {
    /// Convert into a strict result.
    ///
    /// # Errors
    ///
    /// Returns the recorded signing error, if any.
    pub fn into_result(self) -> Result<String, KeyprobeError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.token),
        }
    }
}

/// Sign `payload` with `key` using the current time.
pub fn sign_token(payload: &JsonObject, key: &KeyDescriptor, options: &SignOptions) -> SignOutcome {
    sign_token_at(payload, key, options, Utc::now())
}

/// Sign `payload` with `key` as if the current time were `now`.
pub fn sign_token_at(
    payload: &JsonObject,
    key: &KeyDescriptor,
    options: &SignOptions,
    now: DateTime<Utc>,
) -> SignOutcome {
    match try_sign(payload, key, options, now) {
        Ok(token) => SignOutcome { token, error: None },
        Err(err) => {
            debug!(error = %err, "signing failed");
            SignOutcome {
                token: String::new(),
                error: Some(err),
            }
        }
    }
}

fn try_sign(
    payload: &JsonObject,
    key: &KeyDescriptor,
    options: &SignOptions,
    now: DateTime<Utc>,
) -> Result<String, KeyprobeError> {
    let algorithm = parse_algorithm(&options.algorithm)?;
    if !key.is_private() {
        return Err(KeyprobeError::KeyImport {
            reason: "a public key cannot sign tokens".to_string(),
        });
    }
    let encoding_key = key.encoding_key(algorithm)?;

    let mut claims = payload.clone();
    let exp = options.expires_in.expiry_from(now);
    if let Some(previous) = claims.insert("exp".to_string(), Value::from(exp)) {
        debug!(%previous, exp, "replacing caller-supplied exp");
    }

    let mut header = Header::new(algorithm);
    header.kid = key.kid.clone();

    encode(&header, &claims, &encoding_key).map_err(|e| KeyprobeError::Signing {
        reason: crate::core::sanitize_jwt_error(e.kind()),
    })
}
