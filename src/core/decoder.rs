//! Compact token structure decoding.
//!
//! Splits a raw token into its three parts (header, payload, signature),
//! base64url-decodes the first two, and parses them as JSON objects.
//! Nothing here verifies the signature.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::core::JsonObject;
use crate::error::KeyprobeError;

/// The decoded parts of a structurally valid token.
///
/// `Debug` shows the header only; payload and signature are redacted.
#[derive(Clone)]
pub struct DecodedToken {
    /// The parsed header (typically contains `alg`, `typ`, `kid`).
    pub header: JsonObject,
    /// The parsed payload (claims).
    pub payload: JsonObject,
    /// Signature segment, still base64url-encoded.
    pub signature: String,
}

impl DecodedToken {
    /// The header's `alg` value, if it is a string.
    pub fn alg(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    /// The header's `kid` value, if it is a string.
    pub fn kid(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }
}

impl fmt::Debug for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedToken")
            .field("header", &self.header)
            .field("payload", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

/// Everything that could be understood about a token, plus the first
/// problem encountered.
///
/// Decoding never fails outright: a malformed token yields an outcome
/// with `error` set and whatever parts did decode still populated.
#[derive(Clone, Default)]
pub struct DecodeOutcome {
    /// Parsed header, if segment 0 decoded.
    pub header: Option<JsonObject>,
    /// Parsed payload, if segment 1 decoded.
    pub payload: Option<JsonObject>,
    /// Raw signature segment, if the token had three segments.
    pub signature: Option<String>,
    /// Why decoding stopped, if it did.
    pub error: Option<KeyprobeError>,
}

impl DecodeOutcome {
    fn failed(error: KeyprobeError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Whether both header and payload decoded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a strict result.
    ///
    /// # Errors
    ///
    /// Returns the recorded decode error, if any.
    pub fn into_token(self) -> Result<DecodedToken, KeyprobeError> {
        match (self.error, self.header, self.payload, self.signature) {
            (Some(err), ..) => Err(err),
            (None, Some(header), Some(payload), Some(signature)) => Ok(DecodedToken {
                header,
                payload,
                signature,
            }),
            _ => Err(KeyprobeError::InvalidTokenFormat),
        }
    }
}

impl fmt::Debug for DecodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOutcome")
            .field("header", &self.header)
            .field("payload", &self.payload.as_ref().map(|_| "[REDACTED]"))
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("error", &self.error)
            .finish()
    }
}

/// Decode a raw token string into its constituent parts.
///
/// Splits the token on `.` separators, base64url-decodes the header
/// and payload segments, and parses them as JSON objects. The signature
/// is kept as its raw base64url-encoded string.
///
/// A token with anything other than three segments yields
/// [`KeyprobeError::InvalidTokenFormat`] and no parts. A segment that
/// fails to decode or parse is reported in `error`; a header that did
/// decode is still returned alongside a broken payload.
pub fn decode_token(token: &str) -> DecodeOutcome {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return DecodeOutcome::failed(KeyprobeError::InvalidTokenFormat);
    }

    let header = match decode_segment(parts[0], "header") {
        Ok(header) => header,
        Err(err) => return DecodeOutcome::failed(err),
    };

    match decode_segment(parts[1], "payload") {
        Ok(payload) => DecodeOutcome {
            header: Some(header),
            payload: Some(payload),
            signature: Some(parts[2].to_string()),
            error: None,
        },
        Err(err) => DecodeOutcome {
            header: Some(header),
            payload: None,
            signature: Some(parts[2].to_string()),
            error: Some(err),
        },
    }
}

/// Base64url-decode a segment and parse it as a JSON object.
fn decode_segment(encoded: &str, segment_name: &str) -> Result<JsonObject, KeyprobeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| KeyprobeError::Base64DecodeError {
            segment: segment_name.to_string(),
        })?;

    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| KeyprobeError::JsonParseError {
            segment: segment_name.to_string(),
            reason: e.to_string(),
        })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(KeyprobeError::JsonParseError {
            segment: segment_name.to_string(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
