//! Base64 and Base64-URL text codecs.
//!
//! Text is treated as a byte-level "binary string": every char must fit
//! in a single byte (U+0000..=U+00FF) and maps to exactly that byte.
//! Decoding maps bytes back to chars the same way, so any Latin-1 text
//! survives a round trip through either variant.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::KeyprobeError;

/// Standard alphabet, padding optional, non-zero trailing bits tolerated.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// URL-safe alphabet that accepts both padded and unpadded input.
const URL_SAFE_INDIFFERENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode text to standard, padded Base64.
///
/// # Errors
///
/// Returns [`KeyprobeError::Base64Encoding`] if the text contains a char
/// above U+00FF.
pub fn encode_base64(input: &str) -> Result<String, KeyprobeError> {
    let bytes = binary_string_bytes(input)?;
    Ok(STANDARD.encode(bytes))
}

/// Decode standard Base64 back to text.
///
/// ASCII whitespace is ignored and padding may be omitted, but the
/// alphabet must be the standard one.
///
/// # Errors
///
/// Returns [`KeyprobeError::InvalidBase64`] on a bad alphabet or an
/// impossible length.
pub fn decode_base64(input: &str) -> Result<String, KeyprobeError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = FORGIVING
        .decode(compact.as_bytes())
        .map_err(|e| KeyprobeError::InvalidBase64 {
            reason: e.to_string(),
        })?;
    Ok(bytes.into_iter().map(char::from).collect())
}

/// Encode text to Base64-URL without padding.
///
/// # Errors
///
/// Same as [`encode_base64`].
pub fn encode_base64_url(input: &str) -> Result<String, KeyprobeError> {
    let standard = encode_base64(input)?;
    Ok(standard
        .replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string())
}

/// Decode Base64-URL text, restoring stripped padding first.
///
/// # Errors
///
/// Returns [`KeyprobeError::InvalidBase64`] if the length mod 4 is 1
/// (no valid encoding has that shape) or if the restored standard form
/// does not decode.
pub fn decode_base64_url(input: &str) -> Result<String, KeyprobeError> {
    let mut normalized = input.replace('-', "+").replace('_', "/");
    match normalized.len() % 4 {
        0 => {}
        1 => {
            return Err(KeyprobeError::InvalidBase64 {
                reason: "Base64Url length cannot be 1 more than a multiple of 4".to_string(),
            });
        }
        rem => normalized.push_str(&"=".repeat(4 - rem)),
    }
    decode_base64(&normalized)
}

/// Encode raw bytes as unpadded Base64-URL (JWK / JWS segment form).
pub fn encode_base64_url_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a Base64-URL value, padded or not, to raw bytes.
///
/// # Errors
///
/// Returns [`KeyprobeError::InvalidBase64`] if the value does not decode.
pub fn decode_base64_url_bytes(input: &str) -> Result<Vec<u8>, KeyprobeError> {
    URL_SAFE_INDIFFERENT
        .decode(input)
        .map_err(|e| KeyprobeError::InvalidBase64 {
            reason: e.to_string(),
        })
}

/// Convert text to bytes under the binary-string convention.
fn binary_string_bytes(input: &str) -> Result<Vec<u8>, KeyprobeError> {
    input
        .chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| KeyprobeError::Base64Encoding {
                reason: format!("character U+{:04X} is outside the byte range", u32::from(c)),
            })
        })
        .collect()
}
