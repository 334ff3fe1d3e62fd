//! Certificate inspection.
//!
//! Two decoders share the [`CertificateDecoder`] trait:
//!
//! - [`HeuristicExtractor`] pulls fields out of the input text with
//!   patterns for the markers `openssl x509 -text` prints. It only needs
//!   the envelope (PEM or Base64 DER) to be well formed; any field it
//!   cannot find is reported as [`NOT_AVAILABLE`].
//! - [`X509Decoder`] parses the DER structure and fails on anything that
//!   is not a valid certificate.
//!
//! [`decode_certificate`] uses the heuristic extractor.

use std::fmt;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat};
use const_oid::ObjectIdentifier;
use const_oid::db::{DB, rfc5912, rfc8410};
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use x509_cert::Certificate;
use x509_cert::der::Decode;
use x509_cert::der::asn1::BitString;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::KeyprobeError;

/// Placeholder for a field that could not be determined.
pub const NOT_AVAILABLE: &str = "Not available";

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";
const PEM_LINE_WIDTH: usize = 64;

/// How the certificate was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CertificateFormat {
    /// Armored with `BEGIN/END CERTIFICATE` lines.
    #[serde(rename = "PEM")]
    Pem,
    /// Bare Base64 of the DER encoding.
    #[serde(rename = "DER (Base64)")]
    DerBase64,
}

impl fmt::Display for CertificateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pem => "PEM",
            Self::DerBase64 => "DER (Base64)",
        })
    }
}

/// One certificate extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub name: String,
    pub value: String,
    pub critical: bool,
}

/// Subject public key summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyInfo {
    pub algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_size: Option<u32>,
}

/// A structured snapshot of a certificate.
///
/// Text fields that could not be determined hold [`NOT_AVAILABLE`], so
/// the shape is the same for every decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateView {
    pub format: CertificateFormat,
    /// Length of the Base64 body, whitespace excluded.
    pub encoded_length: usize,
    /// The certificate re-armored as PEM with 64-character lines.
    pub pem: String,
    pub subject: String,
    pub issuer: String,
    pub serial_number: String,
    pub version: String,
    pub valid_from: String,
    pub valid_to: String,
    /// SHA-256 fingerprint as colon-separated uppercase hex.
    pub fingerprint: String,
    pub extensions: Vec<Extension>,
    pub public_key_info: PublicKeyInfo,
}

/// Result of [`decode_certificate`]: a view or the reason there is none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateOutcome {
    pub decoded: Option<CertificateView>,
    pub error: Option<KeyprobeError>,
}

/// A strategy for turning certificate text into a [`CertificateView`].
pub trait CertificateDecoder {
    /// Decode `text`, which is PEM or Base64 DER.
    ///
    /// # Errors
    ///
    /// Returns [`KeyprobeError::InvalidCertificate`] if the input cannot
    /// be decoded at the level of guarantee the implementation offers.
    fn decode(&self, text: &str) -> Result<CertificateView, KeyprobeError>;
}

/// Decode `text` with the heuristic extractor.
pub fn decode_certificate(text: &str) -> CertificateOutcome {
    decode_with(&HeuristicExtractor, text)
}

/// Decode `text` with the given decoder, folding the result into an
/// outcome.
pub fn decode_with(decoder: &dyn CertificateDecoder, text: &str) -> CertificateOutcome {
    match decoder.decode(text) {
        Ok(view) => CertificateOutcome {
            decoded: Some(view),
            error: None,
        },
        Err(err) => {
            debug!(error = %err, "certificate decode failed");
            CertificateOutcome {
                decoded: None,
                error: Some(err),
            }
        }
    }
}

/// The DER bytes behind some certificate text, plus how it was wrapped.
struct Envelope {
    format: CertificateFormat,
    body: String,
    der: Vec<u8>,
}

impl Envelope {
    fn parse(text: &str) -> Result<Self, KeyprobeError> {
        if text.trim().is_empty() {
            return Err(KeyprobeError::InvalidCertificate {
                reason: "input is empty".to_string(),
            });
        }

        let (format, raw_body) = match text.find(PEM_BEGIN) {
            Some(start) => {
                let after_begin = &text[start + PEM_BEGIN.len()..];
                let body = match after_begin.find(PEM_END) {
                    Some(end) => &after_begin[..end],
                    None => after_begin,
                };
                (CertificateFormat::Pem, body)
            }
            None => (CertificateFormat::DerBase64, text),
        };

        let body: String = raw_body.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD
            .decode(body.as_bytes())
            .map_err(|_| KeyprobeError::InvalidCertificate {
                reason: match format {
                    CertificateFormat::Pem => "PEM body is not valid Base64".to_string(),
                    CertificateFormat::DerBase64 => {
                        "input is neither PEM nor Base64-encoded DER".to_string()
                    }
                },
            })?;

        if der.is_empty() {
            return Err(KeyprobeError::InvalidCertificate {
                reason: "certificate body is empty".to_string(),
            });
        }

        Ok(Self { format, body, der })
    }

    fn pem(&self) -> String {
        let mut pem = String::with_capacity(self.body.len() + self.body.len() / PEM_LINE_WIDTH + 64);
        pem.push_str(PEM_BEGIN);
        pem.push('\n');
        // The body is ASCII, so byte chunks fall on char boundaries.
        for line in self.body.as_bytes().chunks(PEM_LINE_WIDTH) {
            pem.push_str(&String::from_utf8_lossy(line));
            pem.push('\n');
        }
        pem.push_str(PEM_END);
        pem.push('\n');
        pem
    }

    fn fingerprint(&self) -> String {
        colon_hex(&Sha256::digest(&self.der))
    }
}

/// Pattern-based field extraction over the certificate text.
///
/// Works on certificates pasted together with their
/// `openssl x509 -text -fingerprint` dump. A bare PEM or DER yields a
/// view whose descriptive fields are all [`NOT_AVAILABLE`]. Without a
/// `SHA256 Fingerprint=` line the fingerprint is computed from the bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

static SUBJECT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*subject[ \t]*=[ \t]*([^\r\n]+)").unwrap());
static SUBJECT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Subject:[ \t]*([^\r\n]+)").unwrap());
static ISSUER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*issuer[ \t]*=[ \t]*([^\r\n]+)").unwrap());
static ISSUER_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Issuer:[ \t]*([^\r\n]+)").unwrap());
static NOT_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Not Before[ \t]*:[ \t]*([^\r\n]+)").unwrap());
static NOT_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Not After[ \t]*:[ \t]*([^\r\n]+)").unwrap());
static SERIAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Serial Number:[ \t]*(?:\r?\n[ \t]*)?(\S[^\r\n]*)").unwrap());
static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Version:[ \t]*([^\r\n]+)").unwrap());
static KEY_ALGORITHM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Public Key Algorithm:[ \t]*([^\r\n]+)").unwrap());
static KEY_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Public-Key:[ \t]*\((\d+) bit\)").unwrap());
static FINGERPRINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)SHA-?256 Fingerprint=([0-9A-F:]+)").unwrap());
static EXTENSION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*X509v3 ([^:\r\n]+):[ \t]*(critical)?[ \t]*$").unwrap());

fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    let captures = regex.captures(text)?;
    let value = captures.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn or_not_available(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Collect `X509v3 <Name>: [critical]` headings and the line after each.
fn extract_extensions(text: &str) -> Vec<Extension> {
    let heading = &*EXTENSION_HEADING;
    let lines: Vec<&str> = text.lines().collect();
    let mut extensions = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let Some(captures) = heading.captures(line) else {
            continue;
        };
        let name = captures.get(1).map_or("", |m| m.as_str()).trim();
        if name.eq_ignore_ascii_case("extensions") {
            continue;
        }
        let value = lines
            .get(index + 1)
            .map(|next| next.trim())
            .filter(|next| !heading.is_match(next) && !next.is_empty())
            .unwrap_or_default();
        extensions.push(Extension {
            name: name.to_string(),
            value: value.to_string(),
            critical: captures.get(2).is_some(),
        });
    }
    extensions
}

impl CertificateDecoder for HeuristicExtractor {
    fn decode(&self, text: &str) -> Result<CertificateView, KeyprobeError> {
        let envelope = Envelope::parse(text)?;

        let subject = first_capture(&SUBJECT_LINE, text).or_else(|| first_capture(&SUBJECT_FIELD, text));
        let issuer = first_capture(&ISSUER_LINE, text).or_else(|| first_capture(&ISSUER_FIELD, text));
        let fingerprint = first_capture(&FINGERPRINT, text)
            .map(|fp| fp.to_ascii_uppercase())
            .unwrap_or_else(|| envelope.fingerprint());

        Ok(CertificateView {
            format: envelope.format,
            encoded_length: envelope.body.len(),
            pem: envelope.pem(),
            subject: or_not_available(subject),
            issuer: or_not_available(issuer),
            serial_number: or_not_available(first_capture(&SERIAL_NUMBER, text)),
            version: or_not_available(first_capture(&VERSION, text)),
            valid_from: or_not_available(first_capture(&NOT_BEFORE, text)),
            valid_to: or_not_available(first_capture(&NOT_AFTER, text)),
            fingerprint,
            extensions: extract_extensions(text),
            public_key_info: PublicKeyInfo {
                algorithm: or_not_available(first_capture(&KEY_ALGORITHM, text)),
                key_size: first_capture(&KEY_SIZE, text).and_then(|bits| bits.parse().ok()),
            },
        })
    }
}

/// Full DER parsing with `x509-cert`. Rejects anything that is not a
/// well-formed certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct X509Decoder;

impl CertificateDecoder for X509Decoder {
    fn decode(&self, text: &str) -> Result<CertificateView, KeyprobeError> {
        let envelope = Envelope::parse(text)?;
        let cert = Certificate::from_der(&envelope.der).map_err(|e| {
            KeyprobeError::InvalidCertificate {
                reason: format!("not a valid X.509 certificate: {e}"),
            }
        })?;
        let tbs = &cert.tbs_certificate;

        let extensions = tbs
            .extensions
            .iter()
            .flatten()
            .map(|ext| Extension {
                name: oid_name(&ext.extn_id),
                value: colon_hex(ext.extn_value.as_bytes()),
                critical: ext.critical,
            })
            .collect();

        let spki = &tbs.subject_public_key_info;

        Ok(CertificateView {
            format: envelope.format,
            encoded_length: envelope.body.len(),
            pem: envelope.pem(),
            subject: tbs.subject.to_string(),
            issuer: tbs.issuer.to_string(),
            serial_number: colon_hex(tbs.serial_number.as_bytes()),
            version: format!("{:?}", tbs.version),
            valid_from: rfc3339(tbs.validity.not_before.to_unix_duration()),
            valid_to: rfc3339(tbs.validity.not_after.to_unix_duration()),
            fingerprint: envelope.fingerprint(),
            extensions,
            public_key_info: PublicKeyInfo {
                algorithm: oid_name(&spki.algorithm.oid),
                key_size: key_size(&spki.algorithm, &spki.subject_public_key),
            },
        })
    }
}

fn oid_name(oid: &ObjectIdentifier) -> String {
    DB.by_oid(oid)
        .map_or_else(|| oid.to_string(), str::to_string)
}

fn rfc3339(since_epoch: std::time::Duration) -> String {
    i64::try_from(since_epoch.as_secs())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(
            || NOT_AVAILABLE.to_string(),
            |time| time.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
}

/// Key size in bits for the key types this tool signs and verifies with.
fn key_size(algorithm: &AlgorithmIdentifierOwned, key: &BitString) -> Option<u32> {
    if algorithm.oid == rfc5912::ID_EC_PUBLIC_KEY {
        let curve: ObjectIdentifier = algorithm.parameters.as_ref()?.decode_as().ok()?;
        [
            (rfc5912::SECP_256_R_1, 256),
            (rfc5912::SECP_384_R_1, 384),
            (rfc5912::SECP_521_R_1, 521),
        ]
        .into_iter()
        .find_map(|(oid, bits)| (oid == curve).then_some(bits))
    } else if algorithm.oid == rfc8410::ID_ED_25519 {
        Some(256)
    } else if algorithm.oid == rfc5912::RSA_ENCRYPTION {
        use rsa::pkcs1::DecodeRsaPublicKey;
        use rsa::traits::PublicKeyParts;
        let public = rsa::RsaPublicKey::from_pkcs1_der(key.as_bytes()?).ok()?;
        u32::try_from(public.size() * 8).ok()
    } else {
        None
    }
}

/// Uppercase hex with `:` between bytes.
fn colon_hex(bytes: &[u8]) -> String {
    let hex = hex::encode_upper(bytes);
    let mut out = String::with_capacity(hex.len() + hex.len() / 2);
    for (index, pair) in hex.as_bytes().chunks(2).enumerate() {
        if index > 0 {
            out.push(':');
        }
        out.push_str(&String::from_utf8_lossy(pair));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_PEM: &str = include_str!("../../tests/fixtures/cert.pem");
    const CERT_DER_B64: &str = include_str!("../../tests/fixtures/cert.der.b64");
    const CERT_WITH_TEXT: &str = include_str!("../../tests/fixtures/cert_with_text.pem");
    const FINGERPRINT: &str = "5C:CE:04:76:16:25:EA:FD:FF:EA:0B:9E:45:E8:13:76:\
                               18:17:DA:A4:B2:84:53:5D:93:62:C9:A7:F6:2B:47:A6";

    #[test]
    fn test_field_patterns_compile() {
        for regex in [
            &SUBJECT_LINE,
            &SUBJECT_FIELD,
            &ISSUER_LINE,
            &ISSUER_FIELD,
            &NOT_BEFORE,
            &NOT_AFTER,
            &SERIAL_NUMBER,
            &VERSION,
            &KEY_ALGORITHM,
            &KEY_SIZE,
            &super::FINGERPRINT,
            &EXTENSION_HEADING,
        ] {
            assert!(LazyLock::force(regex).captures_len() >= 2);
        }
    }

    #[test]
    fn test_colon_hex() {
        assert_eq!(colon_hex(&[0x1a, 0x2b, 0x3c]), "1A:2B:3C");
        assert_eq!(colon_hex(&[]), "");
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let outcome = decode_certificate("   \n");
        assert!(outcome.decoded.is_none());
        assert!(matches!(
            outcome.error,
            Some(KeyprobeError::InvalidCertificate { reason }) if reason.contains("empty")
        ));
    }

    #[test]
    fn test_garbage_input_is_an_error() {
        let outcome = decode_certificate("this is *not* a certificate");
        assert!(matches!(
            outcome.error,
            Some(KeyprobeError::InvalidCertificate { reason }) if reason.contains("neither PEM")
        ));
    }

    #[test]
    fn test_pem_with_bad_body_is_an_error() {
        let text = format!("{PEM_BEGIN}\n!!!not base64!!!\n{PEM_END}\n");
        let outcome = decode_certificate(&text);
        assert!(matches!(
            outcome.error,
            Some(KeyprobeError::InvalidCertificate { reason }) if reason.contains("PEM body")
        ));
    }

    #[test]
    fn test_heuristic_bare_pem_marks_fields_not_available() {
        let view = decode_certificate(CERT_PEM).decoded.unwrap();
        assert_eq!(view.format, CertificateFormat::Pem);
        assert_eq!(view.subject, NOT_AVAILABLE);
        assert_eq!(view.issuer, NOT_AVAILABLE);
        assert_eq!(view.serial_number, NOT_AVAILABLE);
        assert_eq!(view.valid_from, NOT_AVAILABLE);
        assert_eq!(view.public_key_info.algorithm, NOT_AVAILABLE);
        assert!(view.extensions.is_empty());
        assert_eq!(view.fingerprint, FINGERPRINT);
    }

    #[test]
    fn test_heuristic_der_is_rewrapped_as_pem() {
        let view = decode_certificate(CERT_DER_B64).decoded.unwrap();
        assert_eq!(view.format, CertificateFormat::DerBase64);
        assert!(view.pem.starts_with(PEM_BEGIN));
        assert!(view.pem.trim_end().ends_with(PEM_END));
        for line in view.pem.lines() {
            assert!(line.len() <= PEM_LINE_WIDTH || line.starts_with("-----"));
        }
        assert_eq!(view.encoded_length, CERT_DER_B64.trim().len());

        let from_pem = decode_certificate(CERT_PEM).decoded.unwrap();
        assert_eq!(view.pem, from_pem.pem);
    }

    #[test]
    fn test_heuristic_extracts_text_dump_fields() {
        let view = decode_certificate(CERT_WITH_TEXT).decoded.unwrap();
        assert_eq!(view.format, CertificateFormat::Pem);
        assert_eq!(view.subject, "C = US, O = Keyprobe Test, CN = keyprobe.example");
        assert_eq!(view.issuer, "C = US, O = Keyprobe Test, CN = keyprobe.example");
        assert_eq!(view.serial_number, "439041101 (0x1a2b3c4d)");
        assert_eq!(view.version, "3 (0x2)");
        assert_eq!(view.valid_from, "Jan  1 00:00:00 2024 GMT");
        assert_eq!(view.valid_to, "Jan  1 00:00:00 2034 GMT");
        assert_eq!(view.fingerprint, FINGERPRINT);
        assert_eq!(view.public_key_info.algorithm, "id-ecPublicKey");
        assert_eq!(view.public_key_info.key_size, Some(256));
    }

    #[test]
    fn test_heuristic_extracts_extensions() {
        let view = decode_certificate(CERT_WITH_TEXT).decoded.unwrap();
        assert_eq!(
            view.extensions,
            vec![
                Extension {
                    name: "Basic Constraints".to_string(),
                    value: "CA:TRUE".to_string(),
                    critical: true,
                },
                Extension {
                    name: "Subject Alternative Name".to_string(),
                    value: "DNS:keyprobe.example".to_string(),
                    critical: false,
                },
            ]
        );
    }

    #[test]
    fn test_strict_decoder_reads_der_fields() {
        let view = X509Decoder.decode(CERT_PEM).unwrap();
        assert_eq!(view.subject, "CN=keyprobe.example,O=Keyprobe Test,C=US");
        assert_eq!(view.issuer, view.subject);
        assert_eq!(view.serial_number, "1A:2B:3C:4D");
        assert_eq!(view.version, "V3");
        assert_eq!(view.valid_from, "2024-01-01T00:00:00Z");
        assert_eq!(view.valid_to, "2034-01-01T00:00:00Z");
        assert_eq!(view.fingerprint, FINGERPRINT);
        assert!(view.public_key_info.algorithm.contains("ecPublicKey"));
        assert_eq!(view.public_key_info.key_size, Some(256));
    }

    #[test]
    fn test_strict_decoder_names_extensions() {
        let view = X509Decoder.decode(CERT_DER_B64).unwrap();
        assert_eq!(view.format, CertificateFormat::DerBase64);
        assert_eq!(view.extensions.len(), 2);
        assert!(view.extensions[0].name.contains("basicConstraints"));
        assert!(view.extensions[1].name.contains("subjectAltName"));
        assert!(view.extensions[0].critical);
        assert!(!view.extensions[1].critical);
    }

    #[test]
    fn test_strict_decoder_rejects_non_certificate_der() {
        // Valid Base64, but the bytes are not a certificate.
        let outcome = decode_with(&X509Decoder, "aGVsbG8gd29ybGQ=");
        assert!(matches!(
            outcome.error,
            Some(KeyprobeError::InvalidCertificate { reason }) if reason.contains("X.509")
        ));

        // The heuristic path still returns a view for the same input.
        assert!(decode_certificate("aGVsbG8gd29ybGQ=").decoded.is_some());
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let view = decode_certificate(CERT_WITH_TEXT).decoded.unwrap();
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["format"], "PEM");
        assert_eq!(value["serialNumber"], "439041101 (0x1a2b3c4d)");
        assert_eq!(value["publicKeyInfo"]["keySize"], 256);
        assert!(value["encodedLength"].as_u64().unwrap() > 0);
    }
}
