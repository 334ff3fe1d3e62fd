//! keyprobe: inspect and verify signed tokens, key sets, and certificates.
//!
//! The engine lives in [`core`]; every entry point returns a structured
//! outcome rather than failing, so partial results (a decoded header
//! next to a broken payload, the checks that ran before a claim failed)
//! are always available to the caller.

#![forbid(unsafe_code)]

pub mod core;
pub mod error;

pub use crate::core::JsonObject;
pub use crate::core::certificate::{
    CertificateDecoder, CertificateOutcome, CertificateView, HeuristicExtractor, X509Decoder,
    decode_certificate,
};
pub use crate::core::codec::{decode_base64, decode_base64_url, encode_base64, encode_base64_url};
pub use crate::core::decoder::{DecodeOutcome, DecodedToken, decode_token};
pub use crate::core::jwks::{FetchOptions, HttpKeySetFetcher, JwksCache, KeyResolver, KeySetFetcher};
pub use crate::core::keys::{KeyDescriptor, KeySet, KeySource};
pub use crate::core::signer::{SignOptions, SignOutcome, sign_token};
pub use crate::core::verifier::{Check, VerificationResult, Verifier, VerifyRequest, verify_token};
pub use crate::error::{ErrorCategory, KeyprobeError};
