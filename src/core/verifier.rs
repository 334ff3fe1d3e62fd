//! Token verification.
//!
//! Verification runs as a fixed sequence of stages:
//!
//! 1. decode the token structure,
//! 2. compare the header `kid` with the expected one (if any),
//! 3. resolve the verification key from the request's key source,
//! 4. verify the signature under that key,
//! 5. check `exp`/`nbf`, then the expected issuer and audience.
//!
//! The first failing stage ends the run. Whatever was learned up to that
//! point (decoded header and payload, checks already performed) is
//! reported in the [`VerificationResult`] alongside the error.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::core::JsonObject;
use crate::core::decoder::{DecodedToken, decode_token};
use crate::core::jwks::KeyResolver;
use crate::core::keys::KeySource;
use crate::error::KeyprobeError;

/// A named check recorded in [`VerificationResult::validation_details`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Check {
    /// Header `kid` equals the expected key id.
    KeyId,
    /// The signature verified under the resolved key.
    Signature,
    /// `exp` and `nbf` admit the current time.
    Expiry,
    /// `iss` equals the expected issuer.
    Issuer,
    /// `aud` contains the expected audience.
    Audience,
}

/// Outcome of each check that was reached. A missing entry means the
/// check never ran.
pub type ValidationDetails = BTreeMap<Check, bool>;

/// What to verify a token against.
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    /// Where the verification key comes from.
    pub source: KeySource,
    /// Required value of the `iss` claim.
    pub issuer: Option<String>,
    /// Value that must appear in the `aud` claim.
    pub audience: Option<String>,
    /// Required value of the header `kid`.
    pub key_id: Option<String>,
}

impl VerifyRequest {
    /// A request with no claim expectations.
    pub fn new(source: KeySource) -> Self {
        Self {
            source,
            issuer: None,
            audience: None,
            key_id: None,
        }
    }

    /// Require the `iss` claim to equal `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require the `aud` claim to contain `audience`.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Require the header `kid` to equal `key_id`.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

/// The structured result of a verification run.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Whether every check passed.
    pub is_valid: bool,
    /// The decoded header, when the header segment decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<JsonObject>,
    /// The decoded payload, when the payload segment decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonObject>,
    /// The first failure, if any.
    #[serde(
        serialize_with = "serialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<KeyprobeError>,
    /// Checks performed so far.
    pub validation_details: ValidationDetails,
}

impl VerificationResult {
    fn fail(mut self, error: KeyprobeError) -> Self {
        debug!(error = %error, "verification failed");
        self.is_valid = false;
        self.error = Some(error);
        self
    }

    fn record(&mut self, check: Check, passed: bool) {
        self.validation_details.insert(check, passed);
    }

    /// The recorded outcome of `check`, if it ran.
    pub fn check(&self, check: Check) -> Option<bool> {
        self.validation_details.get(&check).copied()
    }
}

impl fmt::Debug for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationResult")
            .field("is_valid", &self.is_valid)
            .field("header", &self.header)
            .field("payload", &self.payload.as_ref().map(|_| "[REDACTED]"))
            .field("error", &self.error)
            .field("validation_details", &self.validation_details)
            .finish()
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<KeyprobeError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.serialize_str(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    DecodeStructure,
    MatchKeyId,
    ResolveKey,
    VerifySignature,
    CheckClaims,
    Done,
}

/// Runs verification requests against a key resolver.
#[derive(Debug, Default)]
pub struct Verifier {
    resolver: KeyResolver,
}

impl Verifier {
    /// Create a verifier that resolves keys with `resolver`.
    pub fn new(resolver: KeyResolver) -> Self {
        Self { resolver }
    }

    /// Verify `token` against `request`.
    ///
    /// Never fails: every problem is reported through
    /// [`VerificationResult::error`].
    pub fn verify(&self, token: &str, request: &VerifyRequest) -> VerificationResult {
        debug!(stage = ?Stage::DecodeStructure);
        let decoded = decode_token(token);
        let mut result = VerificationResult {
            header: decoded.header.clone(),
            payload: decoded.payload.clone(),
            ..VerificationResult::default()
        };
        let decoded = match decoded.into_token() {
            Ok(decoded) => decoded,
            Err(err) => return result.fail(err),
        };

        if let Some(expected) = &request.key_id {
            debug!(stage = ?Stage::MatchKeyId);
            let actual = decoded.kid();
            let matched = actual == Some(expected.as_str());
            result.record(Check::KeyId, matched);
            if !matched {
                return result.fail(KeyprobeError::KeyIdMismatch {
                    expected: expected.clone(),
                    actual: actual.map_or_else(|| "no kid".to_string(), |kid| format!("'{kid}'")),
                });
            }
        }

        debug!(stage = ?Stage::ResolveKey);
        let resolved = match self.resolver.resolve(&request.source, &decoded.header) {
            Ok(resolved) => resolved,
            Err(err) => return result.fail(err),
        };

        debug!(stage = ?Stage::VerifySignature, algorithm = ?resolved.algorithm);
        let validation = build_validation(resolved.algorithm, request);
        let failure =
            match jsonwebtoken::decode::<JsonObject>(token, &resolved.decoding_key, &validation) {
                Ok(_) => None,
                Err(err) => match classify_failure(err.kind(), request) {
                    Some(failure) => Some(failure),
                    None => {
                        result.record(Check::Signature, false);
                        return result.fail(KeyprobeError::SignatureInvalid {
                            reason: crate::core::sanitize_jwt_error(err.kind()),
                        });
                    }
                },
            };
        result.record(Check::Signature, true);

        debug!(stage = ?Stage::CheckClaims);
        let result = check_claims(result, &decoded.payload, request, failure);
        debug!(stage = ?Stage::Done, is_valid = result.is_valid);
        result
    }
}

/// Record the expiry, issuer, and audience outcomes for a token whose
/// signature verified.
fn check_claims(
    mut result: VerificationResult,
    payload: &JsonObject,
    request: &VerifyRequest,
    failure: Option<Failure>,
) -> VerificationResult {
    let claim_failure = match failure {
        Some(Failure::Expiry(err)) => {
            result.record(Check::Expiry, false);
            return result.fail(err);
        }
        Some(Failure::Claim { checks, error }) => Some((checks, error)),
        None => None,
    };
    if let Err(err) = check_time_claims(payload, Utc::now().timestamp()) {
        result.record(Check::Expiry, false);
        return result.fail(err);
    }
    result.record(Check::Expiry, true);

    if let Some((checks, error)) = claim_failure {
        for (check, passed) in checks {
            result.record(check, passed);
        }
        return result.fail(error);
    }
    if request.issuer.is_some() {
        result.record(Check::Issuer, true);
    }
    if request.audience.is_some() {
        result.record(Check::Audience, true);
    }
    result.is_valid = true;
    result
}

/// Verify `token` with a default [`Verifier`] (no fetch timeout, no
/// key set cache).
pub fn verify_token(token: &str, request: &VerifyRequest) -> VerificationResult {
    Verifier::default().verify(token, request)
}

/// Validation settings: no clock leeway, `exp` and `nbf` checked when
/// present, `iss`/`aud` checked and required only when expected.
fn build_validation(algorithm: Algorithm, request: &VerifyRequest) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.required_spec_claims = HashSet::new();

    if let Some(issuer) = &request.issuer {
        validation.set_issuer(&[issuer]);
        validation.required_spec_claims.insert("iss".to_string());
    }

    match &request.audience {
        Some(audience) => {
            validation.set_audience(&[audience]);
            validation.required_spec_claims.insert("aud".to_string());
        }
        None => validation.validate_aud = false,
    }

    validation
}

enum Failure {
    Expiry(KeyprobeError),
    Claim {
        checks: Vec<(Check, bool)>,
        error: KeyprobeError,
    },
}

/// Map a `jsonwebtoken` claim failure onto recorded checks and an error.
///
/// The signature is verified before any claim, so a claim failure means
/// the signature passed. Returns `None` for every other kind of failure.
fn classify_failure(kind: &ErrorKind, request: &VerifyRequest) -> Option<Failure> {
    let failure = match kind {
        ErrorKind::ExpiredSignature => Failure::Expiry(KeyprobeError::TokenExpired),
        ErrorKind::ImmatureSignature => Failure::Expiry(KeyprobeError::TokenNotYetValid),
        ErrorKind::InvalidIssuer => Failure::Claim {
            checks: vec![(Check::Issuer, false)],
            error: KeyprobeError::ClaimMismatch {
                claim: "iss".to_string(),
                reason: format!(
                    "expected '{}'",
                    request.issuer.as_deref().unwrap_or_default()
                ),
            },
        },
        ErrorKind::InvalidAudience => {
            let mut checks = Vec::new();
            if request.issuer.is_some() {
                checks.push((Check::Issuer, true));
            }
            checks.push((Check::Audience, false));
            Failure::Claim {
                checks,
                error: KeyprobeError::ClaimMismatch {
                    claim: "aud".to_string(),
                    reason: format!(
                        "expected '{}'",
                        request.audience.as_deref().unwrap_or_default()
                    ),
                },
            }
        }
        ErrorKind::MissingRequiredClaim(claim) if claim == "iss" || claim == "aud" => {
            let check = if claim == "iss" {
                Check::Issuer
            } else {
                Check::Audience
            };
            Failure::Claim {
                checks: vec![(check, false)],
                error: KeyprobeError::ClaimMismatch {
                    claim: claim.clone(),
                    reason: "claim is missing".to_string(),
                },
            }
        }
        _ => return None,
    };
    Some(failure)
}

/// Check `exp` and `nbf` against `now` with no leeway.
///
/// `jsonwebtoken` skips time claims it cannot read as unsigned integers,
/// so every present value is checked here. A negative `exp` is expired;
/// a negative or non-numeric `nbf` and a non-numeric `exp` are malformed.
fn check_time_claims(payload: &JsonObject, now: i64) -> Result<(), KeyprobeError> {
    let now = now as f64;
    if let Some(exp) = payload.get("exp")
        && numeric_date("exp", exp, true)? < now
    {
        return Err(KeyprobeError::TokenExpired);
    }
    if let Some(nbf) = payload.get("nbf")
        && numeric_date("nbf", nbf, false)? > now
    {
        return Err(KeyprobeError::TokenNotYetValid);
    }
    Ok(())
}

fn numeric_date(claim: &str, value: &Value, allow_negative: bool) -> Result<f64, KeyprobeError> {
    value
        .as_f64()
        .filter(|seconds| allow_negative || *seconds >= 0.0)
        .ok_or_else(|| KeyprobeError::ClaimMismatch {
            claim: claim.to_string(),
            reason: "must be a non-negative number".to_string(),
        })
}

/// Expectations inferred from a token's own claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedExpectations {
    /// The header `kid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// The `iss` claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// The `aud` claim, or its first element when it is an array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    /// `<issuer origin>/.well-known/jwks.json`, when `iss` is an HTTP(S) URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_url: Option<String>,
}

/// Propose verification expectations from a decoded token.
pub fn suggest_expectations(decoded: &DecodedToken) -> SuggestedExpectations {
    let issuer = decoded
        .payload
        .get("iss")
        .and_then(Value::as_str)
        .map(str::to_string);

    let audience = match decoded.payload.get("aud") {
        Some(Value::String(aud)) => Some(aud.clone()),
        Some(Value::Array(values)) => values.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    let jwks_url = issuer.as_deref().and_then(jwks_url_for_issuer);

    SuggestedExpectations {
        key_id: decoded.kid().map(str::to_string),
        issuer,
        audience,
        jwks_url,
    }
}

fn jwks_url_for_issuer(issuer: &str) -> Option<String> {
    let url = reqwest::Url::parse(issuer).ok()?;
    if !matches!(url.scheme(), "https" | "http") {
        return None;
    }
    Some(format!(
        "{}/.well-known/jwks.json",
        url.origin().ascii_serialization()
    ))
}
