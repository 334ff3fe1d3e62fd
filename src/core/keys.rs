//! Key descriptors, key sets, and key import.
//!
//! A [`KeyDescriptor`] is a JWK-shaped description of one key. Importing
//! binds it to a single algorithm and produces a `jsonwebtoken` key:
//! a [`DecodingKey`] from the public members for verification, or an
//! [`EncodingKey`] from the private members for signing. Key type and
//! algorithm family must agree; a symmetric secret is never accepted for
//! an asymmetric algorithm or the other way round.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::{BigUint, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use zeroize::Zeroize;

use crate::core::JsonObject;
use crate::core::codec::decode_base64_url_bytes;
use crate::error::KeyprobeError;

/// The key families understood by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// `kty: "RSA"`
    Rsa,
    /// `kty: "EC"`
    Ec,
    /// `kty: "oct"` (shared secret)
    Oct,
    /// `kty: "OKP"` (Ed25519)
    Okp,
}

impl KeyType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ec => "EC",
            Self::Oct => "oct",
            Self::Okp => "OKP",
        }
    }
}

/// A JWK-shaped key descriptor.
///
/// Every member except `kty` is optional so that public keys, private
/// keys, and partially filled descriptors all parse; import checks
/// that the members a given algorithm needs are present. Members this
/// type does not know about are kept in `extra` and written back out
/// unchanged.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    /// Key type: `RSA`, `EC`, `oct`, or `OKP`.
    pub kty: String,
    /// Algorithm the key is bound to, if pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Key id used for selection within a key set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Intended use (`sig` / `enc`).
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// RSA modulus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Private exponent (RSA) or private scalar (EC / OKP).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// RSA first prime factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    /// RSA second prime factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// RSA first factor CRT exponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    /// RSA second factor CRT exponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    /// RSA first CRT coefficient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
    /// Curve name (`P-256`, `P-384`, `Ed25519`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// EC / OKP public x coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// EC public y coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Symmetric key value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
    /// Members not modelled above.
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Drop for KeyDescriptor {
    fn drop(&mut self) {
        self.d.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.dp.zeroize();
        self.dq.zeroize();
        self.qi.zeroize();
        self.k.zeroize();
    }
}

/// Custom `Debug` that shows which secret members exist without
/// printing them.
impl fmt::Debug for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("KeyDescriptor")
            .field("kty", &self.kty)
            .field("alg", &self.alg)
            .field("kid", &self.kid)
            .field("use", &self.key_use)
            .field("crv", &self.crv)
            .field("d", &redact(&self.d))
            .field("k", &redact(&self.k))
            .finish_non_exhaustive()
    }
}

impl KeyDescriptor {
    /// Build a symmetric `oct` key from raw secret bytes.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::from_kty_and_k("oct", crate::core::codec::encode_base64_url_bytes(secret))
    }

    fn from_kty_and_k(kty: &str, k: String) -> Self {
        Self {
            kty: kty.to_string(),
            alg: None,
            kid: None,
            key_use: None,
            n: None,
            e: None,
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            crv: None,
            x: None,
            y: None,
            k: Some(k),
            extra: JsonObject::new(),
        }
    }

    /// Parse a single JWK from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`KeyprobeError::InvalidKeyMaterial`] if the text is not
    /// a JSON object with a string `kty`.
    pub fn from_json(text: &str) -> Result<Self, KeyprobeError> {
        serde_json::from_str(text).map_err(|e| KeyprobeError::InvalidKeyMaterial {
            what: "JWK".to_string(),
            reason: e.to_string(),
        })
    }

    /// Interpret the `kty` member.
    ///
    /// # Errors
    ///
    /// Returns [`KeyprobeError::KeyImport`] for an unknown key type.
    pub fn key_type(&self) -> Result<KeyType, KeyprobeError> {
        match self.kty.as_str() {
            "RSA" => Ok(KeyType::Rsa),
            "EC" => Ok(KeyType::Ec),
            "oct" => Ok(KeyType::Oct),
            "OKP" => Ok(KeyType::Okp),
            other => Err(KeyprobeError::KeyImport {
                reason: format!("unsupported key type '{other}'"),
            }),
        }
    }

    /// Whether the descriptor carries private key material.
    pub fn is_private(&self) -> bool {
        self.d.is_some() || self.k.is_some()
    }

    /// Import this key for signature verification under `alg`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyprobeError::KeyImport`] if the key type does not fit
    /// the algorithm family, the descriptor pins a different algorithm,
    /// or required public members are missing or malformed.
    pub fn decoding_key(&self, alg: Algorithm) -> Result<DecodingKey, KeyprobeError> {
        let key_type = self.check_compatible(alg)?;
        match key_type {
            KeyType::Oct => Ok(DecodingKey::from_secret(&self.secret_bytes()?)),
            KeyType::Rsa => {
                DecodingKey::from_rsa_components(self.member("n")?, self.member("e")?)
                    .map_err(import_error)
            }
            KeyType::Ec => DecodingKey::from_ec_components(self.member("x")?, self.member("y")?)
                .map_err(import_error),
            KeyType::Okp => DecodingKey::from_ed_components(self.member("x")?).map_err(import_error),
        }
    }

    /// Import this key for signing under `alg`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyprobeError::KeyImport`] on a family mismatch or when
    /// the private members are missing or do not form a valid key.
    pub fn encoding_key(&self, alg: Algorithm) -> Result<EncodingKey, KeyprobeError> {
        let key_type = self.check_compatible(alg)?;
        match key_type {
            KeyType::Oct => Ok(EncodingKey::from_secret(&self.secret_bytes()?)),
            KeyType::Rsa => {
                let der = self.rsa_private_der()?;
                Ok(EncodingKey::from_rsa_der(&der))
            }
            KeyType::Ec => {
                let der = self.ec_private_der(alg)?;
                Ok(EncodingKey::from_ec_der(&der))
            }
            KeyType::Okp => {
                let der = self.ed25519_private_der()?;
                Ok(EncodingKey::from_ed_der(&der))
            }
        }
    }

    /// Check key type, curve, and pinned `alg` against `alg`.
    fn check_compatible(&self, alg: Algorithm) -> Result<KeyType, KeyprobeError> {
        let key_type = self.key_type()?;

        if let Some(pinned) = self.alg.as_deref() {
            if pinned != algorithm_name(alg) {
                return Err(KeyprobeError::KeyImport {
                    reason: format!(
                        "key is bound to {pinned} but {} was requested",
                        algorithm_name(alg)
                    ),
                });
            }
        }

        let expected_curve = match (key_type, alg) {
            (KeyType::Oct, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => None,
            (
                KeyType::Rsa,
                Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512,
            ) => None,
            (KeyType::Ec, Algorithm::ES256) => Some("P-256"),
            (KeyType::Ec, Algorithm::ES384) => Some("P-384"),
            (KeyType::Okp, Algorithm::EdDSA) => Some("Ed25519"),
            _ => {
                return Err(KeyprobeError::KeyImport {
                    reason: format!(
                        "key type '{}' cannot be used with {}",
                        key_type.as_str(),
                        algorithm_name(alg)
                    ),
                });
            }
        };

        if let Some(curve) = expected_curve {
            let actual = self.member("crv")?;
            if actual != curve {
                return Err(KeyprobeError::KeyImport {
                    reason: format!(
                        "curve {actual} cannot be used with {} (expected {curve})",
                        algorithm_name(alg)
                    ),
                });
            }
        }

        Ok(key_type)
    }

    fn member(&self, name: &str) -> Result<&str, KeyprobeError> {
        let value = match name {
            "n" => &self.n,
            "e" => &self.e,
            "d" => &self.d,
            "p" => &self.p,
            "q" => &self.q,
            "crv" => &self.crv,
            "x" => &self.x,
            "y" => &self.y,
            "k" => &self.k,
            _ => &None,
        };
        value.as_deref().ok_or_else(|| KeyprobeError::KeyImport {
            reason: format!("{} key is missing the '{name}' member", self.kty),
        })
    }

    fn member_bytes(&self, name: &str) -> Result<Vec<u8>, KeyprobeError> {
        decode_base64_url_bytes(self.member(name)?).map_err(|_| KeyprobeError::KeyImport {
            reason: format!("'{name}' member is not valid base64url"),
        })
    }

    fn secret_bytes(&self) -> Result<Vec<u8>, KeyprobeError> {
        let secret = self.member_bytes("k")?;
        if secret.is_empty() {
            return Err(KeyprobeError::KeyImport {
                reason: "symmetric key is empty".to_string(),
            });
        }
        Ok(secret)
    }

    /// PKCS#1 DER for an RSA private key built from its JWK members.
    fn rsa_private_der(&self) -> Result<Vec<u8>, KeyprobeError> {
        let uint = |name: &str| -> Result<BigUint, KeyprobeError> {
            Ok(BigUint::from_bytes_be(&self.member_bytes(name)?))
        };
        let key = RsaPrivateKey::from_components(
            uint("n")?,
            uint("e")?,
            uint("d")?,
            vec![uint("p")?, uint("q")?],
        )
        .map_err(|e| KeyprobeError::KeyImport {
            reason: format!("invalid RSA private key: {e}"),
        })?;
        let der = key.to_pkcs1_der().map_err(|e| KeyprobeError::KeyImport {
            reason: format!("failed to encode RSA private key: {e}"),
        })?;
        Ok(der.as_bytes().to_vec())
    }

    /// PKCS#8 DER for an EC private key on the curve `alg` requires.
    fn ec_private_der(&self, alg: Algorithm) -> Result<Vec<u8>, KeyprobeError> {
        let scalar = self.member_bytes("d")?;
        let invalid = |e: &dyn fmt::Display| KeyprobeError::KeyImport {
            reason: format!("invalid EC private key: {e}"),
        };
        let der = match alg {
            Algorithm::ES256 => {
                let secret = p256::SecretKey::from_slice(&scalar).map_err(|e| invalid(&e))?;
                p256::pkcs8::EncodePrivateKey::to_pkcs8_der(&secret).map_err(|e| invalid(&e))?
            }
            Algorithm::ES384 => {
                let secret = p384::SecretKey::from_slice(&scalar).map_err(|e| invalid(&e))?;
                p384::pkcs8::EncodePrivateKey::to_pkcs8_der(&secret).map_err(|e| invalid(&e))?
            }
            other => {
                return Err(KeyprobeError::UnsupportedAlgorithm {
                    algorithm: algorithm_name(other),
                });
            }
        };
        Ok(der.as_bytes().to_vec())
    }

    /// PKCS#8 DER for an Ed25519 private key.
    fn ed25519_private_der(&self) -> Result<Vec<u8>, KeyprobeError> {
        let mut seed = self.member_bytes("d")?;
        let bytes: [u8; 32] = seed
            .as_slice()
            .try_into()
            .map_err(|_| KeyprobeError::KeyImport {
                reason: format!("Ed25519 private key must be 32 bytes, got {}", seed.len()),
            })?;
        seed.zeroize();
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&bytes);
        let der = ed25519_dalek::pkcs8::EncodePrivateKey::to_pkcs8_der(&signing_key).map_err(
            |e| KeyprobeError::KeyImport {
                reason: format!("failed to encode Ed25519 private key: {e}"),
            },
        )?;
        Ok(der.as_bytes().to_vec())
    }
}

/// An ordered collection of key descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeySet {
    /// The keys, in the order they were supplied.
    pub keys: Vec<KeyDescriptor>,
}

impl KeySet {
    /// Parse a caller-supplied key set.
    ///
    /// Inline key sets are held to a stricter standard than fetched
    /// ones: the text must be valid JSON with a non-empty `keys` array.
    ///
    /// # Errors
    ///
    /// Returns [`KeyprobeError::InvalidKeyMaterial`] otherwise.
    pub fn from_json(text: &str) -> Result<Self, KeyprobeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| KeyprobeError::InvalidKeyMaterial {
                what: "JWKS".to_string(),
                reason: format!("must be valid JSON ({e})"),
            })?;

        let has_keys = value
            .get("keys")
            .and_then(Value::as_array)
            .is_some_and(|keys| !keys.is_empty());
        if !has_keys {
            return Err(KeyprobeError::InvalidKeyMaterial {
                what: "JWKS".to_string(),
                reason: "must contain a \"keys\" array with at least one key".to_string(),
            });
        }

        Ok(Self::from_value(value))
    }

    /// Interpret an arbitrary JSON value as a key set.
    ///
    /// Anything other than `{ "keys": [...] }` is a set with no keys.
    /// Array members that are not key descriptors are skipped.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut body) = value else {
            return Self::default();
        };
        let Some(Value::Array(members)) = body.remove("keys") else {
            return Self::default();
        };

        let keys = members
            .into_iter()
            .enumerate()
            .filter_map(|(index, member)| match serde_json::from_value(member) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(index, error = %e, "skipping unreadable key set member");
                    None
                }
            })
            .collect();

        Self { keys }
    }

    /// Find the key whose `kid` equals `kid`.
    pub fn find(&self, kid: &str) -> Option<&KeyDescriptor> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Where the verification key comes from. Exactly one case is active.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// One explicit key; used as-is, whatever the token's `kid`.
    Key(KeyDescriptor),
    /// An inline key set; the key is selected by the token's `kid`.
    KeySet(KeySet),
    /// A remote key set endpoint; fetched, then selected by `kid`.
    Remote(String),
}

impl KeySource {
    /// Build a key source from optional parts, exactly one of which must
    /// be set.
    ///
    /// # Errors
    ///
    /// Returns [`KeyprobeError::InvalidKeySource`] when no source or more
    /// than one source is supplied.
    pub fn from_parts(
        key: Option<KeyDescriptor>,
        key_set: Option<KeySet>,
        url: Option<String>,
    ) -> Result<Self, KeyprobeError> {
        match (key, key_set, url) {
            (Some(key), None, None) => Ok(Self::Key(key)),
            (None, Some(set), None) => Ok(Self::KeySet(set)),
            (None, None, Some(url)) => Ok(Self::Remote(url)),
            (None, None, None) => Err(KeyprobeError::InvalidKeySource {
                reason: "provide a key, a key set, or a key set URL".to_string(),
            }),
            (key, set, url) => {
                let supplied: Vec<&str> = [
                    key.is_some().then_some("key"),
                    set.is_some().then_some("key set"),
                    url.is_some().then_some("key set URL"),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(KeyprobeError::InvalidKeySource {
                    reason: format!(
                        "exactly one source is allowed, got {}",
                        supplied.join(" and ")
                    ),
                })
            }
        }
    }
}

/// Parse an algorithm name such as `RS256`.
///
/// # Errors
///
/// Returns [`KeyprobeError::UnsupportedAlgorithm`] for unknown names and
/// for `none`.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, KeyprobeError> {
    Algorithm::from_str(name).map_err(|_| KeyprobeError::UnsupportedAlgorithm {
        algorithm: name.to_string(),
    })
}

/// The registered name of an algorithm (`RS256`, `EdDSA`, ...).
pub fn algorithm_name(alg: Algorithm) -> String {
    format!("{alg:?}")
}

fn import_error(err: jsonwebtoken::errors::Error) -> KeyprobeError {
    KeyprobeError::KeyImport {
        reason: crate::core::sanitize_jwt_error(err.kind()),
    }
}
