//! CLI argument definitions for keyprobe.
//!
//! Uses `clap` derive macros to define the command-line interface.
//! Each subcommand has its own argument struct for type-safe parsing.
//!
//! # Security
//!
//! Argument structs that can hold tokens, secrets, or key material
//! implement custom `Debug` to redact them and prevent accidental
//! leakage through debug formatting, error chains, or logging.

use std::fmt;
use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use zeroize::Zeroizing;

use keyprobe::core::jwks::DEFAULT_FETCH_TIMEOUT_SECS;
use keyprobe::core::signer::DEFAULT_SIGNING_ALGORITHM;

/// Inspect and verify JSON Web Tokens, JWKS key sets, and X.509
/// certificates from the terminal.
#[derive(Debug, Parser)]
#[command(name = "keyprobe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (-v, -vv, -vvv for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode and inspect a JWT without verifying its signature.
    Decode(DecodeArgs),

    /// Verify a JWT against a key, a key set, or a JWKS endpoint.
    Verify(VerifyArgs),

    /// Sign a JSON payload with a JWK or shared secret.
    Sign(SignArgs),

    /// Inspect a PEM or Base64 DER X.509 certificate.
    Cert(CertArgs),

    /// Encode or decode Base64 and Base64-URL text.
    Base64(Base64Args),
}

/// Arguments for the `decode` subcommand.
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// The JWT token to decode. If omitted, reads from stdin.
    pub token: Option<String>,

    /// Read the token from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub token_env: Option<String>,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Custom `Debug` that redacts the token field to prevent accidental leakage.
impl fmt::Debug for DecodeArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeArgs")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("json", &self.json)
            .finish()
    }
}

/// Arguments for the `verify` subcommand.
#[derive(clap::Args)]
#[command(group(
    ArgGroup::new("key_source")
        .required(true)
        .args(["key", "key_file", "jwks", "jwks_file", "jwks_url", "secret", "secret_env"]),
))]
pub struct VerifyArgs {
    /// The JWT token to verify. If omitted, reads from stdin.
    pub token: Option<String>,

    /// Read the token from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub token_env: Option<String>,

    /// A single JWK (JSON) to verify with.
    #[arg(long, value_name = "JSON", value_parser = parse_zeroizing_string)]
    pub key: Option<Zeroizing<String>>,

    /// Path to a file containing a single JWK.
    #[arg(long, value_name = "FILE")]
    pub key_file: Option<PathBuf>,

    /// An inline JWKS (JSON); the key is selected by the token's `kid`.
    #[arg(long, value_name = "JSON")]
    pub jwks: Option<String>,

    /// Path to a file containing a JWKS.
    #[arg(long, value_name = "FILE")]
    pub jwks_file: Option<PathBuf>,

    /// URL of a JWKS endpoint for remote key discovery.
    ///
    /// Must be HTTPS unless --allow-http is given. The key set is
    /// fetched and the key matching the token's `kid` is used.
    #[arg(long, value_name = "URL")]
    pub jwks_url: Option<String>,

    /// HMAC shared secret for signature validation.
    ///
    /// WARNING: Passing secrets via CLI arguments may expose them in shell
    /// history. Prefer using --secret-env instead.
    #[arg(long, value_name = "SECRET", value_parser = parse_zeroizing_string)]
    pub secret: Option<Zeroizing<String>>,

    /// Read the HMAC secret from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub secret_env: Option<String>,

    /// Required value of the `iss` claim.
    #[arg(long, value_name = "ISSUER")]
    pub issuer: Option<String>,

    /// Value that must appear in the `aud` claim.
    #[arg(long, value_name = "AUDIENCE")]
    pub audience: Option<String>,

    /// Required value of the token header's `kid`.
    #[arg(long, value_name = "KID")]
    pub kid: Option<String>,

    /// Accept plain HTTP JWKS URLs (for local testing only).
    #[arg(long)]
    pub allow_http: bool,

    /// JWKS request timeout in seconds.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Parse a string into a `Zeroizing<String>` for secure CLI arguments.
fn parse_zeroizing_string(s: &str) -> Result<Zeroizing<String>, std::convert::Infallible> {
    Ok(Zeroizing::new(s.to_string()))
}

/// Custom `Debug` that redacts token, key, and secret fields to prevent
/// accidental leakage through debug formatting or error chains.
impl fmt::Debug for VerifyArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyArgs")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("key_file", &self.key_file)
            .field("jwks", &self.jwks.as_ref().map(|_| "[INLINE]"))
            .field("jwks_file", &self.jwks_file)
            .field("jwks_url", &self.jwks_url)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("secret_env", &self.secret_env)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("kid", &self.kid)
            .field("allow_http", &self.allow_http)
            .field("timeout", &self.timeout)
            .field("json", &self.json)
            .finish()
    }
}

/// Arguments for the `sign` subcommand.
#[derive(clap::Args)]
#[command(group(
    ArgGroup::new("signing_key")
        .required(true)
        .args(["key", "key_file", "secret", "secret_env"]),
))]
pub struct SignArgs {
    /// A private JWK (JSON) to sign with.
    #[arg(long, value_name = "JSON", value_parser = parse_zeroizing_string)]
    pub key: Option<Zeroizing<String>>,

    /// Path to a file containing a private JWK.
    #[arg(long, value_name = "FILE")]
    pub key_file: Option<PathBuf>,

    /// HMAC shared secret to sign with (use with an HS* algorithm).
    #[arg(long, value_name = "SECRET", value_parser = parse_zeroizing_string)]
    pub secret: Option<Zeroizing<String>>,

    /// Read the HMAC secret from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub secret_env: Option<String>,

    /// The claims to sign, as a JSON object. If omitted (and no
    /// --payload-file is given), reads from stdin.
    #[arg(long, value_name = "JSON", conflicts_with = "payload_file")]
    pub payload: Option<String>,

    /// Path to a file containing the claims JSON.
    #[arg(long, value_name = "FILE")]
    pub payload_file: Option<PathBuf>,

    /// Signing algorithm.
    #[arg(long, value_name = "ALG", default_value = DEFAULT_SIGNING_ALGORITHM)]
    pub alg: String,

    /// Lifetime in seconds. Anything other than an integer means 3600.
    ///
    /// The resulting `exp` replaces any `exp` in the payload.
    #[arg(long, value_name = "SECONDS", default_value = "3600", allow_hyphen_values = true)]
    pub expires_in: String,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Custom `Debug` that redacts key and secret fields.
impl fmt::Debug for SignArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignArgs")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("key_file", &self.key_file)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("secret_env", &self.secret_env)
            .field("payload", &self.payload.as_ref().map(|_| "[REDACTED]"))
            .field("payload_file", &self.payload_file)
            .field("alg", &self.alg)
            .field("expires_in", &self.expires_in)
            .field("json", &self.json)
            .finish()
    }
}

/// Arguments for the `cert` subcommand.
#[derive(Debug, clap::Args)]
pub struct CertArgs {
    /// PEM or Base64 DER certificate text. If omitted, reads from stdin.
    #[arg(conflicts_with = "file")]
    pub input: Option<String>,

    /// Read the certificate from a file.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Parse the DER structure instead of extracting fields from text.
    #[arg(long)]
    pub strict: bool,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `base64` subcommand.
#[derive(Debug, clap::Args)]
pub struct Base64Args {
    /// Direction of the conversion.
    #[command(subcommand)]
    pub action: Base64Action,
}

/// `base64` actions.
#[derive(Debug, Subcommand)]
pub enum Base64Action {
    /// Encode text (each char must be U+0000..=U+00FF).
    Encode(Base64Input),
    /// Decode Base64 text.
    Decode(Base64Input),
}

/// Input for a `base64` action.
#[derive(Debug, clap::Args)]
pub struct Base64Input {
    /// The text to convert. If omitted, reads from stdin.
    pub input: Option<String>,

    /// Use the URL-safe alphabet without padding.
    #[arg(long)]
    pub url: bool,
}
