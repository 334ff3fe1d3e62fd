//! Handler for the `verify` subcommand.
//!
//! Verifies a JWT against a single JWK, an inline or file-based JWKS, a
//! remotely fetched JWKS endpoint, or an HMAC shared secret, then checks
//! the optional `kid`, `iss`, and `aud` expectations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use keyprobe::core::jwks::{FetchOptions, HttpKeySetFetcher, JwksCache, KeyResolver};
use keyprobe::core::keys::{KeyDescriptor, KeySet, KeySource};
use keyprobe::core::verifier::{Verifier, VerifyRequest};

use super::input::{read_env, read_file, read_token};
use crate::cli::VerifyArgs;
use crate::display::json_printer::print_json;
use crate::display::report::print_verification;

/// Execute the `verify` subcommand with the given arguments.
///
/// Returns `Ok(true)` when every check passed, `Ok(false)` when the token
/// was evaluated and rejected, and `Err` when the inputs themselves could
/// not be read.
pub fn execute(args: &VerifyArgs) -> Result<bool> {
    let token = read_token(args.token.as_deref(), args.token_env.as_deref())?;
    let source = key_source(args)?;

    let mut request = VerifyRequest::new(source);
    if let Some(issuer) = &args.issuer {
        request = request.with_issuer(issuer.as_str());
    }
    if let Some(audience) = &args.audience {
        request = request.with_audience(audience.as_str());
    }
    if let Some(kid) = &args.kid {
        request = request.with_key_id(kid.as_str());
    }

    let fetcher = HttpKeySetFetcher::new(FetchOptions {
        timeout: Some(Duration::from_secs(args.timeout)),
        allow_http: args.allow_http,
        ..FetchOptions::default()
    });
    let resolver = KeyResolver::new(fetcher).with_cache(Arc::new(JwksCache::new()));
    let result = Verifier::new(resolver).verify(&token, &request);

    info!(valid = result.is_valid, "verification finished");

    if args.json {
        print_json(&serde_json::to_value(&result)?, false);
    } else {
        print_verification(&result);
    }

    Ok(result.is_valid)
}

/// Build the key source from whichever key argument was supplied.
fn key_source(args: &VerifyArgs) -> Result<KeySource> {
    let key = if let Some(json) = &args.key {
        Some(KeyDescriptor::from_json(json)?)
    } else if let Some(path) = &args.key_file {
        Some(KeyDescriptor::from_json(&read_file(path)?)?)
    } else if let Some(secret) = &args.secret {
        Some(KeyDescriptor::from_secret(secret.as_bytes()))
    } else if let Some(name) = &args.secret_env {
        Some(KeyDescriptor::from_secret(read_env(name)?.as_bytes()))
    } else {
        None
    };

    let key_set = if let Some(json) = &args.jwks {
        Some(KeySet::from_json(json)?)
    } else if let Some(path) = &args.jwks_file {
        Some(KeySet::from_json(&read_file(path)?)?)
    } else {
        None
    };

    Ok(KeySource::from_parts(key, key_set, args.jwks_url.clone())?)
}
