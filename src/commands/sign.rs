//! Handler for the `sign` subcommand.

use anyhow::Result;
use serde_json::{Value, json};

use keyprobe::core::JsonObject;
use keyprobe::core::expiry::ExpiresIn;
use keyprobe::core::keys::KeyDescriptor;
use keyprobe::core::signer::{SignOptions, sign_token};
use keyprobe::error::KeyprobeError;

use super::input::{read_env, read_file, read_text};
use crate::cli::SignArgs;
use crate::display::json_printer::print_json;

/// Execute the `sign` subcommand with the given arguments.
///
/// Prints the compact token, or `{"token": ...}` with `--json`.
pub fn execute(args: &SignArgs) -> Result<()> {
    let key = signing_key(args)?;
    let text = read_text(
        args.payload.as_deref(),
        args.payload_file.as_deref(),
        "a JSON payload",
    )?;
    let payload = parse_payload(&text)?;

    let options = SignOptions {
        algorithm: args.alg.clone(),
        expires_in: ExpiresIn::from(args.expires_in.as_str()),
    };
    let token = sign_token(&payload, &key, &options).into_result()?;

    if args.json {
        print_json(&json!({ "token": token }), false);
    } else {
        println!("{token}");
    }
    Ok(())
}

fn signing_key(args: &SignArgs) -> Result<KeyDescriptor> {
    if let Some(json) = &args.key {
        return Ok(KeyDescriptor::from_json(json)?);
    }
    if let Some(path) = &args.key_file {
        return Ok(KeyDescriptor::from_json(&read_file(path)?)?);
    }
    if let Some(secret) = &args.secret {
        return Ok(KeyDescriptor::from_secret(secret.as_bytes()));
    }
    if let Some(name) = &args.secret_env {
        return Ok(KeyDescriptor::from_secret(read_env(name)?.as_bytes()));
    }
    Err(KeyprobeError::InvalidKeySource {
        reason: "provide a key or a secret to sign with".to_string(),
    }
    .into())
}

/// The payload must be a JSON object.
fn parse_payload(text: &str) -> Result<JsonObject, KeyprobeError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(KeyprobeError::InvalidKeyMaterial {
            what: "payload".to_string(),
            reason: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(KeyprobeError::InvalidKeyMaterial {
            what: "payload".to_string(),
            reason: e.to_string(),
        }),
    }
}
