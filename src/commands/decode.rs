//! Handler for the `decode` subcommand.
//!
//! Decodes and pretty-prints a JWT's header and payload without
//! verifying its signature. Supports reading the token from a CLI
//! argument, environment variable, or stdin.

use anyhow::Result;
use colored::Colorize;
use serde_json::{Value, json};
use tracing::debug;

use keyprobe::core::decoder::decode_token;
use keyprobe::core::verifier::suggest_expectations;

use super::input::read_token;
use crate::cli::DecodeArgs;
use crate::display::json_printer::print_json;
use crate::display::token_status::display_token_status;

/// Execute the `decode` subcommand with the given arguments.
///
/// A header that decoded is still printed when the payload is broken,
/// before the decode error is returned.
pub fn execute(args: &DecodeArgs, use_color: bool) -> Result<()> {
    let token = read_token(args.token.as_deref(), args.token_env.as_deref())?;
    let outcome = decode_token(&token);

    if let Some(err) = outcome.error.clone() {
        debug!(has_header = outcome.header.is_some(), "decode stopped early");
        if !args.json
            && let Some(header) = &outcome.header
        {
            println!("{}", "Header".bold().underline());
            print_json(&Value::Object(header.clone()), use_color);
        }
        return Err(err.into());
    }

    let decoded = outcome.into_token()?;
    let suggestions = suggest_expectations(&decoded);

    if args.json {
        let output = json!({
            "header": decoded.header,
            "payload": decoded.payload,
            "signature": decoded.signature,
            "suggestions": suggestions,
        });
        print_json(&output, false);
        return Ok(());
    }

    println!("{}", "Header".bold().underline());
    print_json(&Value::Object(decoded.header.clone()), use_color);
    println!();
    println!("{}", "Payload".bold().underline());
    print_json(&Value::Object(decoded.payload.clone()), use_color);
    println!();
    display_token_status(&decoded.payload);

    let hints = [
        ("--kid", suggestions.key_id.as_deref()),
        ("--issuer", suggestions.issuer.as_deref()),
        ("--audience", suggestions.audience.as_deref()),
        ("--jwks-url", suggestions.jwks_url.as_deref()),
    ];
    if hints.iter().any(|(_, value)| value.is_some()) {
        println!();
        println!("{}", "Verify with".bold().underline());
        for (flag, value) in hints {
            if let Some(value) = value {
                println!("  {} {value}", flag.cyan());
            }
        }
    }

    Ok(())
}
