//! Handler for the `base64` subcommand.

use anyhow::Result;

use keyprobe::core::codec::{decode_base64, decode_base64_url, encode_base64, encode_base64_url};

use super::input::read_text;
use crate::cli::{Base64Action, Base64Args};

/// Execute the `base64` subcommand with the given arguments.
///
/// Input read from stdin has its trailing newline removed first.
pub fn execute(args: &Base64Args) -> Result<()> {
    let output = match &args.action {
        Base64Action::Encode(input) => {
            let text = read_input(input.input.as_deref())?;
            if input.url {
                encode_base64_url(&text)?
            } else {
                encode_base64(&text)?
            }
        }
        Base64Action::Decode(input) => {
            let text = read_input(input.input.as_deref())?;
            let text = text.trim();
            if input.url {
                decode_base64_url(text)?
            } else {
                decode_base64(text)?
            }
        }
    };
    println!("{output}");
    Ok(())
}

fn read_input(arg: Option<&str>) -> Result<String> {
    if let Some(text) = arg {
        return Ok(text.to_string());
    }
    let text = read_text(None, None, "text to convert")?;
    let line = match text.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => text.as_str(),
    };
    Ok(line.to_string())
}
