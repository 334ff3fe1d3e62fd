//! Handler for the `cert` subcommand.
//!
//! By default fields are pulled out of the text with the heuristic
//! extractor; `--strict` parses the DER structure instead.

use anyhow::Result;

use keyprobe::core::certificate::{HeuristicExtractor, X509Decoder, decode_with};

use super::input::read_text;
use crate::cli::CertArgs;
use crate::display::json_printer::print_json;
use crate::display::report::print_certificate;

/// Execute the `cert` subcommand with the given arguments.
pub fn execute(args: &CertArgs) -> Result<()> {
    let text = read_text(args.input.as_deref(), args.file.as_deref(), "a certificate")?;

    let outcome = if args.strict {
        decode_with(&X509Decoder, &text)
    } else {
        decode_with(&HeuristicExtractor, &text)
    };

    if let Some(err) = outcome.error {
        return Err(err.into());
    }
    let Some(view) = outcome.decoded else {
        anyhow::bail!("certificate decoder returned no result");
    };

    if args.json {
        print_json(&serde_json::to_value(&view)?, false);
    } else {
        print_certificate(&view);
    }
    Ok(())
}
