//! keyprobe: inspect and verify JWTs, JWKS key sets, and X.509
//! certificates from the terminal.
//!
//! Entry point for the application. Parses CLI arguments, sets up
//! logging, and delegates to the appropriate command handler.

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod display;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Parse CLI arguments and dispatch to the appropriate command handler.
///
/// Returns `ExitCode` so the caller can exit without `process::exit`,
/// allowing all destructors (including `Zeroizing`) to run.
fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let use_color = !cli.no_color;
    if !use_color {
        colored::control::set_override(false);
    }

    match &cli.command {
        Commands::Decode(args) => {
            commands::decode::execute(args, use_color && !args.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify(args) => {
            let valid = commands::verify::execute(args)?;
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Sign(args) => {
            commands::sign::execute(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cert(args) => {
            commands::cert::execute(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Base64(args) => {
            commands::base64::execute(args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level follows `-v`/`-q`.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyprobe={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
