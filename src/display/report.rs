//! Human-readable reports for verification results and certificates.

use colored::{ColoredString, Colorize};

use keyprobe::core::certificate::CertificateView;
use keyprobe::core::verifier::{Check, VerificationResult};

const CHECKS: [(Check, &str); 5] = [
    (Check::KeyId, "Key ID"),
    (Check::Signature, "Signature"),
    (Check::Expiry, "Expiry"),
    (Check::Issuer, "Issuer"),
    (Check::Audience, "Audience"),
];

/// Build the report lines for a verification result.
///
/// Checks that never ran are left out rather than shown as failed.
pub fn render_verification(result: &VerificationResult) -> Vec<String> {
    let verdict = if result.is_valid {
        "VALID".green().bold()
    } else {
        "INVALID".red().bold()
    };
    let mut lines = vec![format!("Verification: {verdict}")];

    for (check, label) in CHECKS {
        if let Some(passed) = result.check(check) {
            lines.push(format!("  {} {label}", mark(passed)));
        }
    }

    if let Some(error) = &result.error {
        lines.push(format!("{} {error}", "Error:".red().bold()));
    }
    lines
}

/// Print a verification report to stdout.
pub fn print_verification(result: &VerificationResult) {
    for line in render_verification(result) {
        println!("{line}");
    }
}

/// Build the report lines for a decoded certificate.
pub fn render_certificate(view: &CertificateView) -> Vec<String> {
    let key_size = view
        .public_key_info
        .key_size
        .map_or_else(String::new, |bits| format!(" ({bits} bit)"));

    let mut lines = vec![
        section("Certificate"),
        field("Format", &view.format.to_string()),
        field("Encoded length", &view.encoded_length.to_string()),
        field("Version", &view.version),
        field("Serial number", &view.serial_number),
        field("Subject", &view.subject),
        field("Issuer", &view.issuer),
        field("Valid from", &view.valid_from),
        field("Valid to", &view.valid_to),
        field(
            "Public key",
            &format!("{}{key_size}", view.public_key_info.algorithm),
        ),
        field("SHA-256", &view.fingerprint),
    ];

    if !view.extensions.is_empty() {
        lines.push(String::new());
        lines.push(section("Extensions"));
        for ext in &view.extensions {
            let critical = if ext.critical {
                format!(" {}", "[critical]".yellow())
            } else {
                String::new()
            };
            lines.push(format!("  {}{critical}", ext.name.cyan()));
            for value_line in ext.value.lines() {
                lines.push(format!("      {value_line}"));
            }
        }
    }
    lines
}

/// Print a certificate report to stdout.
pub fn print_certificate(view: &CertificateView) {
    for line in render_certificate(view) {
        println!("{line}");
    }
}

fn mark(passed: bool) -> ColoredString {
    if passed { "✓".green() } else { "✗".red() }
}

fn section(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn field(label: &str, value: &str) -> String {
    let label = format!("{:<15}", format!("{label}:"));
    format!("  {} {value}", label.cyan())
}
