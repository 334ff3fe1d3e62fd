//! Token status display for temporal claims.
//!
//! Renders human-readable status information for JWT temporal claims
//! (`exp`, `iat`, `nbf`) including expiry status with color coding.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::Value;

use keyprobe::core::JsonObject;

/// Where a token stands relative to its time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// `exp` is in the past.
    Expired { seconds_ago: i64 },
    /// `nbf` is in the future.
    NotYetValid { seconds_until: i64 },
    /// Inside the window, with an `exp`.
    Valid { seconds_left: i64 },
    /// Inside the window, without an `exp`.
    NoExpiry,
}

/// Classify a payload's `exp`/`nbf` against `now` (Unix seconds).
pub fn token_status(payload: &JsonObject, now: i64) -> TokenStatus {
    let exp = numeric_claim(payload, "exp");
    let nbf = numeric_claim(payload, "nbf");

    match (exp, nbf) {
        (Some(exp), _) if exp < now => TokenStatus::Expired {
            seconds_ago: now - exp,
        },
        (_, Some(nbf)) if nbf > now => TokenStatus::NotYetValid {
            seconds_until: nbf - now,
        },
        (Some(exp), _) => TokenStatus::Valid {
            seconds_left: exp - now,
        },
        (None, _) => TokenStatus::NoExpiry,
    }
}

/// Build the status lines for a payload.
pub fn render_token_status(payload: &JsonObject, now: i64) -> Vec<String> {
    let status = match token_status(payload, now) {
        TokenStatus::Expired { seconds_ago } => {
            format!("EXPIRED ({} ago)", format_duration(seconds_ago)).red().bold()
        }
        TokenStatus::NotYetValid { seconds_until } => {
            format!("NOT YET VALID (valid in {})", format_duration(seconds_until))
                .yellow()
                .bold()
        }
        TokenStatus::Valid { seconds_left } => {
            format!("VALID (expires in {})", format_duration(seconds_left))
                .green()
                .bold()
        }
        TokenStatus::NoExpiry => "NO EXPIRY".yellow().bold(),
    };

    let mut lines = vec![format!("Status:     {status}")];
    for (claim, label) in [("iat", "Issued at: "), ("nbf", "Not before:"), ("exp", "Expires:   ")] {
        if let Some(ts) = numeric_claim(payload, claim) {
            lines.push(format!("{label} {}", format_timestamp(ts)));
        }
    }
    lines
}

/// Display the temporal status of a JWT's claims.
///
/// Examines `exp`, `iat`, and `nbf` claims in the payload and prints
/// human-readable status information:
/// - Expired tokens: red "EXPIRED (X ago)"
/// - Valid tokens: green "VALID (expires in X)"
/// - Not-yet-valid tokens: yellow "NOT YET VALID (valid in X)"
pub fn display_token_status(payload: &JsonObject) {
    for line in render_token_status(payload, Utc::now().timestamp()) {
        println!("{line}");
    }
}

fn numeric_claim(payload: &JsonObject, claim: &str) -> Option<i64> {
    match payload.get(claim)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map_or_else(|| ts.to_string(), |dt| format!("{} ({ts})", dt.to_rfc3339()))
}

/// Compact duration such as `2d 3h`, `15m 4s`, or `9s`; at most two units.
pub fn format_duration(total_seconds: i64) -> String {
    let total = total_seconds.unsigned_abs();
    let units = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

    let mut parts = Vec::new();
    let mut remaining = total;
    for (size, suffix) in units {
        let amount = remaining / size;
        if amount > 0 {
            parts.push(format!("{amount}{suffix}"));
            remaining %= size;
        }
        if parts.len() == 2 {
            break;
        }
    }

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn payload(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_status_expired() {
        let status = token_status(&payload(json!({"exp": NOW - 90})), NOW);
        assert_eq!(status, TokenStatus::Expired { seconds_ago: 90 });
    }

    #[test]
    fn test_status_not_yet_valid() {
        let status = token_status(&payload(json!({"exp": NOW + 7200, "nbf": NOW + 60})), NOW);
        assert_eq!(status, TokenStatus::NotYetValid { seconds_until: 60 });
    }

    #[test]
    fn test_status_valid_and_no_expiry() {
        assert_eq!(
            token_status(&payload(json!({"exp": NOW + 10})), NOW),
            TokenStatus::Valid { seconds_left: 10 }
        );
        assert_eq!(token_status(&payload(json!({"sub": "1"})), NOW), TokenStatus::NoExpiry);
    }

    #[test]
    fn test_non_numeric_exp_is_ignored() {
        assert_eq!(
            token_status(&payload(json!({"exp": "tomorrow"})), NOW),
            TokenStatus::NoExpiry
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(9), "9s");
        assert_eq!(format_duration(3600), "1h");
        assert_eq!(format_duration(3661), "1h 1m");
        assert_eq!(format_duration(2 * 86_400 + 3 * 3600 + 5), "2d 3h");
    }

    #[test]
    fn test_render_lists_present_claims() {
        colored::control::set_override(false);
        let lines = render_token_status(&payload(json!({"iat": NOW, "exp": NOW + 3600})), NOW);
        assert_eq!(lines[0], "Status:     VALID (expires in 1h)");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Issued at:"));
        assert!(lines[2].contains("2023-11-14T23:13:20+00:00"));
    }
}
