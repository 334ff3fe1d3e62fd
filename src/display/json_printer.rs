//! Colorized JSON pretty-printing for terminal output.
//!
//! Renders JSON values with syntax highlighting:
//! - Field names in cyan
//! - Strings in green
//! - Numbers in yellow
//! - Booleans in magenta
//! - Null in red

use std::fmt::Write;

use colored::Colorize;
use serde_json::Value;

const INDENT: &str = "  ";

/// Print a JSON value with colorized syntax highlighting.
///
/// Renders the value with 2-space indentation and ANSI color codes.
/// When `use_color` is false, outputs plain JSON without colors
/// (suitable for machine consumption or piping).
pub fn print_json(value: &Value, use_color: bool) {
    println!("{}", render_json(value, use_color));
}

/// Render a JSON value as a pretty-printed string.
pub fn render_json(value: &Value, use_color: bool) -> String {
    if !use_color {
        return serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    }
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str(&"null".red().to_string()),
        Value::Bool(b) => out.push_str(&b.to_string().magenta().to_string()),
        Value::Number(n) => out.push_str(&n.to_string().yellow().to_string()),
        Value::String(s) => out.push_str(&quoted(s).green().to_string()),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for (index, item) in items.iter().enumerate() {
                out.push_str(&INDENT.repeat(depth + 1));
                write_value(out, item, depth + 1);
                if index + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&INDENT.repeat(depth));
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (index, (key, item)) in map.iter().enumerate() {
                let _ = write!(
                    out,
                    "{}{}: ",
                    INDENT.repeat(depth + 1),
                    quoted(key).cyan()
                );
                write_value(out, item, depth + 1);
                if index + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&INDENT.repeat(depth));
            out.push('}');
        }
    }
}

/// JSON string literal with escapes applied.
fn quoted(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_output_is_valid_pretty_json() {
        let value = json!({"alg": "HS256", "n": 1, "ok": true, "none": null});
        let rendered = render_json(&value, false);
        assert_eq!(serde_json::from_str::<Value>(&rendered).unwrap(), value);
        assert!(rendered.contains("\n  \"alg\": \"HS256\""));
    }

    #[test]
    fn test_colored_output_keeps_structure() {
        colored::control::set_override(false);
        let value = json!({"sub": "1", "aud": ["a", "b"], "empty": {}, "list": []});
        let rendered = render_json(&value, true);
        assert_eq!(serde_json::from_str::<Value>(&rendered).unwrap(), value);
        assert!(rendered.contains("\"aud\": [\n    \"a\",\n    \"b\"\n  ]"));
    }

    #[test]
    fn test_string_escaping() {
        colored::control::set_override(false);
        let rendered = render_json(&json!({"q": "say \"hi\"\n"}), true);
        assert!(rendered.contains(r#""say \"hi\"\n""#));
    }
}
