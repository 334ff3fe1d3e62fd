//! Input collection shared by the command handlers.
//!
//! Tokens and other text inputs come from, in order of precedence:
//! a positional argument, an environment variable, then stdin.

use std::io::{IsTerminal, Read};
use std::path::Path;

use zeroize::Zeroizing;

use keyprobe::error::KeyprobeError;

/// Resolve the token from an argument, `--token-env`, or stdin.
///
/// # Errors
///
/// Returns [`KeyprobeError::NoTokenProvided`] when every source is empty,
/// or an environment-variable error for `--token-env`.
pub fn read_token(
    arg: Option<&str>,
    env_name: Option<&str>,
) -> Result<Zeroizing<String>, KeyprobeError> {
    if let Some(token) = arg.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(Zeroizing::new(token.to_string()));
    }
    if let Some(name) = env_name {
        let value = read_env(name)?;
        let token = value.trim();
        if token.is_empty() {
            return Err(KeyprobeError::NoTokenProvided);
        }
        return Ok(Zeroizing::new(token.to_string()));
    }
    match read_stdin()? {
        Some(text) => Ok(Zeroizing::new(text.trim().to_string())),
        None => Err(KeyprobeError::NoTokenProvided),
    }
}

/// Resolve a free-form text input from an argument, a file, or stdin.
///
/// # Errors
///
/// Returns [`KeyprobeError::NoInputProvided`] when every source is empty,
/// or [`KeyprobeError::FileError`] when the file cannot be read.
pub fn read_text(
    arg: Option<&str>,
    file: Option<&Path>,
    what: &str,
) -> Result<String, KeyprobeError> {
    if let Some(text) = arg.filter(|t| !t.trim().is_empty()) {
        return Ok(text.to_string());
    }
    if let Some(path) = file {
        return read_file(path);
    }
    read_stdin()?.ok_or_else(|| KeyprobeError::NoInputProvided {
        what: what.to_string(),
    })
}

/// Read an environment variable after validating its name.
///
/// # Errors
///
/// Returns [`KeyprobeError::InvalidEnvVarName`] for names that cannot be
/// looked up, or [`KeyprobeError::EnvVarNotFound`] when the variable is
/// unset or not valid Unicode.
pub fn read_env(name: &str) -> Result<Zeroizing<String>, KeyprobeError> {
    validate_env_name(name)?;
    std::env::var(name)
        .map(Zeroizing::new)
        .map_err(|_| KeyprobeError::EnvVarNotFound {
            name: name.to_string(),
        })
}

/// Reject names `std::env::var` would panic on or silently misread.
pub fn validate_env_name(name: &str) -> Result<(), KeyprobeError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(KeyprobeError::InvalidEnvVarName {
            name: name.escape_debug().to_string(),
        });
    }
    Ok(())
}

/// Read a UTF-8 file.
///
/// # Errors
///
/// Returns [`KeyprobeError::FileError`] on any I/O or decoding failure.
pub fn read_file(path: &Path) -> Result<String, KeyprobeError> {
    std::fs::read_to_string(path).map_err(|e| KeyprobeError::FileError {
        path: path.display().to_string(),
        reason: e.kind().to_string(),
    })
}

/// Read all of stdin, unless it is an interactive terminal.
///
/// Returns `None` for a terminal or for input that is only whitespace.
fn read_stdin() -> Result<Option<String>, KeyprobeError> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .map_err(|e| KeyprobeError::FileError {
            path: "<stdin>".to_string(),
            reason: e.kind().to_string(),
        })?;
    if buffer.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_token_prefers_argument() {
        let token = read_token(Some("  a.b.c \n"), Some("UNUSED_VAR_NAME")).unwrap();
        assert_eq!(token.as_str(), "a.b.c");
    }

    #[test]
    fn test_validate_env_name_rejects_bad_names() {
        for name in ["", "A=B", "A\0B"] {
            assert!(matches!(
                validate_env_name(name),
                Err(KeyprobeError::InvalidEnvVarName { .. })
            ));
        }
        assert!(validate_env_name("JWT_TOKEN").is_ok());
    }

    #[test]
    fn test_read_env_missing_variable() {
        let err = read_env("KEYPROBE_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, KeyprobeError::EnvVarNotFound { name } if name.contains("SURELY")));
    }

    #[test]
    fn test_read_file_missing() {
        let err = read_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, KeyprobeError::FileError { path, .. } if path.contains("exist.json")));
    }

    #[test]
    fn test_read_text_prefers_argument_over_file() {
        let text = read_text(Some("hello"), Some(Path::new("missing")), "text").unwrap();
        assert_eq!(text, "hello");
    }
}
