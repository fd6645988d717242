/// Input validation and sanitization utilities

use ring::constant_time::verify_slices_are_equal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty input not allowed")]
    EmptyInput,

    #[error("Invalid characters detected")]
    InvalidCharacters,

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),
}

/// Compares a presented secret against the configured one without leaking
/// the position of the first differing byte.
pub fn verify_secret(presented: Option<&str>, expected: &str) -> bool {
    match presented {
        Some(presented) => verify_slices_are_equal(presented.as_bytes(), expected.as_bytes()).is_ok(),
        None => false,
    }
}

/// Turns a task identifier into something usable as a repository name.
pub fn sanitize_repo_name(task: &str) -> String {
    let mapped: String = task
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let trimmed = mapped.trim_matches(|c| c == '-' || c == '.');
    if trimmed.is_empty() {
        "site".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Accepts an attachment name only if it names a single file directly inside
/// the output directory.
pub fn validate_file_name(name: &str) -> Result<&str, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    if name.contains('\0') {
        return Err(ValidationError::InvalidCharacters);
    }

    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(ValidationError::PathTraversal(name.to_string()));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_secret() {
        assert!(verify_secret(Some("s3cret"), "s3cret"));
        assert!(!verify_secret(Some("s3cre"), "s3cret"));
        assert!(!verify_secret(Some(""), "s3cret"));
        assert!(!verify_secret(None, "s3cret"));
    }

    #[test]
    fn test_sanitize_repo_name() {
        assert_eq!(sanitize_repo_name("captcha-solver"), "captcha-solver");
        assert_eq!(sanitize_repo_name("sum of sales"), "sum-of-sales");
        assert_eq!(sanitize_repo_name("../x"), "x");
        assert_eq!(sanitize_repo_name("///"), "site");
    }

    #[test]
    fn test_validate_file_name() {
        assert_eq!(validate_file_name("data.csv"), Ok("data.csv"));
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("../../etc/passwd").is_err());
        assert!(validate_file_name("dir\\file").is_err());
    }
}
