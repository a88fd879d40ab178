//! Centralized validation for the gatehouse authentication stack.
//!
//! A single source of truth for input validation, so route handlers and
//! services agree on what a well-formed email, username, and password look
//! like.

use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Validates a practical subset of RFC 5322 email addresses.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Usernames: 3-30 chars, alphanumeric plus underscore and hyphen.
static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]{3,30}$").expect("Invalid username regex pattern")
});

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(format!(
            "Invalid email format: {email}"
        )))
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::MissingField(
            "Username is required".to_string(),
        ));
    }

    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername(
            "Username must be 3-30 characters of letters, digits, underscore or hyphen"
                .to_string(),
        ))
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.len() < 8 {
        return Err(ValidationError::InvalidPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(ValidationError::InvalidPassword(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email(&format!("{}@example.com", "a".repeat(250))).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("user_name-42").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has spaces").is_err());
        assert!(validate_username(&"x".repeat(31)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("validpass123").is_ok());

        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }
}
