//! Input validation and normalization.
//!
//! Every helper returns [`Error::Validation`] with a caller-facing message;
//! nothing here touches storage.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Trim `value` and reject it if nothing is left.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming `field` when blank.
pub fn non_blank(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Normalize an organization domain to lowercase.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the domain is empty, contains whitespace,
/// has no dot, or starts or ends with a dot.
pub fn domain(value: &str) -> Result<String> {
    let domain = value.trim().to_lowercase();
    if domain.is_empty() {
        return Err(Error::validation("domain must not be empty"));
    }
    if domain.chars().any(char::is_whitespace) {
        return Err(Error::validation("domain must not contain whitespace"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(Error::validation("domain must look like example.org"));
    }
    Ok(domain)
}

/// Normalize an email address to lowercase.
///
/// # Errors
///
/// Returns [`Error::Validation`] unless the address has exactly one `@` with
/// a non-empty local part and a dotted domain.
pub fn email(value: &str) -> Result<String> {
    let email = value.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, host)) => {
            !local.is_empty()
                && !host.contains('@')
                && host.contains('.')
                && !host.starts_with('.')
                && !host.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(Error::validation("email address is invalid"))
    }
}

/// Enforce the password policy.
///
/// # Errors
///
/// Returns [`Error::Validation`] for passwords shorter than
/// [`MIN_PASSWORD_LEN`] characters.
pub fn password(value: &str) -> Result<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Parse an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming `field` if the value does not parse.
pub fn timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::validation(format!("{field} must be an RFC 3339 timestamp")))
}

/// Validate an event capacity.
///
/// # Errors
///
/// Returns [`Error::Validation`] unless `1 <= value <= i32::MAX`.
pub fn capacity(value: i64) -> Result<i32> {
    if value <= 0 {
        return Err(Error::validation("max_capacity must be positive"));
    }
    i32::try_from(value).map_err(|_| Error::validation("max_capacity is too large"))
}
