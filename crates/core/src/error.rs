//! Domain error model.

use thiserror::Error;

/// Result type used for input validation across the workspace.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic domain failures (validation, identifier parsing).
///
/// Policy decisions (deny reasons) and infrastructure failures are modeled in
/// `tollgate-auth`, not here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed email).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Normalize an email identity: trimmed and lowercased.
///
/// Rejects empty input and input without an `@`.
pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    if email.starts_with('@') || email.ends_with('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email)
}
