//! Rejection taxonomy.
//!
//! Policy outcomes (`DenyReason`) and infrastructure failures
//! (`InternalError`) are separate types; the latter is never folded into a
//! deny.

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;
use crate::token::TokenError;

/// Why the authorization pipeline refused a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DenyReason {
    #[error("no bearer token presented")]
    Unauthenticated,

    #[error("invalid token: {0}")]
    TokenInvalid(#[from] TokenError),

    #[error("account not found")]
    AccountNotFound,

    #[error("account is suspended")]
    AccountSuspended,

    #[error("subscription has expired")]
    SubscriptionExpired,

    #[error("insufficient privilege")]
    InsufficientPrivilege,
}

/// Store or crypto failure: "infrastructure broke", as opposed to "policy says no".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("internal error: {0}")]
pub struct InternalError(String);

impl InternalError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<StoreError> for InternalError {
    fn from(value: StoreError) -> Self {
        Self(value.to_string())
    }
}

/// Every failure surfaced by the auth core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no bearer token presented")]
    Unauthenticated,

    #[error("invalid token: {0}")]
    TokenInvalid(TokenError),

    #[error("account not found")]
    AccountNotFound,

    #[error("account is suspended")]
    AccountSuspended,

    #[error("subscription has expired")]
    SubscriptionExpired,

    #[error("insufficient privilege")]
    InsufficientPrivilege,

    #[error("an account with this identity already exists")]
    DuplicateIdentity,

    /// Unknown identity and wrong password share this variant.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<DenyReason> for AuthError {
    fn from(value: DenyReason) -> Self {
        match value {
            DenyReason::Unauthenticated => AuthError::Unauthenticated,
            DenyReason::TokenInvalid(e) => AuthError::TokenInvalid(e),
            DenyReason::AccountNotFound => AuthError::AccountNotFound,
            DenyReason::AccountSuspended => AuthError::AccountSuspended,
            DenyReason::SubscriptionExpired => AuthError::SubscriptionExpired,
            DenyReason::InsufficientPrivilege => AuthError::InsufficientPrivilege,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        AuthError::Internal(value.into())
    }
}

impl From<tollgate_core::DomainError> for AuthError {
    fn from(value: tollgate_core::DomainError) -> Self {
        AuthError::InvalidRequest(value.to_string())
    }
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::Unauthenticated => ErrorCode::Unauthenticated,
            AuthError::TokenInvalid(_) => ErrorCode::TokenInvalid,
            AuthError::AccountNotFound => ErrorCode::AccountNotFound,
            AuthError::AccountSuspended => ErrorCode::AccountSuspended,
            AuthError::SubscriptionExpired => ErrorCode::SubscriptionExpired,
            AuthError::InsufficientPrivilege => ErrorCode::InsufficientPrivilege,
            AuthError::DuplicateIdentity => ErrorCode::DuplicateIdentity,
            AuthError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AuthError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            AuthError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Payload for the transport boundary.
    ///
    /// Internal failures get a generic message; their detail stays in logs.
    pub fn rejection(&self) -> Rejection {
        let message = match self {
            AuthError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        Rejection {
            code: self.code(),
            message,
        }
    }
}

/// Stable machine-readable rejection code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthenticated,
    TokenInvalid,
    AccountNotFound,
    AccountSuspended,
    SubscriptionExpired,
    InsufficientPrivilege,
    DuplicateIdentity,
    InvalidCredentials,
    InvalidRequest,
    InternalError,
}

impl ErrorCode {
    /// HTTP status a transport layer should map this code to.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::Unauthenticated
            | ErrorCode::TokenInvalid
            | ErrorCode::InvalidCredentials => 401,
            ErrorCode::AccountSuspended | ErrorCode::InsufficientPrivilege => 403,
            ErrorCode::AccountNotFound => 404,
            ErrorCode::DuplicateIdentity => 409,
            ErrorCode::SubscriptionExpired => 410,
            ErrorCode::InvalidRequest => 400,
            ErrorCode::InternalError => 500,
        }
    }
}

/// `{ code, message }` rejection payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: ErrorCode,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_serializes_to_stable_shape() {
        let rejection = AuthError::SubscriptionExpired.rejection();
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["code"], "subscription_expired");
        assert_eq!(json["message"], "subscription has expired");
        assert_eq!(rejection.code.http_status(), 410);
    }

    #[test]
    fn token_failures_share_one_code() {
        for err in [TokenError::Malformed, TokenError::SignatureInvalid, TokenError::Expired] {
            let auth: AuthError = DenyReason::TokenInvalid(err).into();
            assert_eq!(auth.code(), ErrorCode::TokenInvalid);
            assert_eq!(auth.code().http_status(), 401);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = AuthError::Internal(InternalError::new("connection refused to db-primary:5432"));
        let rejection = err.rejection();
        assert_eq!(rejection.code, ErrorCode::InternalError);
        assert!(!rejection.message.contains("db-primary"));
    }

    #[test]
    fn invalid_credentials_is_unauthorized_not_not_found() {
        assert_eq!(AuthError::InvalidCredentials.code().http_status(), 401);
        assert_eq!(AuthError::InsufficientPrivilege.code().http_status(), 403);
    }
}
