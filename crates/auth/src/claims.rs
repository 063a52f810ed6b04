use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tollgate_core::AccountId;

use crate::Role;
use crate::token::TokenError;

/// Session token claims.
///
/// Bound to the token by its signature; callers only ever see them after
/// `TokenService::verify` succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / account identifier.
    pub sub: AccountId,

    /// Role of the account when the token was issued.
    pub role: Role,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

/// Temporal validation of already signature-checked claims.
///
/// A token is still valid at exactly `expires_at`; it is expired once `now`
/// passes it.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenError::Malformed);
    }
    if now > claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}
