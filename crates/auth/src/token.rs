//! HS256 session tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use tollgate_core::AccountId;

use crate::claims::{Claims, validate_claims};
use crate::error::InternalError;
use crate::Role;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,
}

/// A freshly minted token and its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Previous signing secret still accepted for verification.
#[derive(Clone)]
struct RetiredKey {
    decoding: DecodingKey,
    accept_until: DateTime<Utc>,
}

/// Issues and verifies signed, self-expiring session tokens.
///
/// The signing secret is fixed at construction. Rotating it means building a
/// new service with [`TokenService::rotate`].
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    retired: Vec<RetiredKey>,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked by `validate_claims` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            retired: Vec::new(),
            validation,
        }
    }

    /// New service signing with `new_secret`; tokens signed by any secret this
    /// service accepts keep verifying until `grace_until`.
    pub fn rotate(&self, new_secret: impl AsRef<[u8]>, grace_until: DateTime<Utc>) -> Self {
        let mut next = Self::new(new_secret);
        next.retired.push(RetiredKey {
            decoding: self.decoding.clone(),
            accept_until: grace_until,
        });
        next.retired.extend(
            self.retired
                .iter()
                .map(|k| RetiredKey {
                    decoding: k.decoding.clone(),
                    accept_until: k.accept_until.min(grace_until),
                }),
        );
        next
    }

    pub fn issue(
        &self,
        account_id: AccountId,
        role: Role,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, InternalError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| InternalError::new("token expiry is out of range"))?;
        let claims = Claims {
            sub: account_id,
            role,
            issued_at: now,
            expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| InternalError::new(format!("token signing failed: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = match self.decode_with(&self.decoding, token) {
            Err(TokenError::SignatureInvalid) => self.decode_retired(token, now)?,
            other => other?,
        };
        validate_claims(&claims, now)?;
        Ok(claims)
    }

    fn decode_retired(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        for key in self.retired.iter().filter(|k| now <= k.accept_until) {
            if let Ok(claims) = self.decode_with(&key.decoding, token) {
                tracing::debug!(
                    account_id = %claims.sub,
                    "token accepted under retired signing key"
                );
                return Ok(claims);
            }
        }
        Err(TokenError::SignatureInvalid)
    }

    fn decode_with(&self, key: &DecodingKey, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| classify(e.kind()))
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("retired_keys", &self.retired.len())
            .finish_non_exhaustive()
    }
}
