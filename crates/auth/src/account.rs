//! Account record as seen by the auth core.
//!
//! Storage owns persistence; this module only defines the shape, the redacted
//! password hash and the external view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tollgate_core::AccountId;

use crate::{Role, SubscriptionTier};

// ─────────────────────────────────────────────────────────────────────────────
// Password hash
// ─────────────────────────────────────────────────────────────────────────────

/// PHC-formatted password hash.
///
/// Deliberately has no `Serialize` impl and a redacted `Debug`, so it cannot
/// leak through logs or API payloads.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an already-computed PHC string (e.g. loaded from storage).
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

/// Account record.
///
/// # Invariants
/// - `email` is unique and normalized (trimmed, lowercase).
/// - `password_hash` never holds plaintext.
/// - `last_login_at` only moves on successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub is_active: bool,
    pub subscription_tier: SubscriptionTier,
    pub subscription_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &AccountPatch) {
        if let Some(hash) = &patch.password_hash {
            self.password_hash = hash.clone();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        if let Some((tier, expires_at)) = patch.subscription {
            self.subscription_tier = tier;
            self.subscription_expires_at = expires_at;
        }
        if let Some(at) = patch.last_login_at {
            self.last_login_at = Some(at);
        }
    }
}

/// External representation of an account (no credential material).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub subscription_tier: SubscriptionTier,
    pub subscription_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountView {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            email: a.email.clone(),
            role: a.role,
            is_active: a.is_active,
            subscription_tier: a.subscription_tier,
            subscription_expires_at: a.subscription_expires_at,
            created_at: a.created_at,
            last_login_at: a.last_login_at,
        }
    }
}

/// Single-record field-group update passed to `UserStore::update`.
///
/// `None` leaves a field untouched. The tier and its expiry always move
/// together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub password_hash: Option<PasswordHash>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub subscription: Option<(SubscriptionTier, DateTime<Utc>)>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl AccountPatch {
    pub fn last_login(at: DateTime<Utc>) -> Self {
        Self {
            last_login_at: Some(at),
            ..Default::default()
        }
    }

    pub fn subscription(tier: SubscriptionTier, expires_at: DateTime<Utc>) -> Self {
        Self {
            subscription: Some((tier, expires_at)),
            ..Default::default()
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn active(active: bool) -> Self {
        Self {
            is_active: Some(active),
            ..Default::default()
        }
    }

    pub fn password(hash: PasswordHash) -> Self {
        Self {
            password_hash: Some(hash),
            ..Default::default()
        }
    }
}

#[cfg(test)]
pub(crate) fn test_account(now: DateTime<Utc>) -> Account {
    Account {
        id: AccountId::new(),
        email: "alice@example.com".to_string(),
        password_hash: PasswordHash::from_phc("$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA"),
        role: Role::Viewer,
        is_active: true,
        subscription_tier: SubscriptionTier::Standard,
        subscription_expires_at: now + chrono::Duration::days(30),
        created_at: now,
        last_login_at: None,
    }
}
