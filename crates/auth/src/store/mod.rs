//! Account persistence contract consumed by the auth core.
//!
//! The core only ever looks accounts up by identity and writes single-record
//! field groups; implementations must make each write atomic per record.

mod in_memory;

pub use in_memory::InMemoryUserStore;

use std::sync::Arc;

use thiserror::Error;

use tollgate_core::AccountId;

use crate::account::{Account, AccountPatch};

/// Account store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Uniqueness constraint violated (email or id already present).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("account {0} not found")]
    NotFound(AccountId),

    /// Storage backend failure (connection, poisoned lock, ...).
    #[error("store backend failure: {0}")]
    Backend(String),
}

pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Lookup by normalized email.
    fn find_by_identity(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Insert a new account; `StoreError::Conflict` if the email is taken.
    fn insert(&self, account: Account) -> Result<Account, StoreError>;

    /// Apply `patch` to one account and return the updated record.
    fn update(&self, id: AccountId, patch: AccountPatch) -> Result<Account, StoreError>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        (**self).find_by_id(id)
    }

    fn find_by_identity(&self, email: &str) -> Result<Option<Account>, StoreError> {
        (**self).find_by_identity(email)
    }

    fn insert(&self, account: Account) -> Result<Account, StoreError> {
        (**self).insert(account)
    }

    fn update(&self, id: AccountId, patch: AccountPatch) -> Result<Account, StoreError> {
        (**self).update(id, patch)
    }
}
