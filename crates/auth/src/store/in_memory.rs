use std::collections::HashMap;
use std::sync::RwLock;

use tollgate_core::AccountId;

use super::{StoreError, UserStore};
use crate::account::{Account, AccountPatch};

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    by_email: HashMap<String, AccountId>,
}

/// In-memory account store.
///
/// Intended for tests/dev. A single `RwLock` makes every write atomic.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.accounts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl UserStore for InMemoryUserStore {
    fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.accounts.get(&id).cloned())
    }

    fn find_by_identity(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        if inner.by_email.contains_key(&account.email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' already registered",
                account.email
            )));
        }
        if inner.accounts.contains_key(&account.id) {
            return Err(StoreError::Conflict(format!("id {} already exists", account.id)));
        }

        inner.by_email.insert(account.email.clone(), account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn update(&self, id: AccountId, patch: AccountPatch) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        account.apply(&patch);
        Ok(account.clone())
    }
}
