use serde::Serialize;

use tollgate_core::AccountId;

use crate::account::Account;
use crate::{Role, SubscriptionTier};

/// Identity attached to a request once the pipeline has allowed it.
///
/// Read-only: it is a snapshot of the account taken during the request's
/// single store lookup and cannot feed anything back into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    account_id: AccountId,
    role: Role,
    tier: SubscriptionTier,
}

impl Principal {
    pub(crate) fn from_account(account: &Account) -> Self {
        Self {
            account_id: account.id,
            role: account.role,
            tier: account.subscription_tier,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tier(&self) -> SubscriptionTier {
        self.tier
    }
}
