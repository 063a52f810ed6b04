//! Account lifecycle: registration, login, renewal and privileged
//! administration.
//!
//! # Invariants
//! - Only a root actor can create or promote a root account.
//! - An actor can never assign a role it does not itself grant.
//! - Login failures for unknown identities and wrong passwords are
//!   indistinguishable, including the work done before answering.

use chrono::{DateTime, Duration, Utc};

use tollgate_core::{AccountId, normalize_email};

use crate::account::{Account, AccountPatch};
use crate::config::AuthConfig;
use crate::credentials::{CredentialStore, validate_password};
use crate::error::AuthError;
use crate::principal::Principal;
use crate::roles::RoleHierarchy;
use crate::store::{StoreError, UserStore};
use crate::subscription::SubscriptionPolicy;
use crate::token::{IssuedToken, TokenService};
use crate::{Role, SubscriptionTier};

/// Lowest role allowed to administer other accounts.
pub const ADMINISTRATION_FLOOR: Role = Role::Admin;

/// Registration input.
#[derive(Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Falls back to the configured default role.
    pub role: Option<Role>,
}

impl core::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// An account together with a freshly issued token.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub token: IssuedToken,
}

/// Settings the lifecycle needs from [`AuthConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub token_ttl: Duration,
    pub default_role: Role,
    pub default_tier: SubscriptionTier,
    pub min_password_length: usize,
}

impl From<&AuthConfig> for LifecycleSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            token_ttl: config.token_ttl(),
            default_role: config.default_role,
            default_tier: config.default_tier,
            min_password_length: config.min_password_length,
        }
    }
}

pub struct AccountLifecycle<S> {
    store: S,
    credentials: CredentialStore,
    tokens: TokenService,
    hierarchy: RoleHierarchy,
    subscriptions: SubscriptionPolicy,
    settings: LifecycleSettings,
}

impl<S> AccountLifecycle<S>
where
    S: UserStore,
{
    pub fn new(
        store: S,
        credentials: CredentialStore,
        tokens: TokenService,
        hierarchy: RoleHierarchy,
        subscriptions: SubscriptionPolicy,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            store,
            credentials,
            tokens,
            hierarchy,
            subscriptions,
            settings,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration & login
    // ─────────────────────────────────────────────────────────────────────────

    pub fn register(
        &self,
        request: RegisterRequest,
        actor: Option<&Principal>,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let role = request.role.unwrap_or(self.settings.default_role);
        let session = self.create(request, role, |lc| lc.ensure_can_assign(actor, role), now)?;

        tracing::info!(
            account_id = %session.account.id,
            role = %session.account.role,
            created_by = ?actor.map(|a| a.account_id()),
            "account registered"
        );
        Ok(session)
    }

    /// Create the first root account.
    ///
    /// Operator path for seeding a fresh deployment; skips the actor guard, so
    /// it must never be reachable from request handling.
    pub fn bootstrap_root(
        &self,
        request: RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let role = self.hierarchy.root();
        let session = self.create(request, role, |_| Ok(()), now)?;

        tracing::warn!(account_id = %session.account.id, "root account bootstrapped");
        Ok(session)
    }

    fn create<G>(
        &self,
        request: RegisterRequest,
        role: Role,
        guard: G,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError>
    where
        G: FnOnce(&Self) -> Result<(), AuthError>,
    {
        let email = normalize_email(&request.email)?;
        validate_password(&request.password, self.settings.min_password_length)?;
        guard(self)?;

        if self.store.find_by_identity(&email)?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.credentials.hash(&request.password)?;
        let account = Account {
            id: AccountId::new(),
            email,
            password_hash,
            role,
            is_active: true,
            subscription_tier: self.settings.default_tier,
            subscription_expires_at: self.subscriptions.expiry_from(now)?,
            created_at: now,
            last_login_at: None,
        };

        let account = self.store.insert(account).map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::DuplicateIdentity,
            other => other.into(),
        })?;

        let token = self
            .tokens
            .issue(account.id, account.role, self.settings.token_ttl, now)?;

        Ok(Session { account, token })
    }

    pub fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let account = match normalize_email(email) {
            Ok(email) => self.store.find_by_identity(&email)?,
            Err(_) => None,
        };

        let account = match account {
            Some(account) if self.credentials.verify(password, &account.password_hash) => account,
            Some(_) => {
                tracing::debug!("login rejected");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                self.credentials.verify_dummy(password);
                tracing::debug!("login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        // Only reachable with the right password, so this leaks nothing.
        if !account.is_active {
            return Err(AuthError::AccountSuspended);
        }

        let account = self.store.update(account.id, AccountPatch::last_login(now))?;
        let token = self
            .tokens
            .issue(account.id, account.role, self.settings.token_ttl, now)?;

        tracing::info!(account_id = %account.id, "login succeeded");

        Ok(Session { account, token })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscription
    // ─────────────────────────────────────────────────────────────────────────

    /// Restart the subscription at `now` on `tier`. Repeated calls overwrite.
    pub fn renew(
        &self,
        account_id: AccountId,
        tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> Result<Account, AuthError> {
        let account = self.load(account_id)?;
        let renewed = self.subscriptions.renew(&account, tier, now)?;

        let account = self.store.update(
            account_id,
            AccountPatch::subscription(renewed.subscription_tier, renewed.subscription_expires_at),
        )?;

        tracing::info!(
            account_id = %account.id,
            tier = %account.subscription_tier,
            expires_at = %account.subscription_expires_at,
            "subscription renewed"
        );

        Ok(account)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_active(
        &self,
        actor: &Principal,
        account_id: AccountId,
        active: bool,
    ) -> Result<Account, AuthError> {
        let target = self.load(account_id)?;
        self.ensure_can_administer(actor, &target)?;

        let account = self.store.update(account_id, AccountPatch::active(active))?;
        tracing::info!(
            account_id = %account.id,
            actor_id = %actor.account_id(),
            active,
            "account activation changed"
        );
        Ok(account)
    }

    pub fn change_role(
        &self,
        actor: &Principal,
        account_id: AccountId,
        role: Role,
    ) -> Result<Account, AuthError> {
        let target = self.load(account_id)?;
        self.ensure_can_administer(actor, &target)?;
        self.ensure_can_assign(Some(actor), role)?;

        let account = self.store.update(account_id, AccountPatch::role(role))?;
        tracing::info!(
            account_id = %account.id,
            actor_id = %actor.account_id(),
            role = %role,
            "account role changed"
        );
        Ok(account)
    }

    pub fn change_password(
        &self,
        account_id: AccountId,
        current: &str,
        new_password: &str,
    ) -> Result<Account, AuthError> {
        let account = self.load(account_id)?;
        if !self.credentials.verify(current, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password(new_password, self.settings.min_password_length)?;

        let hash = self.credentials.hash(new_password)?;
        let account = self.store.update(account_id, AccountPatch::password(hash))?;
        tracing::info!(account_id = %account.id, "password changed");
        Ok(account)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Guards
    // ─────────────────────────────────────────────────────────────────────────

    fn load(&self, account_id: AccountId) -> Result<Account, AuthError> {
        self.store
            .find_by_id(account_id)?
            .ok_or(AuthError::AccountNotFound)
    }

    /// Privilege-escalation guard for handing out `role`.
    ///
    /// Without an actor only roles below [`ADMINISTRATION_FLOOR`] can be
    /// taken. The root role always needs a root actor.
    fn ensure_can_assign(&self, actor: Option<&Principal>, role: Role) -> Result<(), AuthError> {
        let Some(actor) = actor else {
            if self.hierarchy.is_at_least(role, ADMINISTRATION_FLOOR) {
                return Err(AuthError::InsufficientPrivilege);
            }
            return Ok(());
        };
        if self.hierarchy.is_root(role) && !self.hierarchy.is_root(actor.role()) {
            return Err(AuthError::InsufficientPrivilege);
        }
        if !self.hierarchy.grants(actor.role(), role) {
            return Err(AuthError::InsufficientPrivilege);
        }
        Ok(())
    }

    fn ensure_can_administer(&self, actor: &Principal, target: &Account) -> Result<(), AuthError> {
        if !self.hierarchy.is_at_least(actor.role(), ADMINISTRATION_FLOOR) {
            return Err(AuthError::InsufficientPrivilege);
        }
        if !self.hierarchy.grants(actor.role(), target.role) {
            return Err(AuthError::InsufficientPrivilege);
        }
        Ok(())
    }
}
