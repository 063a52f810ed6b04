//! Wiring: build every auth component from one [`AuthConfig`].

use crate::config::{AuthConfig, ConfigError};
use crate::credentials::CredentialStore;
use crate::error::InternalError;
use crate::lifecycle::{AccountLifecycle, LifecycleSettings};
use crate::pipeline::AuthorizationPipeline;
use crate::roles::RoleHierarchy;
use crate::store::UserStore;
use crate::subscription::SubscriptionPolicy;
use crate::token::TokenService;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// The authorization pipeline and account lifecycle sharing one store,
/// signing secret and policy set.
pub struct AuthCore<S> {
    pub pipeline: AuthorizationPipeline<S>,
    pub lifecycle: AccountLifecycle<S>,
}

impl<S> AuthCore<S>
where
    S: UserStore + Clone,
{
    pub fn from_config(config: &AuthConfig, store: S) -> Result<Self, SetupError> {
        Self::with_hierarchy(config, store, RoleHierarchy::standard())
    }

    pub fn with_hierarchy(
        config: &AuthConfig,
        store: S,
        hierarchy: RoleHierarchy,
    ) -> Result<Self, SetupError> {
        let tokens = TokenService::new(config.signing_secret.as_bytes());
        Self::assemble(config, store, hierarchy, tokens)
    }

    /// Build around a prepared token service, typically one returned by
    /// [`TokenService::rotate`] so tokens signed with the previous secret keep
    /// verifying until the grace instant.
    ///
    /// `config.signing_secret` is not used on this path.
    pub fn with_tokens(
        config: &AuthConfig,
        store: S,
        tokens: TokenService,
    ) -> Result<Self, SetupError> {
        Self::assemble(config, store, RoleHierarchy::standard(), tokens)
    }

    fn assemble(
        config: &AuthConfig,
        store: S,
        hierarchy: RoleHierarchy,
        tokens: TokenService,
    ) -> Result<Self, SetupError> {
        config.validate()?;

        let credentials =
            CredentialStore::new(config.password_work_factor, config.password_memory_kib)?;
        let subscriptions = SubscriptionPolicy::new(config.renewal_period());

        let pipeline = AuthorizationPipeline::new(
            tokens.clone(),
            store.clone(),
            hierarchy.clone(),
            subscriptions,
            config.subscription_check,
        );
        let lifecycle = AccountLifecycle::new(
            store,
            credentials,
            tokens,
            hierarchy,
            subscriptions,
            LifecycleSettings::from(config),
        );

        tracing::info!(
            subscription_check = config.subscription_check,
            token_ttl_secs = config.token_ttl_secs,
            "auth core initialized"
        );

        Ok(Self { pipeline, lifecycle })
    }
}
