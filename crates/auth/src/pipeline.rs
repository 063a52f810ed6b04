//! Per-request authorization pipeline.
//!
//! Stages run in a fixed order and the first failure wins. The driver
//! (`AuthorizationPipeline::evaluate`) is the only place that sequences them;
//! each stage is a standalone function in [`stages`].

use chrono::{DateTime, Utc};

use crate::account::Account;
use crate::claims::Claims;
use crate::error::{AuthError, DenyReason, InternalError};
use crate::principal::Principal;
use crate::roles::RoleHierarchy;
use crate::store::UserStore;
use crate::subscription::SubscriptionPolicy;
use crate::token::TokenService;
use crate::{Feature, Role};

/// What the protected operation needs from the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any authenticated, active (and, if checked, subscribed) account.
    Authenticated,
    /// Account role must grant this role.
    Role(Role),
    /// Account tier must enable this feature.
    Feature(Feature),
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Requirement::Authenticated => f.write_str("authenticated"),
            Requirement::Role(r) => write!(f, "role:{r}"),
            Requirement::Feature(feat) => write!(f, "feature:{feat}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Verify,
    Load,
    ActiveCheck,
    SubscriptionCheck,
    RoleCheck,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Verify => "verify",
            Stage::Load => "load",
            Stage::ActiveCheck => "active_check",
            Stage::SubscriptionCheck => "subscription_check",
            Stage::RoleCheck => "role_check",
        }
    }

    /// Canonical stage order. The subscription stage is optional per deployment.
    pub fn sequence(subscription_check: bool) -> Vec<Stage> {
        let mut stages = vec![Stage::Extract, Stage::Verify, Stage::Load, Stage::ActiveCheck];
        if subscription_check {
            stages.push(Stage::SubscriptionCheck);
        }
        stages.push(Stage::RoleCheck);
        stages
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Allow(Principal),
    Deny(DenyReason),
}

/// Inbound request as far as authorization is concerned.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthRequest<'a> {
    /// Raw `Authorization` header value, if any.
    pub authorization: Option<&'a str>,
}

impl<'a> AuthRequest<'a> {
    pub fn from_header(authorization: Option<&'a str>) -> Self {
        Self { authorization }
    }
}

/// Outcome of a single stage that did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    Deny(DenyReason),
    Internal(InternalError),
}

impl From<DenyReason> for StageFailure {
    fn from(value: DenyReason) -> Self {
        StageFailure::Deny(value)
    }
}

impl From<InternalError> for StageFailure {
    fn from(value: InternalError) -> Self {
        StageFailure::Internal(value)
    }
}

pub mod stages {
    use super::*;

    /// Pull the token out of an `Authorization: Bearer <token>` header value.
    pub fn extract(header: Option<&str>) -> Result<&str, DenyReason> {
        let header = header.ok_or(DenyReason::Unauthenticated)?;
        let (scheme, token) = header
            .trim()
            .split_once(' ')
            .ok_or(DenyReason::Unauthenticated)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(DenyReason::Unauthenticated);
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(DenyReason::Unauthenticated);
        }
        Ok(token)
    }

    pub fn verify(
        tokens: &TokenService,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, DenyReason> {
        tokens.verify(token, now).map_err(DenyReason::TokenInvalid)
    }

    /// The pipeline's only I/O. Store failures are internal, not denials.
    pub fn load<S: UserStore + ?Sized>(
        store: &S,
        claims: &Claims,
    ) -> Result<Account, StageFailure> {
        store
            .find_by_id(claims.sub)
            .map_err(|e| StageFailure::Internal(e.into()))?
            .ok_or(StageFailure::Deny(DenyReason::AccountNotFound))
    }

    pub fn active_check(account: &Account) -> Result<(), DenyReason> {
        if account.is_active {
            Ok(())
        } else {
            Err(DenyReason::AccountSuspended)
        }
    }

    pub fn subscription_check(
        policy: &SubscriptionPolicy,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<(), DenyReason> {
        if policy.is_active(account, now) {
            Ok(())
        } else {
            Err(DenyReason::SubscriptionExpired)
        }
    }

    /// Uses the freshly loaded account, not the role captured in the token.
    pub fn role_check(
        hierarchy: &RoleHierarchy,
        policy: &SubscriptionPolicy,
        account: &Account,
        requirement: Requirement,
    ) -> Result<(), DenyReason> {
        let allowed = match requirement {
            Requirement::Authenticated => true,
            Requirement::Role(required) => hierarchy.grants(account.role, required),
            Requirement::Feature(feature) => policy.has_feature(account.subscription_tier, feature),
        };
        if allowed {
            Ok(())
        } else {
            Err(DenyReason::InsufficientPrivilege)
        }
    }
}

/// Typed progress through the stage list.
enum Progress<'r> {
    Start,
    Extracted(&'r str),
    Verified(Claims),
    Loaded(Account),
}

/// Ordered authorization checks producing `Allow(principal)` or `Deny(reason)`.
pub struct AuthorizationPipeline<S> {
    tokens: TokenService,
    store: S,
    hierarchy: RoleHierarchy,
    subscriptions: SubscriptionPolicy,
    stages: Vec<Stage>,
}

impl<S> AuthorizationPipeline<S>
where
    S: UserStore,
{
    pub fn new(
        tokens: TokenService,
        store: S,
        hierarchy: RoleHierarchy,
        subscriptions: SubscriptionPolicy,
        subscription_check: bool,
    ) -> Self {
        Self {
            tokens,
            store,
            hierarchy,
            subscriptions,
            stages: Stage::sequence(subscription_check),
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order.
    ///
    /// `Ok(Deny(..))` means policy refused the request; `Err` means the store
    /// failed and no decision could be made.
    pub fn evaluate(
        &self,
        request: &AuthRequest<'_>,
        requirement: Requirement,
        now: DateTime<Utc>,
    ) -> Result<AuthorizationDecision, InternalError> {
        let span = tracing::debug_span!("authorize", %requirement);
        let _guard = span.enter();

        let mut progress = Progress::Start;
        for &stage in &self.stages {
            progress = match self.step(stage, progress, request, requirement, now) {
                Ok(next) => next,
                Err(StageFailure::Deny(reason)) => {
                    tracing::debug!(stage = stage.name(), %reason, "request denied");
                    return Ok(AuthorizationDecision::Deny(reason));
                }
                Err(StageFailure::Internal(err)) => {
                    tracing::error!(stage = stage.name(), error = %err, "authorization aborted");
                    return Err(err);
                }
            };
        }

        match progress {
            Progress::Loaded(account) => {
                tracing::debug!(account_id = %account.id, "request allowed");
                Ok(AuthorizationDecision::Allow(Principal::from_account(&account)))
            }
            _ => Err(InternalError::new("stage list ended before an account was loaded")),
        }
    }

    /// [`evaluate`](Self::evaluate) with denials folded into `AuthError`.
    pub fn authorize(
        &self,
        request: &AuthRequest<'_>,
        requirement: Requirement,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        match self.evaluate(request, requirement, now)? {
            AuthorizationDecision::Allow(principal) => Ok(principal),
            AuthorizationDecision::Deny(reason) => Err(reason.into()),
        }
    }

    fn step<'r>(
        &self,
        stage: Stage,
        progress: Progress<'r>,
        request: &AuthRequest<'r>,
        requirement: Requirement,
        now: DateTime<Utc>,
    ) -> Result<Progress<'r>, StageFailure> {
        match (stage, progress) {
            (Stage::Extract, Progress::Start) => {
                Ok(Progress::Extracted(stages::extract(request.authorization)?))
            }
            (Stage::Verify, Progress::Extracted(token)) => {
                Ok(Progress::Verified(stages::verify(&self.tokens, token, now)?))
            }
            (Stage::Load, Progress::Verified(claims)) => {
                Ok(Progress::Loaded(stages::load(&self.store, &claims)?))
            }
            (Stage::ActiveCheck, Progress::Loaded(account)) => {
                stages::active_check(&account)?;
                Ok(Progress::Loaded(account))
            }
            (Stage::SubscriptionCheck, Progress::Loaded(account)) => {
                stages::subscription_check(&self.subscriptions, &account, now)?;
                Ok(Progress::Loaded(account))
            }
            (Stage::RoleCheck, Progress::Loaded(account)) => {
                stages::role_check(&self.hierarchy, &self.subscriptions, &account, requirement)?;
                Ok(Progress::Loaded(account))
            }
            (stage, _) => Err(StageFailure::Internal(InternalError::new(format!(
                "stage '{}' reached out of order",
                stage.name()
            )))),
        }
    }
}
