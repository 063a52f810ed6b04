//! Auth configuration surface.
//!
//! Loaded once at startup and handed to constructors; nothing in the crate
//! reads configuration from globals.

use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;

use crate::lifecycle::ADMINISTRATION_FLOOR;
use crate::{Role, RoleHierarchy, SubscriptionTier};

pub const ENV_PREFIX: &str = "TOLLGATE_";

/// Longest accepted session token lifetime.
pub const MAX_TOKEN_TTL_SECS: i64 = 366 * 24 * 60 * 60;

/// Longest accepted subscription period.
pub const MAX_RENEWAL_PERIOD_SECS: i64 = 10 * 366 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    pub signing_secret: String,
    pub token_ttl_secs: i64,
    /// Argon2 time cost.
    pub password_work_factor: u32,
    pub password_memory_kib: u32,
    pub default_role: Role,
    pub default_tier: SubscriptionTier,
    pub renewal_period_secs: i64,
    /// Whether the pipeline runs the subscription expiry stage.
    pub subscription_check: bool,
    pub min_password_length: usize,
}

impl AuthConfig {
    /// Commodity-price subscription service: 24h tokens, subscription gate on.
    pub fn subscription_service(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            token_ttl_secs: Duration::hours(24).num_seconds(),
            password_work_factor: 2,
            password_memory_kib: 19 * 1024,
            default_role: Role::Viewer,
            default_tier: SubscriptionTier::Standard,
            renewal_period_secs: Duration::days(30).num_seconds(),
            subscription_check: true,
            min_password_length: 6,
        }
    }

    /// Operations tracker: 30-day tokens, no subscription gate.
    pub fn operations(signing_secret: impl Into<String>) -> Self {
        Self {
            token_ttl_secs: Duration::days(30).num_seconds(),
            subscription_check: false,
            ..Self::subscription_service(signing_secret)
        }
    }

    /// Out-of-range values saturate; [`validate`](Self::validate) rejects them.
    pub fn token_ttl(&self) -> Duration {
        Duration::try_seconds(self.token_ttl_secs).unwrap_or(Duration::MAX)
    }

    pub fn renewal_period(&self) -> Duration {
        Duration::try_seconds(self.renewal_period_secs).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.trim().is_empty() {
            return Err(ConfigError::invalid("signing_secret", "must not be empty"));
        }
        check_secs("token_ttl_secs", self.token_ttl_secs, MAX_TOKEN_TTL_SECS)?;
        check_secs(
            "renewal_period_secs",
            self.renewal_period_secs,
            MAX_RENEWAL_PERIOD_SECS,
        )?;
        if self.password_work_factor == 0 {
            return Err(ConfigError::invalid("password_work_factor", "must be at least 1"));
        }
        if self.min_password_length == 0 {
            return Err(ConfigError::invalid("min_password_length", "must be at least 1"));
        }
        if RoleHierarchy::standard().is_at_least(self.default_role, ADMINISTRATION_FLOOR) {
            return Err(ConfigError::invalid(
                "default_role",
                "self-registration cannot default to an administrative role",
            ));
        }
        Ok(())
    }

    /// Load from `TOLLGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test map, ...).
    ///
    /// `TOLLGATE_PROFILE` (`subscription` | `operations`) picks the preset;
    /// individual variables override it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let secret = var("SIGNING_SECRET")
            .ok_or_else(|| ConfigError::Missing(format!("{ENV_PREFIX}SIGNING_SECRET")))?;

        let mut config = match var("PROFILE").as_deref() {
            None | Some("subscription") => Self::subscription_service(secret),
            Some("operations") => Self::operations(secret),
            Some(other) => {
                return Err(ConfigError::invalid(
                    "TOLLGATE_PROFILE",
                    format!("unknown profile '{other}'"),
                ));
            }
        };

        if let Some(v) = var("TOKEN_TTL_SECS") {
            config.token_ttl_secs = parse("TOKEN_TTL_SECS", &v)?;
        }
        if let Some(v) = var("PASSWORD_WORK_FACTOR") {
            config.password_work_factor = parse("PASSWORD_WORK_FACTOR", &v)?;
        }
        if let Some(v) = var("PASSWORD_MEMORY_KIB") {
            config.password_memory_kib = parse("PASSWORD_MEMORY_KIB", &v)?;
        }
        if let Some(v) = var("DEFAULT_ROLE") {
            config.default_role = parse("DEFAULT_ROLE", &v)?;
        }
        if let Some(v) = var("DEFAULT_TIER") {
            config.default_tier = parse("DEFAULT_TIER", &v)?;
        }
        if let Some(v) = var("RENEWAL_PERIOD_SECS") {
            config.renewal_period_secs = parse("RENEWAL_PERIOD_SECS", &v)?;
        }
        if let Some(v) = var("SUBSCRIPTION_CHECK") {
            config.subscription_check = parse("SUBSCRIPTION_CHECK", &v)?;
        }
        if let Some(v) = var("MIN_PASSWORD_LENGTH") {
            config.min_password_length = parse("MIN_PASSWORD_LENGTH", &v)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn check_secs(key: &str, value: i64, max: i64) -> Result<(), ConfigError> {
    if value <= 0 {
        return Err(ConfigError::invalid(key, "must be positive"));
    }
    if value > max {
        return Err(ConfigError::invalid(key, format!("must be at most {max} seconds")));
    }
    Ok(())
}

fn parse<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(&format!("{ENV_PREFIX}{name}"), e.to_string()))
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("password_work_factor", &self.password_work_factor)
            .field("password_memory_kib", &self.password_memory_kib)
            .field("default_role", &self.default_role)
            .field("default_tier", &self.default_tier)
            .field("renewal_period_secs", &self.renewal_period_secs)
            .field("subscription_check", &self.subscription_check)
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}
