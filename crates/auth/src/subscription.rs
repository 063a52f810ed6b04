//! Subscription tiers, feature gating and expiry.

use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Feature;
use crate::account::Account;
use crate::error::InternalError;

/// Purchased service level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Standard,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [
        SubscriptionTier::Standard,
        SubscriptionTier::Pro,
        SubscriptionTier::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Standard => "standard",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }

    /// Features enabled by this tier.
    pub fn features(&self) -> &'static [Feature] {
        match self {
            SubscriptionTier::Standard => &[Feature::LivePrices],
            SubscriptionTier::Pro => &[
                Feature::LivePrices,
                Feature::PriceAlerts,
                Feature::HistoricalData,
                Feature::CsvExport,
            ],
            SubscriptionTier::Enterprise => &Feature::ALL,
        }
    }
}

impl core::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown subscription tier '{0}'")]
pub struct UnknownTier(pub String);

impl FromStr for SubscriptionTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionTier::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTier(s.to_string()))
    }
}

/// Expiry and feature rules for subscriptions.
///
/// Pure: every check takes `now` explicitly and nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionPolicy {
    renewal_period: Duration,
}

impl SubscriptionPolicy {
    pub fn new(renewal_period: Duration) -> Self {
        Self { renewal_period }
    }

    pub fn renewal_period(&self) -> Duration {
        self.renewal_period
    }

    /// Expiry is exclusive: at `now == expires_at` the subscription has lapsed.
    pub fn is_active(&self, account: &Account, now: DateTime<Utc>) -> bool {
        account.subscription_expires_at > now
    }

    pub fn has_feature(&self, tier: SubscriptionTier, feature: Feature) -> bool {
        tier.features().contains(&feature)
    }

    /// Untyped lookup; an unknown tier or feature is never enabled.
    pub fn has_feature_str(&self, tier: &str, feature: &str) -> bool {
        match (tier.parse::<SubscriptionTier>(), feature.parse::<Feature>()) {
            (Ok(tier), Ok(feature)) => self.has_feature(tier, feature),
            _ => false,
        }
    }

    /// Expiry for a subscription (re)started at `now`.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, InternalError> {
        now.checked_add_signed(self.renewal_period)
            .ok_or_else(|| InternalError::new("subscription expiry is out of range"))
    }

    /// Switch to `new_tier` with a fresh period starting at `now`.
    ///
    /// Overwrites the previous expiry instead of extending it.
    pub fn renew(
        &self,
        account: &Account,
        new_tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> Result<Account, InternalError> {
        let mut renewed = account.clone();
        renewed.subscription_tier = new_tier;
        renewed.subscription_expires_at = self.expiry_from(now)?;
        Ok(renewed)
    }
}

impl Default for SubscriptionPolicy {
    fn default() -> Self {
        Self::new(Duration::days(30))
    }
}
