use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feature flag gated by a subscription tier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    LivePrices,
    PriceAlerts,
    HistoricalData,
    CsvExport,
    ApiAccess,
    PrioritySupport,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::LivePrices,
        Feature::PriceAlerts,
        Feature::HistoricalData,
        Feature::CsvExport,
        Feature::ApiAccess,
        Feature::PrioritySupport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::LivePrices => "live_prices",
            Feature::PriceAlerts => "price_alerts",
            Feature::HistoricalData => "historical_data",
            Feature::CsvExport => "csv_export",
            Feature::ApiAccess => "api_access",
            Feature::PrioritySupport => "priority_support",
        }
    }
}

impl core::fmt::Display for Feature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown feature '{0}'")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_name() {
        for feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>().unwrap(), feature);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(
            "teleport".parse::<Feature>(),
            Err(UnknownFeature("teleport".to_string()))
        );
    }
}
