//! Registry configuration.

use serde::{Deserialize, Serialize};
use std::env;

use crate::domain::entities::PriceTable;
use crate::domain::errors::RegistryError;
use crate::domain::value_objects::MAX_REGISTRATION_YEARS;

/// Default token symbol.
pub const DEFAULT_SYMBOL: &str = "QNS";

/// Default CNAME redirect budget for `resolve`.
pub const DEFAULT_MAX_REDIRECTS: i32 = 2;

/// Upper bound for any single price table entry.
pub const DEFAULT_MAX_PRICE: i64 = 1_000_000_000_000;

/// Default price for names not listed in the table.
pub const DEFAULT_REGISTER_PRICE: i64 = 1_000_000_000;

/// Registry configuration.
///
/// Every field has a default, so a partial JSON document is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Token symbol reported by `symbol()`.
    pub symbol: String,
    /// CNAME hops `resolve` may follow.
    pub max_redirects: i32,
    /// Renewal ceiling: expiration may never pass `now + max_renewal_years`.
    pub max_renewal_years: u64,
    /// Price table written on first start; index 0 is the default.
    pub initial_prices: Vec<i64>,
    /// Largest price `set_price_table` accepts.
    pub max_price: i64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_renewal_years: MAX_REGISTRATION_YEARS,
            // One- to four-character leaves are reserved to governance.
            initial_prices: vec![DEFAULT_REGISTER_PRICE, -1, -1, -1, -1],
            max_price: DEFAULT_MAX_PRICE,
        }
    }
}

impl RegistryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QNS_SYMBOL`: token symbol (default: QNS)
    /// - `QNS_MAX_REDIRECTS`: resolve budget (default: 2)
    /// - `QNS_MAX_RENEWAL_YEARS`: renewal ceiling (default: 10)
    /// - `QNS_PRICES`: comma-separated initial price table
    /// - `QNS_MAX_PRICE`: price ceiling
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            symbol: env::var("QNS_SYMBOL").unwrap_or(defaults.symbol),
            max_redirects: parse_var("QNS_MAX_REDIRECTS").unwrap_or(defaults.max_redirects),
            max_renewal_years: parse_var("QNS_MAX_RENEWAL_YEARS")
                .unwrap_or(defaults.max_renewal_years),
            initial_prices: env::var("QNS_PRICES")
                .ok()
                .and_then(|v| parse_prices(&v))
                .unwrap_or(defaults.initial_prices),
            max_price: parse_var("QNS_MAX_PRICE").unwrap_or(defaults.max_price),
        }
    }

    /// Check ranges and the initial price table.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.symbol.is_empty() {
            return Err(RegistryError::out_of_range("symbol", "must not be empty"));
        }
        if self.max_redirects < 0 {
            return Err(RegistryError::out_of_range(
                "max_redirects",
                format!("{} is negative", self.max_redirects),
            ));
        }
        if !(1..=MAX_REGISTRATION_YEARS).contains(&self.max_renewal_years) {
            return Err(RegistryError::out_of_range(
                "max_renewal_years",
                format!("{} outside 1..={MAX_REGISTRATION_YEARS}", self.max_renewal_years),
            ));
        }
        if self.max_price < 0 {
            return Err(RegistryError::out_of_range("max_price", "must not be negative"));
        }
        self.price_table().map(|_| ())
    }

    /// The initial price table, validated against `max_price`.
    pub fn price_table(&self) -> Result<PriceTable, RegistryError> {
        PriceTable::new(self.initial_prices.clone(), self.max_price)
    }

    /// Builder-style method to set the redirect budget.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: i32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Builder-style method to set the initial price table.
    #[must_use]
    pub fn with_prices(mut self, prices: Vec<i64>) -> Self {
        self.initial_prices = prices;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_prices(value: &str) -> Option<Vec<i64>> {
    value
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<Vec<i64>>>()
        .filter(|prices| !prices.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RegistryConfig::default();
        assert_eq!(config.symbol, "QNS");
        assert_eq!(config.max_redirects, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RegistryConfig = serde_json::from_str(r#"{"max_redirects": 5}"#).unwrap();
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.max_renewal_years, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RegistryConfig::default()
            .with_max_redirects(-1)
            .validate()
            .is_err());
        assert!(RegistryConfig::default().with_prices(vec![]).validate().is_err());
        assert!(RegistryConfig::default()
            .with_prices(vec![DEFAULT_MAX_PRICE + 1])
            .validate()
            .is_err());

        let mut config = RegistryConfig::default();
        config.max_renewal_years = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_prices() {
        assert_eq!(parse_prices("100, -1,5"), Some(vec![100, -1, 5]));
        assert_eq!(parse_prices("100,x"), None);
    }
}
