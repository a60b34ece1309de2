//! Calculator and rate-provider configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{GoldPipUnit, Leverage};

/// Public endpoint quoting every currency against 1 USD.
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Configuration for the calculators and the rate provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Exchange-rate endpoint
    pub rates_url: String,

    /// How long a cached snapshot is trusted, in minutes
    pub rates_cache_ttl_minutes: i64,

    /// HTTP timeout for the rates request, in seconds
    pub http_timeout_secs: u64,

    /// Gold quote used for margin, since no live gold price is sourced
    pub gold_reference_price: Decimal,

    /// Leverage when none is given
    pub default_leverage: Leverage,

    /// Gold pip convention for the risk calculator when none is given
    pub default_gold_pip_unit: GoldPipUnit,

    /// Gold pip convention for pip-value quotes when none is given
    pub quote_gold_pip_unit: GoldPipUnit,

    /// Smallest lot size brokers accept
    pub min_lot_size: Decimal,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            rates_url: DEFAULT_RATES_URL.to_string(),
            rates_cache_ttl_minutes: 30,
            http_timeout_secs: 10,
            gold_reference_price: dec!(2350),
            default_leverage: Leverage::X500,
            default_gold_pip_unit: GoldPipUnit::Dime,
            quote_gold_pip_unit: GoldPipUnit::Cent,
            min_lot_size: dec!(0.01),
        }
    }
}

impl CalculatorConfig {
    pub fn rates_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.rates_cache_ttl_minutes)
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gold_pip_defaults() {
        let config = CalculatorConfig::default();
        assert_eq!(config.default_gold_pip_unit, GoldPipUnit::Dime);
        // Pip-value quotes price gold at $1 per pip per lot
        assert_eq!(config.quote_gold_pip_unit, GoldPipUnit::Cent);
        assert_eq!(config.quote_gold_pip_unit.pip_value_usd(), dec!(1));
    }
}
