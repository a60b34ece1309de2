//! Static catalog of tradable pairs and their classification.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::UnknownPairError;

/// Classification that selects the pip-value formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairClass {
    Major,
    #[serde(rename = "JPY")]
    Jpy,
    Gold,
    Minor,
}

impl PairClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairClass::Major => "Major",
            PairClass::Jpy => "JPY",
            PairClass::Gold => "Gold",
            PairClass::Minor => "Minor",
        }
    }

    /// Price increment of one pip for this class.
    ///
    /// Gold pips are configurable (see `GoldPipUnit`); this is the widget default.
    pub fn pip_size(&self) -> Decimal {
        match self {
            PairClass::Major | PairClass::Minor => dec!(0.0001),
            PairClass::Jpy | PairClass::Gold => dec!(0.01),
        }
    }
}

/// Immutable metadata for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairDefinition {
    /// Display symbol (e.g., "EUR/USD")
    pub symbol: &'static str,

    /// Pip-value classification
    pub class: PairClass,

    /// Tightest stop-loss that still clears normal noise for this pair
    pub min_stop_loss_pips: u32,

    /// Approximate quote used when no live price is supplied
    pub reference_price: Decimal,
}

impl PairDefinition {
    pub fn base(&self) -> &'static str {
        self.symbol.split('/').next().unwrap_or(self.symbol)
    }

    pub fn quote(&self) -> &'static str {
        self.symbol.split('/').nth(1).unwrap_or("")
    }
}

const CATALOG: &[PairDefinition] = &[
    // Majors
    PairDefinition { symbol: "EUR/USD", class: PairClass::Major, min_stop_loss_pips: 15, reference_price: dec!(1.0850) },
    PairDefinition { symbol: "GBP/USD", class: PairClass::Major, min_stop_loss_pips: 20, reference_price: dec!(1.2750) },
    PairDefinition { symbol: "AUD/USD", class: PairClass::Major, min_stop_loss_pips: 15, reference_price: dec!(0.6550) },
    PairDefinition { symbol: "NZD/USD", class: PairClass::Major, min_stop_loss_pips: 15, reference_price: dec!(0.6000) },
    PairDefinition { symbol: "USD/CHF", class: PairClass::Major, min_stop_loss_pips: 15, reference_price: dec!(0.9050) },
    PairDefinition { symbol: "USD/CAD", class: PairClass::Major, min_stop_loss_pips: 15, reference_price: dec!(1.3650) },
    // JPY crosses
    PairDefinition { symbol: "USD/JPY", class: PairClass::Jpy, min_stop_loss_pips: 25, reference_price: dec!(153.20) },
    PairDefinition { symbol: "EUR/JPY", class: PairClass::Jpy, min_stop_loss_pips: 30, reference_price: dec!(165.00) },
    PairDefinition { symbol: "GBP/JPY", class: PairClass::Jpy, min_stop_loss_pips: 35, reference_price: dec!(193.00) },
    // Commodities
    PairDefinition { symbol: "XAU/USD", class: PairClass::Gold, min_stop_loss_pips: 20, reference_price: dec!(2350.00) },
];

/// Read-only lookup over the static pair table.
pub struct PairCatalog;

impl PairCatalog {
    /// Find a pair by symbol. Case and the `/` separator are ignored.
    pub fn lookup(symbol: &str) -> Result<&'static PairDefinition, UnknownPairError> {
        let wanted = normalize(symbol);
        CATALOG
            .iter()
            .find(|p| normalize(p.symbol) == wanted)
            .ok_or_else(|| UnknownPairError {
                symbol: symbol.to_string(),
            })
    }

    /// Every pair, in display order.
    pub fn all() -> &'static [PairDefinition] {
        CATALOG
    }
}

fn normalize(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !matches!(c, '/' | ' ' | '-' | '_'))
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_separator_and_case() {
        let a = PairCatalog::lookup("XAU/USD").unwrap();
        let b = PairCatalog::lookup("xauusd").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.class, PairClass::Gold);
        assert_eq!(a.min_stop_loss_pips, 20);
    }

    #[test]
    fn test_lookup_unknown_pair() {
        let err = PairCatalog::lookup("BTC/USD").unwrap_err();
        assert_eq!(err.symbol, "BTC/USD");
    }

    #[test]
    fn test_jpy_classification() {
        for symbol in ["USD/JPY", "EUR/JPY", "GBP/JPY"] {
            assert_eq!(PairCatalog::lookup(symbol).unwrap().class, PairClass::Jpy);
        }
        assert_eq!(PairCatalog::lookup("EUR/USD").unwrap().class, PairClass::Major);
    }

    #[test]
    fn test_base_and_quote() {
        let pair = PairCatalog::lookup("USD/CHF").unwrap();
        assert_eq!(pair.base(), "USD");
        assert_eq!(pair.quote(), "CHF");
    }
}
