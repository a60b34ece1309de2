//! Pip calculator: distance and P&L between two prices, and per-pair pip value.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{GoldPipUnit, PairClass, PairDefinition};

use super::{round_to, GOLD_LOT_OUNCES, STANDARD_LOT_UNITS};

/// USD per pip per standard lot used for profit/loss.
const PIP_VALUE_PER_LOT: Decimal = dec!(10);

/// How a price difference converts into pips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    /// Four-decimal quotes (EUR/USD)
    Standard,
    /// Two-decimal quotes (USD/JPY)
    JpyStyle,
    /// Gold quoted with the modern 0.01 pip
    Gold,
}

impl AssetType {
    /// Pips per 1.0 of price movement.
    pub fn pips_per_unit(&self) -> Decimal {
        match self {
            AssetType::Standard => dec!(10000),
            AssetType::JpyStyle | AssetType::Gold => dec!(100),
        }
    }

    pub fn for_pair(pair: &PairDefinition) -> Self {
        match pair.class {
            PairClass::Major | PairClass::Minor => AssetType::Standard,
            PairClass::Jpy => AssetType::JpyStyle,
            PairClass::Gold => AssetType::Gold,
        }
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "std" | "forex" => Ok(AssetType::Standard),
            "jpy" | "jpy_style" | "jpystyle" => Ok(AssetType::JpyStyle),
            "gold" | "xau" => Ok(AssetType::Gold),
            other => Err(format!("unknown asset type: {}", other)),
        }
    }
}

/// Direction of the trade being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "LONG" => Ok(Direction::Buy),
            "SELL" | "SHORT" => Ok(Direction::Sell),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Pips captured between entry and exit, and what they are worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipDistance {
    pub pips: Decimal,
    pub profit_loss: Decimal,
}

/// Value of one pip for a position, and of a given pip move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipValueQuote {
    pub pip_value: Decimal,
    pub total: Decimal,
}

/// Parse a user-entered price. Blank or non-numeric input yields `None`.
pub fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<Decimal>().ok())
}

/// Stateless pip math.
pub struct PipCalculator;

impl PipCalculator {
    /// Pips and profit/loss between two prices.
    ///
    /// Returns `None` when either price is missing; that is insufficient
    /// input, not an error. Also `None` when the move is too large to
    /// represent. Spread is always charged against the trader.
    pub fn compute_pip_distance(
        price_open: Option<Decimal>,
        price_close: Option<Decimal>,
        asset: AssetType,
        direction: Direction,
        lot_size: Decimal,
        spread_pips: Decimal,
    ) -> Option<PipDistance> {
        let (open, close) = (price_open?, price_close?);

        let diff = match direction {
            Direction::Buy => close.checked_sub(open)?,
            Direction::Sell => open.checked_sub(close)?,
        };
        let pips = diff
            .checked_mul(asset.pips_per_unit())?
            .checked_sub(spread_pips)?;
        let profit_loss = pips
            .checked_mul(lot_size)?
            .checked_mul(PIP_VALUE_PER_LOT)?;

        Some(PipDistance {
            pips: round_to(pips, 1),
            profit_loss: round_to(profit_loss, 2),
        })
    }

    /// Value per pip for `lots` of `pair`, and the value of a `pips` move.
    ///
    /// USD-quoted pairs are worth a fixed amount per pip, USD-based pairs
    /// divide by the price (the catalog reference price if none is given),
    /// gold follows the chosen pip unit. Crosses without a USD leg have no
    /// direct conversion and quote zero. `None` when the position is too
    /// large to represent.
    pub fn quote_pip_value(
        pair: &PairDefinition,
        lots: Decimal,
        pips: Decimal,
        price: Option<Decimal>,
        gold_pip_unit: GoldPipUnit,
    ) -> Option<PipValueQuote> {
        if lots <= Decimal::ZERO {
            return Some(PipValueQuote {
                pip_value: Decimal::ZERO,
                total: Decimal::ZERO,
            });
        }

        let price = price
            .filter(|p| *p > Decimal::ZERO)
            .unwrap_or(pair.reference_price);

        let pip_value = if pair.class == PairClass::Gold {
            lots.checked_mul(GOLD_LOT_OUNCES)?
                .checked_mul(gold_pip_unit.size())?
        } else if pair.quote() == "USD" {
            lots.checked_mul(STANDARD_LOT_UNITS)?
                .checked_mul(pair.class.pip_size())?
        } else if pair.base() == "USD" && price > Decimal::ZERO {
            lots.checked_mul(STANDARD_LOT_UNITS)?
                .checked_mul(pair.class.pip_size())?
                .checked_div(price)?
        } else {
            debug!(pair = pair.symbol, "No USD leg; pip value unavailable");
            Decimal::ZERO
        };

        Some(PipValueQuote {
            pip_value: round_to(pip_value, 2),
            total: round_to(pip_value.checked_mul(pips)?, 2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PairCatalog;

    #[test]
    fn test_buy_with_spread() {
        let result = PipCalculator::compute_pip_distance(
            Some(dec!(1.0000)),
            Some(dec!(1.0050)),
            AssetType::Standard,
            Direction::Buy,
            dec!(1.0),
            dec!(1),
        )
        .unwrap();

        assert_eq!(result.pips, dec!(49.0));
        assert_eq!(result.profit_loss, dec!(490.00));
    }

    #[test]
    fn test_sell_profits_when_price_falls() {
        let result = PipCalculator::compute_pip_distance(
            Some(dec!(153.50)),
            Some(dec!(153.20)),
            AssetType::JpyStyle,
            Direction::Sell,
            dec!(0.5),
            Decimal::ZERO,
        )
        .unwrap();

        assert_eq!(result.pips, dec!(30));
        assert_eq!(result.profit_loss, dec!(150));
    }

    #[test]
    fn test_losing_trade_goes_negative() {
        let result = PipCalculator::compute_pip_distance(
            Some(dec!(2350.00)),
            Some(dec!(2349.00)),
            AssetType::Gold,
            Direction::Buy,
            dec!(0.1),
            dec!(2),
        )
        .unwrap();

        // -100 pips minus 2 pips spread
        assert_eq!(result.pips, dec!(-102));
        assert_eq!(result.profit_loss, dec!(-102));
    }

    #[test]
    fn test_missing_price_is_not_an_error() {
        assert!(PipCalculator::compute_pip_distance(
            None,
            Some(dec!(1.1)),
            AssetType::Standard,
            Direction::Buy,
            dec!(1),
            Decimal::ZERO,
        )
        .is_none());

        assert_eq!(parse_price(Some("abc")), None);
        assert_eq!(parse_price(Some("  ")), None);
        assert_eq!(parse_price(None), None);
        assert_eq!(parse_price(Some(" 1.0850 ")), Some(dec!(1.0850)));
    }

    #[test]
    fn test_quote_pip_value_usd_quoted() {
        let pair = PairCatalog::lookup("EUR/USD").unwrap();
        let quote = PipCalculator::quote_pip_value(pair, dec!(1), dec!(10), None, GoldPipUnit::Dime)
            .unwrap();

        assert_eq!(quote.pip_value, dec!(10));
        assert_eq!(quote.total, dec!(100));
    }

    #[test]
    fn test_quote_pip_value_usd_based() {
        let pair = PairCatalog::lookup("USD/JPY").unwrap();

        // 100,000 * 0.01 / 153.20
        let quote = PipCalculator::quote_pip_value(pair, dec!(1), dec!(10), None, GoldPipUnit::Dime)
            .unwrap();
        assert_eq!(quote.pip_value, dec!(6.53));

        let quote =
            PipCalculator::quote_pip_value(pair, dec!(1), dec!(10), Some(dec!(100)), GoldPipUnit::Dime)
                .unwrap();
        assert_eq!(quote.pip_value, dec!(10));
        assert_eq!(quote.total, dec!(100));
    }

    #[test]
    fn test_quote_pip_value_gold_and_cross() {
        let gold = PairCatalog::lookup("XAU/USD").unwrap();
        let quote = PipCalculator::quote_pip_value(gold, dec!(1), dec!(5), None, GoldPipUnit::Cent)
            .unwrap();
        assert_eq!(quote.pip_value, dec!(1));
        assert_eq!(quote.total, dec!(5));

        let cross = PairCatalog::lookup("EUR/JPY").unwrap();
        let quote = PipCalculator::quote_pip_value(cross, dec!(1), dec!(5), None, GoldPipUnit::Dime)
            .unwrap();
        assert_eq!(quote.pip_value, Decimal::ZERO);
    }

    #[test]
    fn test_quote_pip_value_rejects_empty_position() {
        let pair = PairCatalog::lookup("GBP/USD").unwrap();
        let quote = PipCalculator::quote_pip_value(pair, Decimal::ZERO, dec!(5), None, GoldPipUnit::Dime)
            .unwrap();
        assert_eq!(quote.pip_value, Decimal::ZERO);
    }

    #[test]
    fn test_quote_pip_value_usd_based_non_jpy() {
        let pair = PairCatalog::lookup("USD/CHF").unwrap();

        // 100,000 * 0.0001 / 0.9050
        let quote = PipCalculator::quote_pip_value(pair, dec!(1), dec!(10), None, GoldPipUnit::Dime)
            .unwrap();
        assert_eq!(quote.pip_value, dec!(11.05));
        assert_eq!(quote.total, dec!(110.50));
    }

    #[test]
    fn test_overflow_yields_none() {
        assert!(PipCalculator::compute_pip_distance(
            Some(Decimal::ZERO),
            Some(Decimal::MAX),
            AssetType::Standard,
            Direction::Buy,
            dec!(1),
            Decimal::ZERO,
        )
        .is_none());

        let pair = PairCatalog::lookup("EUR/USD").unwrap();
        assert!(
            PipCalculator::quote_pip_value(pair, Decimal::MAX, dec!(1), None, GoldPipUnit::Dime)
                .is_none()
        );
    }

    #[test]
    fn test_asset_type_for_pair() {
        assert_eq!(
            AssetType::for_pair(PairCatalog::lookup("GBP/JPY").unwrap()),
            AssetType::JpyStyle
        );
        assert_eq!("gold".parse::<AssetType>().unwrap(), AssetType::Gold);
        assert_eq!("short".parse::<Direction>().unwrap(), Direction::Sell);
    }
}
