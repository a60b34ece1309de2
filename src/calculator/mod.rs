//! Calculation core: position sizing, margin, drawdown and pip math.

mod config;
mod pip;
mod risk;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub use config::CalculatorConfig;
pub use pip::{parse_price, AssetType, Direction, PipCalculator};
pub use risk::RiskCalculator;

/// Units in one standard lot.
pub(crate) const STANDARD_LOT_UNITS: Decimal = dec!(100000);

/// Ounces in one standard gold lot.
pub(crate) const GOLD_LOT_OUNCES: Decimal = dec!(100);

/// Display rounding shared by every calculator output.
pub(crate) fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
