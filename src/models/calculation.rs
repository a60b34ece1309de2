//! Inputs and results of the risk calculator.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::Currency;

/// Which quantity the calculator solves for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CalculationMode {
    /// Given a stop-loss, find the lot size
    #[default]
    SolveForLots,
    /// Given a lot size, find the stop-loss that risks the chosen amount
    SolveForStopLoss,
}

/// How the risk value should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskUnit {
    Percentage,
    Amount,
}

/// Risk per trade, as a percentage of balance or an absolute amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSpec {
    pub unit: RiskUnit,
    pub value: Decimal,
}

impl RiskSpec {
    pub fn percentage(value: Decimal) -> Self {
        Self {
            unit: RiskUnit::Percentage,
            value,
        }
    }

    pub fn amount(value: Decimal) -> Self {
        Self {
            unit: RiskUnit::Amount,
            value,
        }
    }
}

/// Broker leverage ratios offered by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Leverage {
    #[serde(rename = "1:10")]
    X10,
    #[serde(rename = "1:20")]
    X20,
    #[serde(rename = "1:30")]
    X30,
    #[serde(rename = "1:50")]
    X50,
    #[serde(rename = "1:100")]
    X100,
    #[serde(rename = "1:200")]
    X200,
    #[default]
    #[serde(rename = "1:500")]
    X500,
    #[serde(rename = "1:1000")]
    X1000,
}

impl Leverage {
    pub const ALL: [Leverage; 8] = [
        Leverage::X10,
        Leverage::X20,
        Leverage::X30,
        Leverage::X50,
        Leverage::X100,
        Leverage::X200,
        Leverage::X500,
        Leverage::X1000,
    ];

    pub fn ratio(&self) -> u32 {
        match self {
            Leverage::X10 => 10,
            Leverage::X20 => 20,
            Leverage::X30 => 30,
            Leverage::X50 => 50,
            Leverage::X100 => 100,
            Leverage::X200 => 200,
            Leverage::X500 => 500,
            Leverage::X1000 => 1000,
        }
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1:{}", self.ratio())
    }
}

impl FromStr for Leverage {
    type Err = String;

    /// Accepts "1:500", "500:1" or a bare "500".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ratio = s
            .trim()
            .split(':')
            .map(str::trim)
            .find(|part| *part != "1")
            .unwrap_or("1");

        let ratio: u32 = ratio
            .parse()
            .map_err(|_| format!("invalid leverage: {}", s))?;

        Leverage::ALL
            .into_iter()
            .find(|l| l.ratio() == ratio)
            .ok_or_else(|| format!("unsupported leverage: {}", s))
    }
}

/// Price move that counts as one pip on gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GoldPipUnit {
    #[serde(rename = "0.01")]
    Cent,
    #[default]
    #[serde(rename = "0.10")]
    Dime,
    #[serde(rename = "1.00")]
    Dollar,
}

impl GoldPipUnit {
    /// Price increment of one pip.
    pub fn size(&self) -> Decimal {
        match self {
            GoldPipUnit::Cent => dec!(0.01),
            GoldPipUnit::Dime => dec!(0.10),
            GoldPipUnit::Dollar => dec!(1.00),
        }
    }

    /// USD per pip for one standard lot (100 oz).
    pub fn pip_value_usd(&self) -> Decimal {
        self.size() * dec!(100)
    }
}

impl FromStr for GoldPipUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Decimal = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid gold pip unit: {}", s))?;

        if value == dec!(0.01) {
            Ok(GoldPipUnit::Cent)
        } else if value == dec!(0.1) {
            Ok(GoldPipUnit::Dime)
        } else if value == dec!(1) {
            Ok(GoldPipUnit::Dollar)
        } else {
            Err(format!("unsupported gold pip unit: {} (use 0.01, 0.10 or 1.00)", s))
        }
    }
}

/// Everything the risk calculator needs from the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationInputs {
    pub mode: CalculationMode,
    pub account_balance: Decimal,
    #[serde(default)]
    pub account_currency: Currency,
    pub pair_symbol: String,
    /// Required when solving for lots
    pub stop_loss_pips: Option<Decimal>,
    #[serde(default)]
    pub spread_pips: Decimal,
    /// Required when solving for stop-loss
    pub lot_size: Option<Decimal>,
    pub risk: RiskSpec,
    #[serde(default)]
    pub leverage: Leverage,
    pub gold_pip_unit: Option<GoldPipUnit>,
    pub target_profit_pips: Option<Decimal>,
}

impl CalculationInputs {
    /// Solve-for-lots inputs with a percentage risk, USD account and no spread.
    pub fn solve_for_lots(
        balance: Decimal,
        pair_symbol: impl Into<String>,
        stop_loss_pips: Decimal,
        risk: RiskSpec,
    ) -> Self {
        Self {
            mode: CalculationMode::SolveForLots,
            account_balance: balance,
            account_currency: Currency::Usd,
            pair_symbol: pair_symbol.into(),
            stop_loss_pips: Some(stop_loss_pips),
            spread_pips: Decimal::ZERO,
            lot_size: None,
            risk,
            leverage: Leverage::default(),
            gold_pip_unit: None,
            target_profit_pips: None,
        }
    }

    pub fn solve_for_stop_loss(
        balance: Decimal,
        pair_symbol: impl Into<String>,
        lot_size: Decimal,
        risk: RiskSpec,
    ) -> Self {
        Self {
            mode: CalculationMode::SolveForStopLoss,
            stop_loss_pips: None,
            lot_size: Some(lot_size),
            ..Self::solve_for_lots(balance, pair_symbol, Decimal::ZERO, risk)
        }
    }
}

/// Lot size expressed in the common broker units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionSize {
    pub lots: Decimal,
    pub units: Decimal,
    pub mini_lots: Decimal,
    pub micro_lots: Decimal,
}

/// Amount at risk in the account currency with USD and INR equivalents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAmount {
    pub account: Decimal,
    pub usd: Decimal,
    pub inr: Decimal,
}

/// Share of the account tied up as margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MarginStatus {
    Safe,
    Caution,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarginUsage {
    pub required: Decimal,
    pub percent: Decimal,
    pub status: MarginStatus,
}

/// Severity of a run of consecutive losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DrawdownStatus {
    Safe,
    Caution,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawdownScenario {
    pub consecutive_losses: u32,
    pub loss_amount: Decimal,
    pub remaining_balance: Decimal,
    pub drawdown_percent: Decimal,
    pub status: DrawdownStatus,
}

/// Benchmark band for the risk taken per trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskTier {
    UltraSafe,
    Conservative,
    Standard,
    Aggressive,
    Reckless,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::UltraSafe => "Ultra-Safe",
            RiskTier::Conservative => "Conservative",
            RiskTier::Standard => "Standard",
            RiskTier::Aggressive => "Aggressive",
            RiskTier::Reckless => "Reckless",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum TradeQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

/// Reward relative to risk when a profit target is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskReward {
    pub ratio: Decimal,
    pub potential_profit: Decimal,
    /// Win rate (percent) needed to break even at this ratio
    pub min_win_rate: Decimal,
    pub quality: TradeQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum WarningSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Informational notice attached to a result. Never blocks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationWarning {
    pub severity: WarningSeverity,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_min_balance: Option<Decimal>,
}

/// Provenance of the rates behind a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultMeta {
    pub rates_captured_at: DateTime<Utc>,
    pub rates_used: Vec<String>,
}

/// Everything derived from one set of inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationResult {
    pub mode: CalculationMode,
    pub position_size: PositionSize,
    pub risk_amount: RiskAmount,
    /// Risk as a percentage of balance, whichever unit was entered
    pub risk_percent: Decimal,
    pub margin: MarginUsage,
    /// Per pip, per standard lot, in the account currency
    pub pip_value: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_stop_loss_pips: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reward: Option<RiskReward>,
    pub drawdown_scenarios: Vec<DrawdownScenario>,
    pub risk_tier: RiskTier,
    pub warnings: Vec<CalculationWarning>,
    pub meta: ResultMeta,
}

impl CalculationResult {
    pub fn has_warning(&self, title: &str) -> bool {
        self.warnings.iter().any(|w| w.title == title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leverage_parse() {
        assert_eq!("1:500".parse::<Leverage>().unwrap(), Leverage::X500);
        assert_eq!("200:1".parse::<Leverage>().unwrap(), Leverage::X200);
        assert_eq!("30".parse::<Leverage>().unwrap(), Leverage::X30);
        assert!("1:400".parse::<Leverage>().is_err());
        assert!("abc".parse::<Leverage>().is_err());
    }

    #[test]
    fn test_leverage_display() {
        assert_eq!(Leverage::X1000.to_string(), "1:1000");
    }

    #[test]
    fn test_gold_pip_unit() {
        assert_eq!("0.10".parse::<GoldPipUnit>().unwrap(), GoldPipUnit::Dime);
        assert_eq!("1".parse::<GoldPipUnit>().unwrap(), GoldPipUnit::Dollar);
        assert!("0.5".parse::<GoldPipUnit>().is_err());

        assert_eq!(GoldPipUnit::Cent.pip_value_usd(), dec!(1));
        assert_eq!(GoldPipUnit::Dime.pip_value_usd(), dec!(10));
        assert_eq!(GoldPipUnit::Dollar.pip_value_usd(), dec!(100));
    }

    #[test]
    fn test_solve_for_stop_loss_builder() {
        let inputs =
            CalculationInputs::solve_for_stop_loss(dec!(1000), "EUR/USD", dec!(0.1), RiskSpec::percentage(dec!(1)));
        assert_eq!(inputs.mode, CalculationMode::SolveForStopLoss);
        assert_eq!(inputs.stop_loss_pips, None);
        assert_eq!(inputs.lot_size, Some(dec!(0.1)));
    }
}
