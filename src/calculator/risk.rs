//! Risk calculator: lot size or stop-loss from account risk, plus margin,
//! drawdown and warning analysis.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::InvalidInputError;
use crate::models::{
    CalculationInputs, CalculationMode, CalculationResult, CalculationWarning, Currency,
    DrawdownScenario, DrawdownStatus, MarginStatus, MarginUsage, PairCatalog, PairClass,
    PairDefinition, PositionSize, RatesSnapshot, ResultMeta, RiskAmount, RiskReward, RiskTier,
    RiskUnit, TradeQuality, WarningSeverity,
};

use super::{round_to, CalculatorConfig, GOLD_LOT_OUNCES, STANDARD_LOT_UNITS};

/// USD per pip per standard lot for majors and minors.
const FLAT_PIP_VALUE_USD: Decimal = dec!(10);

/// Yen per pip on one standard lot: 100,000 units at 0.01.
const JPY_PIP_VALUE_NUMERATOR: Decimal = dec!(1000);

/// JPY pip value when no usable USD/JPY rate is available.
const FALLBACK_JPY_PIP_VALUE_USD: Decimal = dec!(6.66);

/// Consecutive-loss runs modelled in every result.
const DRAWDOWN_RUNS: [u32; 4] = [2, 3, 5, 10];

pub const WARNING_HIGH_MARGIN: &str = "High Margin Usage";
pub const WARNING_POSITION_TOO_SMALL: &str = "Position Too Small";
pub const WARNING_RECKLESS_RISK: &str = "Reckless Risk";
pub const WARNING_TIGHT_STOP: &str = "Tight Stop Loss";
pub const WARNING_APPROXIMATE_PIP_VALUE: &str = "Approximate Pip Value";

/// What the active mode is solving from, after validation.
#[derive(Clone, Copy)]
enum Solve {
    Lots { stop_loss_pips: Decimal },
    StopLoss { lot_size: Decimal },
}

/// Pure calculator for position size and the risk picture around it.
pub struct RiskCalculator {
    config: CalculatorConfig,
}

impl RiskCalculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    /// Compute the full result for one set of inputs against a rates snapshot.
    ///
    /// Fails on invalid input, or with `OutOfRange` when the numbers do not
    /// fit a decimal. Degenerate divisions produce zeros and every risk
    /// concern is reported as a warning on the result.
    pub fn compute_risk(
        &self,
        inputs: &CalculationInputs,
        rates: &RatesSnapshot,
    ) -> Result<CalculationResult, InvalidInputError> {
        let (pair, solve) = Self::validate(inputs)?;

        let balance = inputs.account_balance;
        let mut warnings = Vec::new();
        let mut rates_used = Vec::new();

        // Pip value: USD first, then the account currency
        let pip_value_usd = self.pip_value_usd(pair, inputs, rates, &mut rates_used, &mut warnings);
        let account_rate = rates.rate_or_parity(inputs.account_currency);
        if inputs.account_currency != Currency::Usd {
            rates_used.push(format!("USD/{}: {}", inputs.account_currency, account_rate));
        }
        let pip_value = in_range(pip_value_usd.checked_mul(account_rate))?;

        // Risk amount in account units, with its percentage of balance
        let (risk_amount, risk_percent) = match inputs.risk.unit {
            RiskUnit::Percentage => (
                in_range(percent_of(balance, inputs.risk.value))?,
                inputs.risk.value,
            ),
            RiskUnit::Amount => (
                inputs.risk.value,
                in_range(percent_ratio(inputs.risk.value, balance))?,
            ),
        };
        let risk_usd = in_range(risk_amount.checked_div(account_rate))?;
        let risk_inr = in_range(risk_usd.checked_mul(rates.rate_or_parity(Currency::Inr)))?;

        // Solve for whichever side is unknown
        let (lots, stop_distance, recommended_stop) = match solve {
            Solve::Lots { stop_loss_pips } => {
                let effective_stop = in_range(stop_loss_pips.checked_add(inputs.spread_pips))?;
                let lots = in_range(lots_for_risk(risk_amount, pip_value, effective_stop))?;
                (lots, effective_stop, None)
            }
            Solve::StopLoss { lot_size } => {
                let stop = in_range(stop_for_risk(risk_amount, lot_size, pip_value))?;
                (lot_size, stop, Some(stop))
            }
        };

        debug!(
            pair = pair.symbol,
            mode = ?inputs.mode,
            pip_value = %pip_value,
            risk_amount = %risk_amount,
            lots = %lots,
            stop = %stop_distance,
            "Solved position"
        );

        // Margin
        let notional_usd = match pair.class {
            PairClass::Gold => lots
                .checked_mul(GOLD_LOT_OUNCES)
                .and_then(|oz| oz.checked_mul(self.config.gold_reference_price)),
            _ => lots.checked_mul(STANDARD_LOT_UNITS),
        };
        let notional = in_range(notional_usd.and_then(|n| n.checked_mul(account_rate)))?;
        let margin_required =
            in_range(notional.checked_div(Decimal::from(inputs.leverage.ratio())))?;
        let margin_percent = in_range(percent_ratio(margin_required, balance))?;
        let margin = MarginUsage {
            required: round_to(margin_required, 2),
            percent: round_to(margin_percent, 1),
            status: classify_margin(margin_percent),
        };

        let risk_tier = classify_risk_tier(risk_percent);
        let drawdown_scenarios = in_range(drawdown_scenarios(balance, risk_amount))?;

        let risk_reward = match inputs.target_profit_pips.filter(|t| *t > Decimal::ZERO) {
            Some(target) => in_range(risk_reward(target, stop_distance, risk_amount))?,
            None => None,
        };

        let position_size = PositionSize {
            lots: round_to(lots, 2),
            units: round_to(in_range(lots.checked_mul(STANDARD_LOT_UNITS))?, 0),
            mini_lots: round_to(in_range(lots.checked_mul(dec!(10)))?, 1),
            micro_lots: round_to(in_range(lots.checked_mul(dec!(100)))?, 0),
        };

        // Warnings
        if margin_percent > dec!(20) {
            warnings.push(CalculationWarning {
                severity: WarningSeverity::Critical,
                title: WARNING_HIGH_MARGIN.to_string(),
                message: format!(
                    "This position requires {}% of your account as margin.",
                    round_to(margin_percent, 1)
                ),
                recommended_min_balance: None,
            });
        }

        if let Solve::Lots { .. } = solve {
            if lots < self.config.min_lot_size {
                warnings.push(self.position_too_small(lots, balance, risk_percent));
            }
        }

        if risk_percent > dec!(5) {
            warnings.push(CalculationWarning {
                severity: WarningSeverity::Critical,
                title: WARNING_RECKLESS_RISK.to_string(),
                message: "Risking more than 5% per trade leads to rapid account blowup.".to_string(),
                recommended_min_balance: None,
            });
        }

        let checked_stop = match solve {
            Solve::Lots { stop_loss_pips } => stop_loss_pips,
            Solve::StopLoss { .. } => stop_distance,
        };
        let min_stop = Decimal::from(pair.min_stop_loss_pips);
        if checked_stop < min_stop {
            warnings.push(CalculationWarning {
                severity: WarningSeverity::Medium,
                title: WARNING_TIGHT_STOP.to_string(),
                message: format!(
                    "A {} pip stop is tighter than the usual {} pip minimum for {}; normal noise may stop you out.",
                    round_to(checked_stop, 1),
                    pair.min_stop_loss_pips,
                    pair.symbol
                ),
                recommended_min_balance: None,
            });
        }

        Ok(CalculationResult {
            mode: inputs.mode,
            position_size,
            risk_amount: RiskAmount {
                account: round_to(risk_amount, 2),
                usd: round_to(risk_usd, 2),
                inr: round_to(risk_inr, 2),
            },
            risk_percent: round_to(risk_percent, 2),
            margin,
            pip_value: round_to(pip_value, 2),
            recommended_stop_loss_pips: recommended_stop.map(|s| round_to(s, 1)),
            risk_reward,
            drawdown_scenarios,
            risk_tier,
            warnings,
            meta: ResultMeta {
                rates_captured_at: rates.captured_at,
                rates_used,
            },
        })
    }

    /// Reject inputs the active mode cannot work with.
    fn validate(
        inputs: &CalculationInputs,
    ) -> Result<(&'static PairDefinition, Solve), InvalidInputError> {
        if inputs.account_balance <= Decimal::ZERO {
            return Err(InvalidInputError::NonPositiveBalance);
        }
        if inputs.spread_pips < Decimal::ZERO {
            return Err(InvalidInputError::NegativeSpread);
        }
        if inputs.risk.value <= Decimal::ZERO {
            return Err(InvalidInputError::NonPositiveRisk);
        }

        let solve = match inputs.mode {
            CalculationMode::SolveForLots => match inputs.stop_loss_pips {
                Some(stop_loss_pips) if stop_loss_pips > Decimal::ZERO => {
                    Solve::Lots { stop_loss_pips }
                }
                _ => return Err(InvalidInputError::MissingStopLoss),
            },
            CalculationMode::SolveForStopLoss => match inputs.lot_size {
                Some(lot_size) if lot_size > Decimal::ZERO => Solve::StopLoss { lot_size },
                _ => return Err(InvalidInputError::MissingLotSize),
            },
        };

        let pair = PairCatalog::lookup(&inputs.pair_symbol)?;
        Ok((pair, solve))
    }

    /// USD value of one pip on one standard lot.
    fn pip_value_usd(
        &self,
        pair: &PairDefinition,
        inputs: &CalculationInputs,
        rates: &RatesSnapshot,
        rates_used: &mut Vec<String>,
        warnings: &mut Vec<CalculationWarning>,
    ) -> Decimal {
        match pair.class {
            // Flat $10 regardless of which side USD is on
            PairClass::Major | PairClass::Minor => FLAT_PIP_VALUE_USD,
            PairClass::Jpy => {
                let from_rate = Some(rates.jpy)
                    .filter(|jpy| *jpy > Decimal::ZERO)
                    .and_then(|jpy| JPY_PIP_VALUE_NUMERATOR.checked_div(jpy));
                match from_rate {
                    Some(value) => {
                        rates_used.push(format!("USD/JPY: {}", rates.jpy));
                        value
                    }
                    None => {
                        warnings.push(CalculationWarning {
                            severity: WarningSeverity::Low,
                            title: WARNING_APPROXIMATE_PIP_VALUE.to_string(),
                            message: format!(
                                "No usable USD/JPY rate; using an approximate ${} pip value.",
                                FALLBACK_JPY_PIP_VALUE_USD
                            ),
                            recommended_min_balance: None,
                        });
                        FALLBACK_JPY_PIP_VALUE_USD
                    }
                }
            }
            PairClass::Gold => inputs
                .gold_pip_unit
                .unwrap_or(self.config.default_gold_pip_unit)
                .pip_value_usd(),
        }
    }

    /// Lots fall under the broker minimum; say what balance would fix that.
    fn position_too_small(
        &self,
        lots: Decimal,
        balance: Decimal,
        risk_percent: Decimal,
    ) -> CalculationWarning {
        // Lots scale linearly with balance at a fixed risk percentage
        let recommended_min_balance = Some(lots)
            .filter(|l| *l > Decimal::ZERO)
            .and_then(|l| balance.checked_mul(self.config.min_lot_size)?.checked_div(l))
            .map(|b| b.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity));

        let mut message = format!(
            "Calculated size {} lots is below standard broker minimums ({}).",
            lots.round_dp(3),
            self.config.min_lot_size
        );
        if let Some(min_balance) = recommended_min_balance {
            message.push_str(&format!(
                " At {}% risk you need a balance of at least {} to open {} lots.",
                round_to(risk_percent, 2),
                min_balance,
                self.config.min_lot_size
            ));
        }

        CalculationWarning {
            severity: WarningSeverity::High,
            title: WARNING_POSITION_TOO_SMALL.to_string(),
            message,
            recommended_min_balance,
        }
    }
}

fn in_range<T>(value: Option<T>) -> Result<T, InvalidInputError> {
    value.ok_or(InvalidInputError::OutOfRange)
}

/// `percent`% of `value`.
fn percent_of(value: Decimal, percent: Decimal) -> Option<Decimal> {
    value.checked_mul(percent)?.checked_div(dec!(100))
}

/// `part` as a percentage of `whole`.
fn percent_ratio(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole)?.checked_mul(dec!(100))
}

/// Lots that lose exactly `risk_amount` over `stop_pips`.
///
/// Zero when the divisor is not positive; `None` on overflow.
fn lots_for_risk(risk_amount: Decimal, pip_value: Decimal, stop_pips: Decimal) -> Option<Decimal> {
    if pip_value <= Decimal::ZERO || stop_pips <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    risk_amount.checked_div(pip_value.checked_mul(stop_pips)?)
}

/// Stop distance at which `lots` loses exactly `risk_amount`.
fn stop_for_risk(risk_amount: Decimal, lots: Decimal, pip_value: Decimal) -> Option<Decimal> {
    if lots <= Decimal::ZERO || pip_value <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    risk_amount.checked_div(lots.checked_mul(pip_value)?)
}

fn drawdown_scenarios(balance: Decimal, risk_amount: Decimal) -> Option<Vec<DrawdownScenario>> {
    DRAWDOWN_RUNS
        .iter()
        .map(|&losses| {
            let loss = risk_amount.checked_mul(Decimal::from(losses))?;
            let drawdown = percent_ratio(loss, balance)?;
            let loss_amount = round_to(loss, 2);

            Some(DrawdownScenario {
                consecutive_losses: losses,
                loss_amount,
                remaining_balance: balance.checked_sub(loss_amount)?,
                drawdown_percent: round_to(drawdown, 1),
                status: classify_drawdown(drawdown),
            })
        })
        .collect()
}

/// `Some(None)` when there is no stop to measure against; `None` on overflow.
fn risk_reward(
    target_pips: Decimal,
    stop_pips: Decimal,
    risk_amount: Decimal,
) -> Option<Option<RiskReward>> {
    if stop_pips <= Decimal::ZERO {
        return Some(None);
    }

    let ratio = target_pips.checked_div(stop_pips)?;
    let quality = if ratio < dec!(1) {
        TradeQuality::Poor
    } else if ratio < dec!(2) {
        TradeQuality::Fair
    } else if ratio < dec!(3) {
        TradeQuality::Good
    } else {
        TradeQuality::Excellent
    };

    Some(Some(RiskReward {
        ratio: round_to(ratio, 2),
        potential_profit: round_to(risk_amount.checked_mul(ratio)?, 2),
        min_win_rate: round_to(dec!(100).checked_div(Decimal::ONE.checked_add(ratio)?)?, 1),
        quality,
    }))
}

/// Margin status bands: >20 Danger, >15 Warning, >10 Caution.
pub fn classify_margin(percent: Decimal) -> MarginStatus {
    if percent > dec!(20) {
        MarginStatus::Danger
    } else if percent > dec!(15) {
        MarginStatus::Warning
    } else if percent > dec!(10) {
        MarginStatus::Caution
    } else {
        MarginStatus::Safe
    }
}

/// Risk tier bands on percent of balance risked per trade.
pub fn classify_risk_tier(risk_percent: Decimal) -> RiskTier {
    if risk_percent < dec!(0.5) {
        RiskTier::UltraSafe
    } else if risk_percent < dec!(1) {
        RiskTier::Conservative
    } else if risk_percent <= dec!(2) {
        RiskTier::Standard
    } else if risk_percent <= dec!(5) {
        RiskTier::Aggressive
    } else {
        RiskTier::Reckless
    }
}

pub fn classify_drawdown(drawdown_percent: Decimal) -> DrawdownStatus {
    if drawdown_percent > dec!(20) {
        DrawdownStatus::Danger
    } else if drawdown_percent > dec!(10) {
        DrawdownStatus::Caution
    } else {
        DrawdownStatus::Safe
    }
}
