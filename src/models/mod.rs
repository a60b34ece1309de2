//! Data models for pairs, rates, and calculator inputs and results.

mod calculation;
mod pair;
mod rates;

pub use calculation::{
    CalculationInputs, CalculationMode, CalculationResult, CalculationWarning, DrawdownScenario,
    DrawdownStatus, GoldPipUnit, Leverage, MarginStatus, MarginUsage, PositionSize, ResultMeta,
    RiskAmount, RiskReward, RiskSpec, RiskTier, RiskUnit, TradeQuality, WarningSeverity,
};
pub use pair::{PairCatalog, PairClass, PairDefinition};
pub use rates::{Currency, RatesSnapshot};
