//! Response types for the exchange-rate API.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Body of `GET /v4/latest/USD`.
///
/// Only `rates` is required; the other fields are informational.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRatesResponse {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time_last_updated: i64,
    pub rates: HashMap<String, Decimal>,
}
