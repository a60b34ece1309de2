//! Exchange-rate snapshot consumed by the calculators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Account currencies the calculator can report in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Inr,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Inr => "INR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            "INR" => Ok(Currency::Inr),
            other => Err(format!("unsupported account currency: {}", other)),
        }
    }
}

/// Conversion rates quoted as units of each currency per 1 USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesSnapshot {
    pub usd: Decimal,
    pub eur: Decimal,
    pub gbp: Decimal,
    pub jpy: Decimal,
    pub inr: Decimal,

    /// When the rates were fetched (or built, for the fallback set)
    pub captured_at: DateTime<Utc>,
}

impl RatesSnapshot {
    /// Hardcoded rates used when neither the cache nor the API can help.
    pub fn fallback() -> Self {
        Self {
            usd: Decimal::ONE,
            eur: dec!(0.92),
            gbp: dec!(0.78),
            jpy: dec!(150.50),
            inr: dec!(83.50),
            captured_at: Utc::now(),
        }
    }

    /// Units of `currency` per 1 USD.
    pub fn rate(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
            Currency::Gbp => self.gbp,
            Currency::Jpy => self.jpy,
            Currency::Inr => self.inr,
        }
    }

    /// Like [`rate`](Self::rate), but a non-positive rate counts as parity.
    pub fn rate_or_parity(&self, currency: Currency) -> Decimal {
        let rate = self.rate(currency);
        if rate > Decimal::ZERO {
            rate
        } else {
            Decimal::ONE
        }
    }

    /// Age of the snapshot relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.captured_at
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.age(now) < ttl
    }
}
