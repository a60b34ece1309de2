//! Client for the public exchange-rate API (USD base).

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::RateFetchError;
use crate::models::RatesSnapshot;

use super::types::LatestRatesResponse;

/// Read-only client for live conversion rates.
pub struct RatesClient {
    client: Client,
    url: String,
}

impl RatesClient {
    /// Create a client for `url` with a request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the latest rates and turn them into a snapshot stamped now.
    pub async fn fetch_latest(&self) -> Result<RatesSnapshot, RateFetchError> {
        debug!(url = %self.url, "Fetching live rates");

        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RateFetchError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: LatestRatesResponse = serde_json::from_str(&body)?;
        debug!(
            base = %parsed.base,
            date = %parsed.date,
            time_last_updated = parsed.time_last_updated,
            "Parsed rates response"
        );

        Self::snapshot_from_response(&parsed, Utc::now())
    }

    /// Pick the currencies the calculator uses out of a full rates table.
    ///
    /// Every currency must be present and positive; anything else is a
    /// schema mismatch.
    pub fn snapshot_from_response(
        response: &LatestRatesResponse,
        captured_at: DateTime<Utc>,
    ) -> Result<RatesSnapshot, RateFetchError> {
        let pick = |field: &'static str| -> Result<Decimal, RateFetchError> {
            response
                .rates
                .get(field)
                .copied()
                .filter(|rate| *rate > Decimal::ZERO)
                .ok_or(RateFetchError::Schema { field })
        };

        Ok(RatesSnapshot {
            usd: Decimal::ONE,
            eur: pick("EUR")?,
            gbp: pick("GBP")?,
            jpy: pick("JPY")?,
            inr: pick("INR")?,
            captured_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_from_response() {
        let body = r#"{
            "base": "USD",
            "date": "2024-05-01",
            "time_last_updated": 1714521601,
            "rates": {"USD": 1, "EUR": 0.935, "GBP": 0.801, "JPY": 157.8, "INR": 83.42, "CHF": 0.917}
        }"#;
        let parsed: LatestRatesResponse = serde_json::from_str(body).unwrap();
        let now = Utc::now();
        assert_eq!(parsed.base, "USD");
        assert_eq!(parsed.date, "2024-05-01");
        assert_eq!(parsed.time_last_updated, 1714521601);

        let snapshot = RatesClient::snapshot_from_response(&parsed, now).unwrap();

        assert_eq!(snapshot.usd, Decimal::ONE);
        assert_eq!(snapshot.eur, dec!(0.935));
        assert_eq!(snapshot.jpy, dec!(157.8));
        assert_eq!(snapshot.inr, dec!(83.42));
        assert_eq!(snapshot.captured_at, now);
    }

    #[test]
    fn test_missing_currency_is_schema_error() {
        let parsed: LatestRatesResponse =
            serde_json::from_str(r#"{"rates": {"EUR": 0.9, "GBP": 0.8, "JPY": 150}}"#).unwrap();

        assert!(parsed.base.is_empty());
        assert_eq!(parsed.time_last_updated, 0);

        let err = RatesClient::snapshot_from_response(&parsed, Utc::now()).unwrap_err();
        assert!(matches!(err, RateFetchError::Schema { field: "INR" }));
    }

    #[test]
    fn test_non_positive_rate_is_schema_error() {
        let parsed: LatestRatesResponse = serde_json::from_str(
            r#"{"rates": {"EUR": 0.9, "GBP": 0.8, "JPY": 0, "INR": 83}}"#,
        )
        .unwrap();

        let err = RatesClient::snapshot_from_response(&parsed, Utc::now()).unwrap_err();
        assert!(matches!(err, RateFetchError::Schema { field: "JPY" }));
    }

    #[test]
    fn test_body_without_rates_fails_to_parse() {
        let result: Result<LatestRatesResponse, _> = serde_json::from_str(r#"{"result": "error"}"#);
        assert!(result.is_err());
    }
}
