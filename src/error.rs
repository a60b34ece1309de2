//! Error types for pair lookup, calculator input and rate fetching.

use thiserror::Error;

/// The requested symbol is not in the pair catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown pair: {symbol}")]
pub struct UnknownPairError {
    pub symbol: String,
}

/// User input the risk calculator cannot work with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInputError {
    #[error("Invalid balance: account balance must be greater than zero")]
    NonPositiveBalance,

    #[error("Invalid stop loss: a positive stop-loss is required to solve for lots")]
    MissingStopLoss,

    #[error("Invalid lot size: a positive lot size is required to solve for stop-loss")]
    MissingLotSize,

    #[error("Invalid spread: spread cannot be negative")]
    NegativeSpread,

    #[error("Invalid risk: risk value must be greater than zero")]
    NonPositiveRisk,

    #[error("Out of range: inputs are too large or too small to calculate with")]
    OutOfRange,

    #[error(transparent)]
    UnknownPair(#[from] UnknownPairError),
}

/// Failure to obtain live rates. Recovered inside the rate provider.
#[derive(Error, Debug)]
pub enum RateFetchError {
    #[error("Rates request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Rates request failed: {status} - {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse rates response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rates response missing or invalid field: {field}")]
    Schema { field: &'static str },
}
