//! Exchange-rate API client.

mod rates_client;
mod types;

pub use rates_client::RatesClient;
