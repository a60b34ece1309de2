//! Rate provider: cache first, live fetch second, fallback last.
//!
//! The provider never fails. Any problem reaching the API or the cache
//! ends in a usable snapshot with `is_offline` set.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::RatesClient;
use crate::calculator::CalculatorConfig;
use crate::db::{Database, RATES_CACHE_KEY};
use crate::models::RatesSnapshot;

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RatesSource {
    Cache,
    Live,
    StaleCache,
    Fallback,
}

impl RatesSource {
    pub fn describe(&self) -> &'static str {
        match self {
            RatesSource::Cache => "cached",
            RatesSource::Live => "live",
            RatesSource::StaleCache => "expired cached",
            RatesSource::Fallback => "fallback",
        }
    }
}

/// What the provider hands to the calculators.
#[derive(Debug, Clone, Serialize)]
pub struct RatesState {
    pub rates: RatesSnapshot,
    pub is_loading: bool,
    pub is_offline: bool,
    pub source: RatesSource,
}

impl RatesState {
    fn settled(rates: RatesSnapshot, source: RatesSource, is_offline: bool) -> Self {
        Self {
            rates,
            is_loading: false,
            is_offline,
            source,
        }
    }
}

/// Supplies rate snapshots from the cache, the API or the hardcoded set.
pub struct RateProvider {
    db: Option<Database>,
    client: Option<RatesClient>,
    ttl: chrono::Duration,
}

impl RateProvider {
    /// Provider with both a cache and a live client.
    pub fn new(db: Database, client: RatesClient, config: &CalculatorConfig) -> Self {
        Self {
            db: Some(db),
            client: Some(client),
            ttl: config.rates_cache_ttl(),
        }
    }

    /// Provider without a cache; every call goes to the API.
    pub fn uncached(client: RatesClient, config: &CalculatorConfig) -> Self {
        Self {
            db: None,
            client: Some(client),
            ttl: config.rates_cache_ttl(),
        }
    }

    /// Provider that never touches the network.
    pub fn offline(db: Option<Database>, config: &CalculatorConfig) -> Self {
        Self {
            db,
            client: None,
            ttl: config.rates_cache_ttl(),
        }
    }

    /// Current rates: a fresh cached snapshot, else a live fetch, else the
    /// last cached snapshot, else the hardcoded fallback.
    pub async fn get_rates(&self) -> RatesState {
        let cached = self.read_cache().await;

        if let Some(rates) = &cached {
            if rates.is_fresh(Utc::now(), self.ttl) {
                debug!(captured_at = %rates.captured_at, "Using cached rates");
                return RatesState::settled(rates.clone(), RatesSource::Cache, false);
            }
        }

        self.fetch_or_fallback(cached).await
    }

    /// Skip the cache lookup and fetch live rates now.
    pub async fn refresh(&self) -> RatesState {
        let cached = self.read_cache().await;
        self.fetch_or_fallback(cached).await
    }

    async fn fetch_or_fallback(&self, cached: Option<RatesSnapshot>) -> RatesState {
        if let Some(client) = &self.client {
            match client.fetch_latest().await {
                Ok(rates) => {
                    info!(url = %client.url(), "Fetched live rates");
                    self.write_cache(&rates).await;
                    return RatesState::settled(rates, RatesSource::Live, false);
                }
                Err(e) => {
                    warn!(error = %e, "Rate fetch failed");
                }
            }
        }

        let state = match cached {
            Some(rates) => RatesState::settled(rates, RatesSource::StaleCache, true),
            None => RatesState::settled(RatesSnapshot::fallback(), RatesSource::Fallback, true),
        };
        warn!(
            source = ?state.source,
            captured_at = %state.rates.captured_at,
            "Offline, using {} rates",
            state.source.describe()
        );
        state
    }

    async fn read_cache(&self) -> Option<RatesSnapshot> {
        let db = self.db.as_ref()?;
        match db.get_rates(RATES_CACHE_KEY).await {
            Ok(rates) => rates,
            Err(e) => {
                warn!(error = %e, "Rate cache unreadable, treating as miss");
                None
            }
        }
    }

    async fn write_cache(&self, rates: &RatesSnapshot) {
        let Some(db) = &self.db else {
            return;
        };
        if let Err(e) = db.save_rates(RATES_CACHE_KEY, rates).await {
            warn!(error = %e, "Failed to cache rates");
        }
    }
}
