use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use super::{Currency, RateError, RateSource, Rates};

/// Matches the hour-long reuse window of the web client.
pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateOrigin {
    /// Returned by the configured source.
    Fetched,
    /// The built-in table, because the source failed or timed out.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    pub base: Currency,
    pub rates: Rates,
    pub origin: RateOrigin,
    pub cached: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
struct CacheEntry {
    rates: Rates,
    origin: RateOrigin,
    stored_at: Instant,
    fetched_at: DateTime<Utc>,
}

/// Rate lookups that never fail: results (fallbacks included) are reused for
/// `ttl`, and any fetch error or timeout degrades to the built-in table.
#[derive(Debug)]
pub struct CachedRates<S> {
    source: S,
    ttl: Duration,
    fetch_timeout: Duration,
    entries: Mutex<HashMap<Currency, CacheEntry>>,
}

impl<S: RateSource> CachedRates<S> {
    pub fn new(source: S, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            source,
            ttl,
            fetch_timeout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_defaults(source: S) -> Self {
        Self::new(source, DEFAULT_RATE_TTL, DEFAULT_FETCH_TIMEOUT)
    }

    pub async fn get_rates(&self, base: Currency) -> RateSnapshot {
        // Held across the fetch so concurrent misses share one request.
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(&base) {
            if entry.stored_at.elapsed() < self.ttl {
                debug!(%base, origin = ?entry.origin, "serving cached rates");
                return RateSnapshot {
                    base,
                    rates: entry.rates.clone(),
                    origin: entry.origin,
                    cached: true,
                    fetched_at: entry.fetched_at,
                };
            }
        }

        let (rates, origin) = match self.fetch(base).await {
            Ok(rates) => (rates, RateOrigin::Fetched),
            Err(err) => {
                warn!(%base, error = %err, "using fallback rate table");
                (Rates::fallback(base), RateOrigin::Fallback)
            }
        };

        let fetched_at = Utc::now();
        entries.insert(
            base,
            CacheEntry {
                rates: rates.clone(),
                origin,
                stored_at: Instant::now(),
                fetched_at,
            },
        );

        RateSnapshot {
            base,
            rates,
            origin,
            cached: false,
            fetched_at,
        }
    }

    async fn fetch(&self, base: Currency) -> Result<Rates, RateError> {
        let rates = timeout(self.fetch_timeout, self.source.fetch(base))
            .await
            .map_err(|_| RateError::Timeout(self.fetch_timeout))??;
        if rates.base != base {
            return Err(RateError::BaseMismatch {
                requested: base,
                returned: rates.base,
            });
        }
        Ok(rates)
    }

    /// Drop every cached table so the next lookup hits the source.
    pub async fn invalidate(&self) {
        self.entries.lock().await.clear();
    }
}
