use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use super::{Currency, RateError, Rates};

/// Somewhere exchange rates can be fetched from. Fetches may be slow or fail;
/// [`super::CachedRates`] bounds and absorbs both.
pub trait RateSource {
    fn fetch(&self, base: Currency) -> impl Future<Output = Result<Rates, RateError>> + Send;
}

/// Serves the built-in table. Used when no external source is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRates;

impl RateSource for StaticRates {
    async fn fetch(&self, base: Currency) -> Result<Rates, RateError> {
        Ok(Rates::fallback(base))
    }
}

/// `{ "base": "EUR", "rates": { "USD": 1.08, ... } }`, as stored on disk or
/// returned by an exchangerate.host style endpoint. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct RateFile {
    base: String,
    rates: BTreeMap<String, f64>,
}

impl RateFile {
    fn into_rates(self, base: Currency, origin: &str) -> Result<Rates, RateError> {
        let file_base: Currency = self.base.parse()?;

        let mut known = Vec::with_capacity(self.rates.len());
        for (code, rate) in self.rates {
            match code.parse::<Currency>() {
                Ok(currency) => known.push((currency, rate)),
                Err(_) => debug!(%code, %origin, "skipping unknown currency"),
            }
        }

        Rates::new(file_base, known).rebased(base)
    }
}

/// Reads a rate file from disk on every fetch. Unknown currency codes are skipped.
#[derive(Debug, Clone)]
pub struct FileRateSource {
    path: PathBuf,
}

impl FileRateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RateSource for FileRateSource {
    async fn fetch(&self, base: Currency) -> Result<Rates, RateError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let file: RateFile = serde_json::from_str(&text)?;
        file.into_rates(base, &self.path.display().to_string())
    }
}

/// `GET {url}?base=EUR&symbols=USD,EUR,...` against an exchangerate.host style API.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl RateSource for HttpRateSource {
    async fn fetch(&self, base: Currency) -> Result<Rates, RateError> {
        let symbols = Currency::ALL.map(Currency::code).join(",");
        let body: RateFile = self
            .client
            .get(&self.url)
            .query(&[("base", base.code()), ("symbols", symbols.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(url = %self.url, %base, "fetched exchange rates");
        body.into_rates(base, &self.url)
    }
}

/// Source selected at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Static(StaticRates),
    File(FileRateSource),
    Http(HttpRateSource),
}

impl RateSource for ConfiguredSource {
    async fn fetch(&self, base: Currency) -> Result<Rates, RateError> {
        match self {
            ConfiguredSource::Static(source) => source.fetch(base).await,
            ConfiguredSource::File(source) => source.fetch(base).await,
            ConfiguredSource::Http(source) => source.fetch(base).await,
        }
    }
}
