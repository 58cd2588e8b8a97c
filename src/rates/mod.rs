//! Exchange rates for presenting projections in another currency.
//!
//! Nothing here feeds back into the projection engine: conversion is a linear
//! scaling of amounts that were already computed.

mod cache;
mod currency;
mod source;
mod table;

use thiserror::Error;

pub use cache::{CachedRates, DEFAULT_FETCH_TIMEOUT, DEFAULT_RATE_TTL, RateOrigin, RateSnapshot};
pub use currency::{Currency, format_amount};
pub use source::{ConfiguredSource, FileRateSource, HttpRateSource, RateSource, StaticRates};
pub use table::Rates;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("unknown currency code {0:?}")]
    UnknownCurrency(String),
    #[error("no rate for {0}")]
    MissingRate(Currency),
    #[error("rate source did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("asked for {requested} rates, source answered in {returned}")]
    BaseMismatch {
        requested: Currency,
        returned: Currency,
    },
    #[error("failed to read rates: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse rates: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),
}
