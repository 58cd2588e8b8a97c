use std::collections::BTreeMap;

use serde::Serialize;

use super::{Currency, RateError};

/// Built-in EUR-based table used whenever no usable rates can be fetched.
const FALLBACK_EUR: [(Currency, f64); 10] = [
    (Currency::Usd, 1.08),
    (Currency::Eur, 1.0),
    (Currency::Jpy, 170.0),
    (Currency::Gbp, 0.86),
    (Currency::Aud, 1.62),
    (Currency::Cad, 1.47),
    (Currency::Chf, 0.95),
    (Currency::Cny, 7.65),
    (Currency::Inr, 90.0),
    (Currency::Mxn, 19.5),
];

/// Units of each currency per one unit of `base`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rates {
    pub base: Currency,
    pub rates: BTreeMap<Currency, f64>,
}

impl Rates {
    /// Build a table, dropping non-positive or non-finite entries and pinning `base` to 1.
    pub fn new(base: Currency, rates: impl IntoIterator<Item = (Currency, f64)>) -> Self {
        let mut rates: BTreeMap<Currency, f64> = rates
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .collect();
        rates.insert(base, 1.0);
        Self { base, rates }
    }

    pub fn fallback(base: Currency) -> Self {
        let eur = Rates::new(Currency::Eur, FALLBACK_EUR);
        // Every fallback currency is present, so rebasing cannot fail.
        eur.rebased(base).unwrap_or(eur)
    }

    pub fn rate(&self, currency: Currency) -> Option<f64> {
        self.rates.get(&currency).copied()
    }

    fn require(&self, currency: Currency) -> Result<f64, RateError> {
        self.rate(currency).ok_or(RateError::MissingRate(currency))
    }

    pub fn rebased(&self, base: Currency) -> Result<Rates, RateError> {
        if base == self.base {
            return Ok(self.clone());
        }
        let divisor = self.require(base)?;
        Ok(Rates::new(
            base,
            self.rates.iter().map(|(currency, rate)| (*currency, rate / divisor)),
        ))
    }

    /// Multiplier that turns an amount in `from` into an amount in `to`.
    pub fn factor(&self, from: Currency, to: Currency) -> Result<f64, RateError> {
        if from == to {
            return Ok(1.0);
        }
        Ok(self.require(to)? / self.require(from)?)
    }

    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> Result<f64, RateError> {
        if from == to {
            return Ok(amount);
        }
        Ok(amount / self.require(from)? * self.require(to)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn fallback_covers_every_currency() {
        let rates = Rates::fallback(Currency::Eur);
        for currency in Currency::ALL {
            assert!(rates.rate(currency).is_some(), "missing {currency}");
        }
        assert_eq!(rates.rate(Currency::Eur), Some(1.0));
        assert_eq!(rates.rate(Currency::Jpy), Some(170.0));
    }

    #[test]
    fn fallback_rebases_to_requested_currency() {
        let rates = Rates::fallback(Currency::Usd);
        assert_eq!(rates.base, Currency::Usd);
        assert_eq!(rates.rate(Currency::Usd), Some(1.0));
        assert_approx(rates.rate(Currency::Eur).expect("eur"), 1.0 / 1.08);
        assert_approx(rates.rate(Currency::Gbp).expect("gbp"), 0.86 / 1.08);
    }

    #[test]
    fn converts_through_the_base() {
        let rates = Rates::fallback(Currency::Eur);
        assert_approx(
            rates.convert(108.0, Currency::Usd, Currency::Eur).expect("known"),
            100.0,
        );
        assert_approx(
            rates.convert(100.0, Currency::Eur, Currency::Jpy).expect("known"),
            17_000.0,
        );
        assert_eq!(rates.convert(5.0, Currency::Gbp, Currency::Gbp).expect("same"), 5.0);
        assert_approx(rates.factor(Currency::Eur, Currency::Usd).expect("known"), 1.08);
    }

    #[test]
    fn missing_rates_are_reported() {
        let rates = Rates::new(Currency::Eur, [(Currency::Usd, 1.1)]);
        assert!(matches!(
            rates.convert(1.0, Currency::Eur, Currency::Gbp),
            Err(RateError::MissingRate(Currency::Gbp))
        ));
        assert!(matches!(
            rates.rebased(Currency::Jpy),
            Err(RateError::MissingRate(Currency::Jpy))
        ));
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let rates = Rates::new(
            Currency::Eur,
            [(Currency::Usd, 0.0), (Currency::Gbp, f64::NAN), (Currency::Jpy, 160.0)],
        );
        assert_eq!(rates.rate(Currency::Usd), None);
        assert_eq!(rates.rate(Currency::Gbp), None);
        assert_eq!(rates.rate(Currency::Jpy), Some(160.0));
    }
}
