use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RateError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Jpy,
    Gbp,
    Aud,
    Cad,
    Chf,
    Cny,
    Inr,
    Mxn,
}

impl Currency {
    pub const ALL: [Currency; 10] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Jpy,
        Currency::Gbp,
        Currency::Aud,
        Currency::Cad,
        Currency::Chf,
        Currency::Cny,
        Currency::Inr,
        Currency::Mxn,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Jpy => "JPY",
            Currency::Gbp => "GBP",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
            Currency::Cny => "CNY",
            Currency::Inr => "INR",
            Currency::Mxn => "MXN",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
            Currency::Jpy => "Japanese Yen",
            Currency::Gbp => "British Pound",
            Currency::Aud => "Australian Dollar",
            Currency::Cad => "Canadian Dollar",
            Currency::Chf => "Swiss Franc",
            Currency::Cny => "Chinese Yuan",
            Currency::Inr => "Indian Rupee",
            Currency::Mxn => "Mexican Peso",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Jpy | Currency::Cny => "¥",
            Currency::Gbp => "£",
            Currency::Aud => "A$",
            Currency::Cad => "C$",
            Currency::Chf => "CHF ",
            Currency::Inr => "₹",
            Currency::Mxn => "MX$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| RateError::UnknownCurrency(code.to_string()))
    }
}

/// Symbol-prefixed amount with thousands separators and two decimals.
pub fn format_amount(amount: f64, currency: Currency) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{}{grouped}.{:02}", currency.symbol(), cents % 100)
}
