use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::core::{Field, ProjectionInput, ValidationError};
use crate::rates::{Currency, RateError};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Currency(#[from] RateError),
}

impl RequestError {
    pub fn field(&self) -> Option<Field> {
        match self {
            RequestError::Validation(err) => err.field(),
            RequestError::Currency(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRequest {
    pub input: ProjectionInput,
    pub currency: Option<Currency>,
    pub display_currency: Option<Currency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionPayload {
    #[serde(alias = "currentSavings", alias = "currentBalance")]
    pub starting_balance: Option<f64>,
    #[serde(alias = "monthlyIncome")]
    pub periodic_income: Option<f64>,
    #[serde(alias = "monthlyExpenses")]
    pub periodic_expenses: Option<f64>,
    #[serde(alias = "monthlyAdditionalDeposit")]
    pub additional_deposit: Option<f64>,
    #[serde(alias = "annualInterestRate", alias = "interestRate")]
    pub annual_interest_rate_percent: Option<f64>,
    #[serde(alias = "targetSavings", alias = "target")]
    pub target_balance: Option<f64>,
    pub start_date: Option<String>,
    pub currency: Option<Currency>,
    pub display_currency: Option<Currency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionForm {
    #[serde(alias = "currentSavings", alias = "currentBalance")]
    pub starting_balance: Option<String>,
    #[serde(alias = "monthlyIncome")]
    pub periodic_income: Option<String>,
    #[serde(alias = "monthlyExpenses")]
    pub periodic_expenses: Option<String>,
    #[serde(alias = "monthlyAdditionalDeposit")]
    pub additional_deposit: Option<String>,
    #[serde(alias = "annualInterestRate", alias = "interestRate")]
    pub annual_interest_rate_percent: Option<String>,
    #[serde(alias = "targetSavings", alias = "target")]
    pub target_balance: Option<String>,
    pub start_date: Option<String>,
    pub currency: Option<String>,
    pub display_currency: Option<String>,
}

fn required<T>(value: Option<T>, field: Field) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::Missing { field })
}

fn optional_currency(text: Option<&str>) -> Result<Option<Currency>, RateError> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => code.parse().map(Some),
    }
}

impl TryFrom<ProjectionPayload> for ProjectionRequest {
    type Error = RequestError;

    fn try_from(payload: ProjectionPayload) -> Result<Self, Self::Error> {
        let input = ProjectionInput {
            starting_balance: required(payload.starting_balance, Field::StartingBalance)?,
            periodic_income: required(payload.periodic_income, Field::PeriodicIncome)?,
            periodic_expenses: required(payload.periodic_expenses, Field::PeriodicExpenses)?,
            additional_deposit: payload.additional_deposit.unwrap_or(0.0),
            annual_interest_rate_percent: payload.annual_interest_rate_percent.unwrap_or(0.0),
            target_balance: required(payload.target_balance, Field::TargetBalance)?,
            start_date: parse_date(payload.start_date.as_deref().unwrap_or(""), Field::StartDate)?,
        };

        Ok(ProjectionRequest {
            input,
            currency: payload.currency,
            display_currency: payload.display_currency,
        })
    }
}

impl TryFrom<ProjectionForm> for ProjectionRequest {
    type Error = RequestError;

    fn try_from(form: ProjectionForm) -> Result<Self, Self::Error> {
        let amount = |text: Option<&String>, field| -> Result<f64, ValidationError> {
            required(text, field).map(|t| parse_amount(t))
        };
        let optional_amount = |text: Option<&String>| text.map(|t| parse_amount(t)).unwrap_or(0.0);

        let input = ProjectionInput {
            starting_balance: amount(form.starting_balance.as_ref(), Field::StartingBalance)?,
            periodic_income: amount(form.periodic_income.as_ref(), Field::PeriodicIncome)?,
            periodic_expenses: amount(form.periodic_expenses.as_ref(), Field::PeriodicExpenses)?,
            additional_deposit: optional_amount(form.additional_deposit.as_ref()),
            annual_interest_rate_percent: optional_amount(form.annual_interest_rate_percent.as_ref()),
            target_balance: amount(form.target_balance.as_ref(), Field::TargetBalance)?,
            start_date: parse_date(form.start_date.as_deref().unwrap_or(""), Field::StartDate)?,
        };

        Ok(ProjectionRequest {
            input,
            currency: optional_currency(form.currency.as_deref())?,
            display_currency: optional_currency(form.display_currency.as_deref())?,
        })
    }
}

/// The first comma is a decimal point, not a thousands separator. Unreadable text is 0.
pub fn parse_amount(text: &str) -> f64 {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    leading_number(&kept.replacen(',', ".", 1)).unwrap_or(0.0)
}

fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > end + 1 || has_digits {
            has_digits = true;
            end = frac_end;
        }
    }

    if !has_digits {
        return None;
    }
    text[..end].parse().ok()
}

pub fn parse_date(text: &str, field: Field) -> Result<Option<NaiveDate>, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(text)
        .map(|ts| Some(ts.with_timezone(&Utc).date_naive()))
        .map_err(|_| ValidationError::InvalidDate {
            field,
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parse_amount_coerces_form_text() {
        assert_eq!(parse_amount("1500"), 1500.0);
        assert_eq!(parse_amount("€1500.50"), 1500.5);
        assert_eq!(parse_amount("  42 "), 42.0);
        assert_eq!(parse_amount("12,5"), 12.5);
        assert_eq!(parse_amount("2,000"), 2.0);
        assert_eq!(parse_amount("-3.25"), -3.25);
        assert_eq!(parse_amount(".5"), 0.5);
        assert_eq!(parse_amount("7."), 7.0);
        assert_eq!(parse_amount("1.2.3"), 1.2);
    }

    #[test]
    fn parse_amount_defaults_unreadable_text_to_zero() {
        for text in ["", "   ", "abc", "-", ".", "--5", "$"] {
            assert_eq!(parse_amount(text), 0.0, "text {text:?}");
        }
    }

    #[test]
    fn parse_date_accepts_plain_and_timestamp_forms() {
        assert_eq!(
            parse_date("2025-01-01", Field::StartDate).expect("valid"),
            Some(ymd(2025, 1, 1))
        );
        assert_eq!(
            parse_date("2025-11-01T00:00:00Z", Field::StartDate).expect("valid"),
            Some(ymd(2025, 11, 1))
        );
        assert_eq!(
            parse_date("2025-01-31T23:30:00-02:00", Field::StartDate).expect("valid"),
            Some(ymd(2025, 2, 1))
        );
        assert_eq!(parse_date("  ", Field::StartDate).expect("blank"), None);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("31/01/2025", Field::StartDate).expect_err("must reject");
        assert_eq!(
            err,
            ValidationError::InvalidDate {
                field: Field::StartDate,
                text: "31/01/2025".to_string()
            }
        );
    }

    #[test]
    fn payload_requires_core_fields() {
        let payload: ProjectionPayload = serde_json::from_str(
            r#"{ "startingBalance": 100, "periodicIncome": 10, "targetBalance": 500 }"#,
        )
        .expect("valid json");
        let err = ProjectionRequest::try_from(payload).expect_err("expenses missing");
        assert_eq!(err.field(), Some(Field::PeriodicExpenses));
        assert_eq!(err.to_string(), "monthly expenses is required");
    }

    #[test]
    fn payload_accepts_web_form_keys_and_defaults() {
        let payload: ProjectionPayload = serde_json::from_str(
            r#"{
                "currentSavings": 2000,
                "monthlyIncome": 3500,
                "monthlyExpenses": 2700,
                "targetSavings": 10000,
                "startDate": "2025-01-01",
                "displayCurrency": "USD"
            }"#,
        )
        .expect("valid json");
        let request = ProjectionRequest::try_from(payload).expect("valid request");

        assert_eq!(request.input.starting_balance, 2000.0);
        assert_eq!(request.input.periodic_income, 3500.0);
        assert_eq!(request.input.additional_deposit, 0.0);
        assert_eq!(request.input.annual_interest_rate_percent, 0.0);
        assert_eq!(request.input.start_date, Some(ymd(2025, 1, 1)));
        assert_eq!(request.currency, None);
        assert_eq!(request.display_currency, Some(Currency::Usd));
    }

    #[test]
    fn form_coerces_blank_optional_fields_and_rejects_missing_required_ones() {
        let form = ProjectionForm {
            starting_balance: Some("2 000".to_string()),
            periodic_income: Some("3500".to_string()),
            periodic_expenses: Some("".to_string()),
            additional_deposit: Some("n/a".to_string()),
            target_balance: Some("10000".to_string()),
            start_date: Some("".to_string()),
            currency: Some("gbp".to_string()),
            ..Default::default()
        };
        let request = ProjectionRequest::try_from(form).expect("valid form");
        assert_eq!(request.input.starting_balance, 2000.0);
        assert_eq!(request.input.periodic_expenses, 0.0);
        assert_eq!(request.input.additional_deposit, 0.0);
        assert_eq!(request.input.start_date, None);
        assert_eq!(request.currency, Some(Currency::Gbp));

        let missing = ProjectionForm {
            starting_balance: Some("1".to_string()),
            periodic_income: Some("1".to_string()),
            periodic_expenses: Some("1".to_string()),
            ..Default::default()
        };
        let err = ProjectionRequest::try_from(missing).expect_err("target missing");
        assert_eq!(err.field(), Some(Field::TargetBalance));
    }

    #[test]
    fn form_rejects_unknown_currency() {
        let form = ProjectionForm {
            starting_balance: Some("1".to_string()),
            periodic_income: Some("1".to_string()),
            periodic_expenses: Some("1".to_string()),
            target_balance: Some("2".to_string()),
            display_currency: Some("ZZZ".to_string()),
            ..Default::default()
        };
        let err = ProjectionRequest::try_from(form).expect_err("unknown currency");
        assert!(matches!(err, RequestError::Currency(RateError::UnknownCurrency(_))));
    }
}
