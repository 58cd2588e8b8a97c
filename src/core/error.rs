use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Field {
    StartingBalance,
    PeriodicIncome,
    PeriodicExpenses,
    AdditionalDeposit,
    AnnualInterestRate,
    TargetBalance,
    StartDate,
}

impl Field {
    /// Wire name used by the HTTP payloads.
    pub fn key(self) -> &'static str {
        match self {
            Field::StartingBalance => "startingBalance",
            Field::PeriodicIncome => "periodicIncome",
            Field::PeriodicExpenses => "periodicExpenses",
            Field::AdditionalDeposit => "additionalDeposit",
            Field::AnnualInterestRate => "annualInterestRatePercent",
            Field::TargetBalance => "targetBalance",
            Field::StartDate => "startDate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::StartingBalance => "starting balance",
            Field::PeriodicIncome => "monthly income",
            Field::PeriodicExpenses => "monthly expenses",
            Field::AdditionalDeposit => "additional deposit",
            Field::AnnualInterestRate => "annual interest rate",
            Field::TargetBalance => "target balance",
            Field::StartDate => "start date",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: Field },
    #[error("{field} must be non-negative (got {value})")]
    Negative { field: Field, value: f64 },
    #[error("{field} must be a finite number")]
    NotFinite { field: Field },
    #[error("{field} must be a YYYY-MM-DD date (got {text:?})")]
    InvalidDate { field: Field, text: String },
    #[error("start date {date} is too far in the future to project")]
    StartDateOutOfRange { date: NaiveDate },
    #[error("projection horizon must be between 1 and {max} periods (got {requested})")]
    HorizonOutOfRange { requested: u32, max: u32 },
}

impl ValidationError {
    pub fn field(&self) -> Option<Field> {
        match self {
            ValidationError::Missing { field }
            | ValidationError::Negative { field, .. }
            | ValidationError::NotFinite { field }
            | ValidationError::InvalidDate { field, .. } => Some(*field),
            ValidationError::StartDateOutOfRange { .. } => Some(Field::StartDate),
            ValidationError::HorizonOutOfRange { .. } => None,
        }
    }
}
