use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::money::round_cents;

/// Hard ceiling on simulated periods (roughly 833 years of months).
pub const MAX_PERIODS: u32 = 10_000;

/// Inputs for one projection. All amounts share one implicit currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub starting_balance: f64,
    pub periodic_income: f64,
    pub periodic_expenses: f64,
    pub additional_deposit: f64,
    /// Annual nominal rate in percent, e.g. `1.2` for 1.2%.
    pub annual_interest_rate_percent: f64,
    pub target_balance: f64,
    pub start_date: Option<NaiveDate>,
}

impl ProjectionInput {
    pub fn new(
        starting_balance: f64,
        periodic_income: f64,
        periodic_expenses: f64,
        target_balance: f64,
    ) -> Self {
        Self {
            starting_balance,
            periodic_income,
            periodic_expenses,
            additional_deposit: 0.0,
            annual_interest_rate_percent: 0.0,
            target_balance,
            start_date: None,
        }
    }

    pub fn with_additional_deposit(mut self, amount: f64) -> Self {
        self.additional_deposit = amount;
        self
    }

    pub fn with_annual_interest_rate_percent(mut self, rate: f64) -> Self {
        self.annual_interest_rate_percent = rate;
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Net inflow applied every period. Negative when expenses dominate.
    pub fn periodic_surplus(&self) -> f64 {
        self.periodic_income - self.periodic_expenses + self.additional_deposit
    }

    pub fn period_rate(&self) -> f64 {
        self.annual_interest_rate_percent / 100.0 / 12.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PeriodsNeeded {
    Reached(u32),
    Unreachable,
}

impl PeriodsNeeded {
    pub fn count(self) -> Option<u32> {
        match self {
            PeriodsNeeded::Reached(n) => Some(n),
            PeriodsNeeded::Unreachable => None,
        }
    }
}

impl Serialize for PeriodsNeeded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PeriodsNeeded::Reached(n) => serializer.serialize_u32(*n),
            PeriodsNeeded::Unreachable => serializer.serialize_str("unreachable"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnreachableReason {
    /// No surplus and no interest: the balance can never grow.
    NoGrowth,
    /// Two consecutive periods produced the same rounded balance.
    Stagnated,
    /// The simulation horizon ran out before the target.
    HorizonExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub period_index: u32,
    pub date: Option<NaiveDate>,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub periods_needed: PeriodsNeeded,
    pub end_date: Option<NaiveDate>,
    pub ledger: Vec<LedgerEntry>,
    pub starting_balance: f64,
    pub final_balance: f64,
    pub total_contributions: f64,
    pub total_interest_earned: f64,
    pub summary: String,
    pub unreachable: bool,
    pub unreachable_reason: Option<UnreachableReason>,
}

impl ProjectionResult {
    /// Linear rescaling of every amount, e.g. into another currency.
    /// Period counts, dates and the summary are left untouched. Interest is
    /// re-derived from the scaled amounts so that
    /// `final = start + contributions + interest` still holds to the cent.
    pub fn scaled(&self, factor: f64) -> ProjectionResult {
        let ledger = self
            .ledger
            .iter()
            .map(|entry| LedgerEntry {
                period_index: entry.period_index,
                date: entry.date,
                balance: round_cents(entry.balance * factor),
            })
            .collect();

        let starting_balance = round_cents(self.starting_balance * factor);
        let final_balance = round_cents(self.final_balance * factor);
        let total_contributions = round_cents(self.total_contributions * factor);

        ProjectionResult {
            periods_needed: self.periods_needed,
            end_date: self.end_date,
            ledger,
            starting_balance,
            final_balance,
            total_contributions,
            total_interest_earned: round_cents(
                final_balance - starting_balance - total_contributions,
            ),
            summary: self.summary.clone(),
            unreachable: self.unreachable,
            unreachable_reason: self.unreachable_reason,
        }
    }
}
