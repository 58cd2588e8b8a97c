use tracing::debug;

use super::calendar::add_months;
use super::error::{Field, ValidationError};
use super::money::round_cents;
use super::types::{
    LedgerEntry, MAX_PERIODS, PeriodsNeeded, ProjectionInput, ProjectionResult, UnreachableReason,
};

#[derive(Debug)]
struct Simulation {
    ledger: Vec<LedgerEntry>,
    periods_needed: PeriodsNeeded,
    reason: Option<UnreachableReason>,
}

impl Simulation {
    fn reached(ledger: Vec<LedgerEntry>, periods: u32) -> Self {
        Self {
            ledger,
            periods_needed: PeriodsNeeded::Reached(periods),
            reason: None,
        }
    }

    fn unreachable(ledger: Vec<LedgerEntry>, reason: UnreachableReason) -> Self {
        Self {
            ledger,
            periods_needed: PeriodsNeeded::Unreachable,
            reason: Some(reason),
        }
    }
}

pub fn compute(input: &ProjectionInput) -> Result<ProjectionResult, ValidationError> {
    compute_with_horizon(input, MAX_PERIODS)
}

pub fn compute_with_horizon(
    input: &ProjectionInput,
    max_periods: u32,
) -> Result<ProjectionResult, ValidationError> {
    if max_periods == 0 || max_periods > MAX_PERIODS {
        return Err(ValidationError::HorizonOutOfRange {
            requested: max_periods,
            max: MAX_PERIODS,
        });
    }
    validate(input)?;

    let simulation = if input.starting_balance >= input.target_balance {
        already_reached(input)
    } else {
        simulate(input, max_periods)
    };

    debug!(
        periods = ?simulation.periods_needed,
        ledger_len = simulation.ledger.len(),
        reason = ?simulation.reason,
        "projection complete"
    );

    Ok(finish(input, simulation, max_periods))
}

fn validate(input: &ProjectionInput) -> Result<(), ValidationError> {
    let fields = [
        (Field::StartingBalance, input.starting_balance),
        (Field::PeriodicIncome, input.periodic_income),
        (Field::PeriodicExpenses, input.periodic_expenses),
        (Field::AdditionalDeposit, input.additional_deposit),
        (Field::AnnualInterestRate, input.annual_interest_rate_percent),
        (Field::TargetBalance, input.target_balance),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < 0.0 {
            return Err(ValidationError::Negative { field, value });
        }
    }

    if let Some(date) = input.start_date {
        if add_months(date, MAX_PERIODS).is_none() {
            return Err(ValidationError::StartDateOutOfRange { date });
        }
    }

    Ok(())
}

fn already_reached(input: &ProjectionInput) -> Simulation {
    let entry = LedgerEntry {
        period_index: 0,
        date: input.start_date,
        balance: round_cents(input.starting_balance),
    };
    Simulation::reached(vec![entry], 0)
}

fn simulate(input: &ProjectionInput, max_periods: u32) -> Simulation {
    let surplus = input.periodic_surplus();
    let rate = input.period_rate();

    if surplus <= 0.0 && rate == 0.0 {
        return Simulation::unreachable(Vec::new(), UnreachableReason::NoGrowth);
    }

    let mut ledger = Vec::new();
    let mut balance = input.starting_balance;
    let mut previous = None;

    for period in 1..=max_periods {
        // Surplus lands first, then the whole funded balance earns interest.
        let funded = balance + surplus;
        balance = round_cents(funded + funded * rate);
        ledger.push(LedgerEntry {
            period_index: period,
            date: input.start_date.and_then(|start| add_months(start, period)),
            balance,
        });

        // Only simulated periods count; the starting balance is not an entry.
        if previous == Some(balance) {
            return Simulation::unreachable(ledger, UnreachableReason::Stagnated);
        }
        if balance >= input.target_balance {
            return Simulation::reached(ledger, period);
        }
        previous = Some(balance);
    }

    Simulation::unreachable(ledger, UnreachableReason::HorizonExceeded)
}

fn finish(input: &ProjectionInput, simulation: Simulation, max_periods: u32) -> ProjectionResult {
    let Simulation {
        ledger,
        periods_needed,
        reason,
    } = simulation;

    let final_balance = ledger
        .last()
        .map(|entry| entry.balance)
        .unwrap_or_else(|| round_cents(input.starting_balance));

    // Period 0 entries record the starting state; no surplus was applied.
    let simulated_periods = ledger.iter().filter(|e| e.period_index > 0).count();
    let total_contributions = round_cents(input.periodic_surplus() * simulated_periods as f64);
    let total_interest_earned =
        round_cents(final_balance - input.starting_balance - total_contributions);

    let end_date = match (input.start_date, periods_needed) {
        (Some(start), PeriodsNeeded::Reached(n)) => add_months(start, n),
        _ => None,
    };

    let summary = summarize(periods_needed, reason, end_date, max_periods);

    ProjectionResult {
        periods_needed,
        end_date,
        ledger,
        starting_balance: round_cents(input.starting_balance),
        final_balance,
        total_contributions,
        total_interest_earned,
        summary,
        unreachable: reason.is_some(),
        unreachable_reason: reason,
    }
}

fn summarize(
    periods_needed: PeriodsNeeded,
    reason: Option<UnreachableReason>,
    end_date: Option<chrono::NaiveDate>,
    max_periods: u32,
) -> String {
    match (periods_needed, reason) {
        (PeriodsNeeded::Reached(0), _) => "You have already reached your savings goal.".to_string(),
        (PeriodsNeeded::Reached(n), _) => {
            let unit = if n == 1 { "month" } else { "months" };
            match end_date {
                Some(date) => format!("You will reach your goal in {n} {unit} (by {date})."),
                None => format!("You will reach your goal in {n} {unit}."),
            }
        }
        (PeriodsNeeded::Unreachable, Some(UnreachableReason::NoGrowth)) => {
            "Goal cannot be reached: with no monthly surplus and no interest the balance never grows."
                .to_string()
        }
        (PeriodsNeeded::Unreachable, Some(UnreachableReason::Stagnated)) => {
            "Goal cannot be reached: the balance stops growing before the target.".to_string()
        }
        (PeriodsNeeded::Unreachable, _) => {
            format!("Goal cannot be reached within {max_periods} months.")
        }
    }
}
