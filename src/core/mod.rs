mod calendar;
mod engine;
mod error;
mod money;
mod types;

pub use calendar::add_months;
pub use engine::{compute, compute_with_horizon};
pub use error::{Field, ValidationError};
pub use money::round_cents;
pub use types::{
    LedgerEntry, MAX_PERIODS, PeriodsNeeded, ProjectionInput, ProjectionResult, UnreachableReason,
};
