use chrono::{Months, NaiveDate};

/// Add calendar months, clamping the day to the end of shorter months
/// (Jan 31 + 1 month is the last day of February).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}
