//! Day classification and working-day counting.
//!
//! Weekends are Saturday and Sunday. There is no public-holiday calendar: every
//! Monday to Friday inside a period counts as a working day.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Whether a date is a working day.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::DayType;
///
/// let day_type = DayType::Saturday;
/// assert_eq!(format!("{:?}", day_type), "Saturday");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    /// Monday through Friday.
    Weekday,
    Saturday,
    Sunday,
}

impl DayType {
    /// True for Saturday and Sunday.
    pub fn is_weekend(self) -> bool {
        matches!(self, DayType::Saturday | DayType::Sunday)
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayType::Weekday => write!(f, "Weekday"),
            DayType::Saturday => write!(f, "Saturday"),
            DayType::Sunday => write!(f, "Sunday"),
        }
    }
}

/// Determines the day type for a given date.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{get_day_type, DayType};
/// use chrono::NaiveDate;
///
/// // 2024-06-08 is a Saturday
/// let saturday = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
/// assert_eq!(get_day_type(saturday), DayType::Saturday);
///
/// // 2024-06-10 is a Monday
/// let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
/// assert_eq!(get_day_type(monday), DayType::Weekday);
/// ```
pub fn get_day_type(date: NaiveDate) -> DayType {
    match date.weekday() {
        Weekday::Sat => DayType::Saturday,
        Weekday::Sun => DayType::Sunday,
        _ => DayType::Weekday,
    }
}

/// Counts Monday–Friday dates in `[start, end]`, both ends included.
///
/// Returns 0 when `start` is after `end`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::count_working_days;
/// use chrono::NaiveDate;
///
/// // Monday 3 June to Monday 10 June 2024
/// let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
/// assert_eq!(count_working_days(start, end), 6);
/// ```
pub fn count_working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| !get_day_type(*date).is_weekend())
        .count() as u32
}
