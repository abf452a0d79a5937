//! Attendance period model.
//!
//! An [`AttendancePeriod`] is the bounded date range that scopes attendance,
//! overtime, reimbursements and payroll. Its lifecycle flags are enforced by
//! `services::periods`; this module only holds the record and its pure queries.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    /// Open for submissions and payroll.
    Active,
    /// Closed; no payroll may run.
    Closed,
}

/// Represents an attendance period.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{AttendancePeriod, PeriodStatus};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let created = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let period = AttendancePeriod::new(
///     "June 2024",
///     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
///     true,
///     Uuid::new_v4(),
///     created,
/// );
///
/// assert_eq!(period.status, PeriodStatus::Active);
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendancePeriod {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name (e.g. "June 2024").
    pub name: String,
    /// First day of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Whether this is the current period. At most one period has this set.
    pub is_active: bool,
    /// Lifecycle status.
    pub status: PeriodStatus,
    /// One-way latch set once a full payroll run succeeded.
    pub payroll_processed: bool,
    /// When payroll was processed.
    pub processed_at: Option<NaiveDateTime>,
    /// Who processed payroll.
    pub processed_by: Option<Uuid>,
    /// Who created the period.
    pub created_by: Uuid,
    /// Who last changed the period.
    pub updated_by: Option<Uuid>,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last change time.
    pub updated_at: NaiveDateTime,
}

impl AttendancePeriod {
    /// Creates a new, unprocessed period with status [`PeriodStatus::Active`].
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        is_active: bool,
        created_by: Uuid,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date,
            end_date,
            is_active,
            status: PeriodStatus::Active,
            payroll_processed: false,
            processed_at: None,
            processed_by: None,
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks if a date falls within the period, inclusive of both ends.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Checks whether `[start, end]` overlaps this period.
    ///
    /// Overlap is any of: `start` inside this period, `end` inside this period,
    /// or `[start, end]` fully containing it.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.contains_date(start)
            || self.contains_date(end)
            || (start <= self.start_date && end >= self.end_date)
    }

    /// True for the period submissions currently go to.
    pub fn is_current(&self) -> bool {
        self.is_active && self.status == PeriodStatus::Active
    }

    /// True while payroll can still be run for this period.
    pub fn can_process_payroll(&self) -> bool {
        !self.payroll_processed && self.status == PeriodStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_june_period() -> AttendancePeriod {
        AttendancePeriod::new(
            "June 2024",
            date(2024, 6, 1),
            date(2024, 6, 30),
            true,
            Uuid::new_v4(),
            date(2024, 5, 20).and_hms_opt(10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_contains_date_bounds() {
        let period = create_june_period();
        assert!(period.contains_date(date(2024, 6, 1)));
        assert!(period.contains_date(date(2024, 6, 15)));
        assert!(period.contains_date(date(2024, 6, 30)));
        assert!(!period.contains_date(date(2024, 5, 31)));
        assert!(!period.contains_date(date(2024, 7, 1)));
    }

    #[test]
    fn test_overlaps_three_way() {
        let period = create_june_period();
        // new start inside
        assert!(period.overlaps(date(2024, 6, 20), date(2024, 7, 20)));
        // new end inside
        assert!(period.overlaps(date(2024, 5, 10), date(2024, 6, 1)));
        // new range contains existing
        assert!(period.overlaps(date(2024, 5, 1), date(2024, 7, 31)));
        // disjoint
        assert!(!period.overlaps(date(2024, 7, 1), date(2024, 7, 31)));
    }

    #[test]
    fn test_can_process_payroll() {
        let mut period = create_june_period();
        assert!(period.can_process_payroll());

        period.status = PeriodStatus::Closed;
        assert!(!period.can_process_payroll());

        period.status = PeriodStatus::Active;
        period.payroll_processed = true;
        assert!(!period.can_process_payroll());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PeriodStatus::Active).unwrap(),
            "\"ACTIVE\""
        );
        assert_eq!(
            serde_json::to_string(&PeriodStatus::Closed).unwrap(),
            "\"CLOSED\""
        );
    }
}
