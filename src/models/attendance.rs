//! Daily attendance records.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attendance status for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    /// The employee attended.
    Present,
    /// The employee was absent.
    Absent,
}

/// One employee's attendance for one calendar day.
///
/// Unique per `(employee_id, date)`; `date` always lies inside the range of
/// the referenced period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee this record belongs to.
    pub employee_id: Uuid,
    /// The period whose range contains `date`.
    pub attendance_period_id: Uuid,
    /// The calendar day.
    pub date: NaiveDate,
    /// When the submission was made.
    pub check_in_time: NaiveDateTime,
    /// Attendance status.
    pub status: AttendanceStatus,
    /// Free-form note from the employee.
    pub notes: Option<String>,
    /// Who submitted the record.
    pub created_by: Uuid,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last change time.
    pub updated_at: NaiveDateTime,
}

impl Attendance {
    /// True when this record counts as an attended day.
    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}
