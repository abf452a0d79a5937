//! Employee model and related types.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Employment status. Only active employees submit records or get paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeStatus {
    /// Currently employed.
    #[default]
    Active,
    /// No longer employed or suspended.
    Inactive,
}

/// Represents an employee on the payroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: Uuid,
    /// Generated, immutable code (e.g. `EMP2406001`).
    pub employee_code: String,
    /// HR-assigned employee number.
    pub employee_number: String,
    /// Full name.
    pub full_name: String,
    /// Work email.
    pub email: String,
    /// Department.
    pub department: String,
    /// Position or job title.
    pub position: String,
    /// Base monthly salary.
    pub monthly_salary: Decimal,
    /// Employment status.
    pub status: EmployeeStatus,
    /// Who created the record.
    pub created_by: Uuid,
    /// Who last changed the record.
    pub updated_by: Option<Uuid>,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last change time.
    pub updated_at: NaiveDateTime,
}

impl Employee {
    /// Returns true if the employee is active.
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Case-insensitive match against name, number, email, department and position.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [
            &self.full_name,
            &self.employee_number,
            &self.email,
            &self.department,
            &self.position,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}
