//! Payroll calculation output and its step-by-step trace.
//!
//! A [`PayrollCalculation`] is what the calculator produces for one employee in
//! one period. The batch processor freezes it into a [`super::Payslip`]; the
//! preview endpoints return it as-is, trace included.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single step in the calculation trace.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationStep {
    /// The sequential step number.
    pub step_number: u32,
    /// Stable identifier of the rule (e.g. `prorated_salary`).
    pub rule_id: String,
    /// Human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// Something unusual noticed while calculating that did not stop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description.
    pub message: String,
}

/// The complete trace of one calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationTrace {
    /// Steps in the order they were applied.
    pub steps: Vec<CalculationStep>,
    /// Warnings raised along the way.
    pub warnings: Vec<CalculationWarning>,
}

/// Result of calculating one employee's pay for one period.
///
/// Money components are rounded to the configured scale; `hourly_rate` and
/// `overtime_rate` are rounded the same way for display while the amounts
/// derived from them were computed at full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollCalculation {
    /// The employee calculated for.
    pub employee_id: Uuid,
    /// Employee's name at calculation time.
    pub employee_name: String,
    /// Monthly salary used as the base.
    pub base_salary: Decimal,
    /// Mon–Fri days in the period.
    pub working_days: u32,
    /// PRESENT attendance records in the period.
    pub attended_days: u32,
    /// Salary scaled by attended over working days.
    pub prorated_salary: Decimal,
    /// Sum of approved overtime hours.
    pub overtime_hours: Decimal,
    /// Salary per working hour.
    pub hourly_rate: Decimal,
    /// Hourly rate times the overtime multiplier.
    pub overtime_rate: Decimal,
    /// Overtime hours times the overtime rate.
    pub overtime_pay: Decimal,
    /// Sum of approved reimbursements.
    pub reimbursements: Decimal,
    /// Prorated salary plus overtime pay plus reimbursements.
    pub gross_pay: Decimal,
    /// Tax withheld.
    pub deductions: Decimal,
    /// Gross pay minus deductions.
    pub net_pay: Decimal,
    /// How the numbers were reached.
    pub trace: CalculationTrace,
}
