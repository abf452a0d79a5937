//! Calculation logic for the payroll engine.
//!
//! This module contains the pure calculation functions: day classification
//! and working-day counting, salary proration, overtime pricing, the flat tax
//! deduction, and [`calculate_payroll`] which chains them for one employee.

mod calendar;
mod deductions;
mod overtime_pay;
mod payroll;
mod proration;

pub use calendar::{DayType, count_working_days, get_day_type};
pub use deductions::{DeductionResult, calculate_deductions};
pub use overtime_pay::{OvertimePayResult, calculate_overtime_pay};
pub use payroll::{PayrollInput, calculate_payroll, checked_total, round_money};
pub use proration::{ProratedSalaryResult, calculate_prorated_salary};

use crate::error::EngineError;

/// The error for an amount that left the range of `Decimal`.
pub(crate) fn overflow(quantity: &str) -> EngineError {
    EngineError::calculation(format!("{} overflowed", quantity))
}
