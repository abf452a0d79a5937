//! Core data models for the payroll engine.
//!
//! This module contains the records the engine reads and writes: periods,
//! employees, the three kinds of submissions, payslips, and the calculation
//! output the payslips are frozen from.

mod attendance;
mod employee;
mod overtime;
mod page;
mod payroll_calculation;
mod payslip;
mod period;
mod reimbursement;

pub use attendance::{Attendance, AttendanceStatus};
pub use employee::{Employee, EmployeeStatus};
pub use overtime::{Overtime, OvertimeStatus, OvertimeWindow, clock_time};
pub use page::{Page, PageRequest, Pagination};
pub use payroll_calculation::{
    CalculationStep, CalculationTrace, CalculationWarning, PayrollCalculation,
};
pub use payslip::Payslip;
pub use period::{AttendancePeriod, PeriodStatus};
pub use reimbursement::{Reimbursement, ReimbursementStatus};
