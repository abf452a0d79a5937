//! Payslip snapshot.
//!
//! A payslip freezes every component of a [`PayrollCalculation`] at the time
//! payroll ran. It is created once per employee and period and never
//! recalculated.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PayrollCalculation;

/// Stored payslip for one employee in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payslip {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee paid.
    pub employee_id: Uuid,
    /// The period paid for.
    pub attendance_period_id: Uuid,
    /// Generated, immutable number (e.g. `PAY2024060001`).
    pub payslip_number: String,
    /// Employee name at generation time.
    pub employee_name: String,
    pub base_salary: Decimal,
    pub working_days: u32,
    pub attended_days: u32,
    pub prorated_salary: Decimal,
    pub total_overtime_hours: Decimal,
    pub overtime_rate: Decimal,
    pub total_overtime_pay: Decimal,
    pub total_reimbursements: Decimal,
    pub gross_pay: Decimal,
    pub deductions: Decimal,
    pub net_pay: Decimal,
    /// Who ran payroll.
    pub created_by: Uuid,
    /// Generation time.
    pub created_at: NaiveDateTime,
}

impl Payslip {
    /// Freezes a calculation into a payslip.
    pub fn from_calculation(
        calculation: &PayrollCalculation,
        period_id: Uuid,
        payslip_number: String,
        created_by: Uuid,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: calculation.employee_id,
            attendance_period_id: period_id,
            payslip_number,
            employee_name: calculation.employee_name.clone(),
            base_salary: calculation.base_salary,
            working_days: calculation.working_days,
            attended_days: calculation.attended_days,
            prorated_salary: calculation.prorated_salary,
            total_overtime_hours: calculation.overtime_hours,
            overtime_rate: calculation.overtime_rate,
            total_overtime_pay: calculation.overtime_pay,
            total_reimbursements: calculation.reimbursements,
            gross_pay: calculation.gross_pay,
            deductions: calculation.deductions,
            net_pay: calculation.net_pay,
            created_by,
            created_at: now,
        }
    }
}
