//! Eligibility gate for time-bound submissions.
//!
//! [`can_submit`] decides whether an employee may submit attendance, overtime
//! or a reimbursement right now, and returns the period the record belongs
//! to. Rules run in a fixed order and the first failure wins, so callers get
//! the most specific reason available.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::calculation::get_day_type;
use crate::config::OvertimePolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendancePeriod, AttendanceStatus, OvertimeWindow, PeriodStatus};
use crate::store::UnitOfWork;

/// What is being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Attendance for `date`, normally today.
    Attendance { employee_id: Uuid, date: NaiveDate },
    /// Overtime worked on `date`.
    Overtime {
        employee_id: Uuid,
        date: NaiveDate,
        window: OvertimeWindow,
    },
    /// A claim against `period_id`.
    Reimbursement {
        employee_id: Uuid,
        period_id: Uuid,
        amount: Decimal,
    },
}

impl Submission {
    fn employee_id(&self) -> Uuid {
        match self {
            Submission::Attendance { employee_id, .. }
            | Submission::Overtime { employee_id, .. }
            | Submission::Reimbursement { employee_id, .. } => *employee_id,
        }
    }
}

/// Rejects attendance on a Saturday or Sunday.
///
/// Needs no store access, so callers run it before opening a unit of work.
pub fn reject_weekend(date: NaiveDate) -> EngineResult<()> {
    if get_day_type(date).is_weekend() {
        return Err(EngineError::bad_request("Cannot submit attendance on weekends"));
    }
    Ok(())
}

/// Largest money amount a record may hold: 13 whole digits and 2 decimals.
pub fn max_money() -> Decimal {
    Decimal::new(999_999_999_999_999, 2)
}

/// Rejects money with more than two decimal places or above [`max_money`].
pub fn validate_money(amount: Decimal, field: &str) -> EngineResult<()> {
    if amount.normalize().scale() > 2 {
        return Err(EngineError::bad_request(format!(
            "{} cannot have more than 2 decimal places",
            field
        )));
    }
    if amount > max_money() {
        return Err(EngineError::bad_request(format!(
            "{} cannot exceed {}",
            field,
            max_money()
        )));
    }
    Ok(())
}

/// Rejects a reimbursement amount that is zero or negative, or out of range.
pub fn reject_non_positive_amount(amount: Decimal) -> EngineResult<()> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::bad_request(
            "Reimbursement amount must be greater than zero",
        ));
    }
    validate_money(amount, "Reimbursement amount")
}

/// Checks declared overtime hours against the daily bounds.
pub fn validate_overtime_hours(hours: Decimal, policy: &OvertimePolicy) -> EngineResult<()> {
    if hours <= Decimal::ZERO {
        return Err(EngineError::bad_request("Hours worked must be greater than zero"));
    }
    if hours > policy.max_hours_per_day {
        return Err(EngineError::bad_request(format!(
            "Maximum overtime is {} hours per day",
            policy.max_hours_per_day.normalize()
        )));
    }
    Ok(())
}

/// Checks the declared span: hours must match the clock times and the span
/// must stay outside regular hours.
pub fn validate_overtime_window(window: &OvertimeWindow, policy: &OvertimePolicy) -> EngineResult<()> {
    if !window.hours_match_span(policy.hours_tolerance) {
        return Err(EngineError::bad_request(
            "Hours worked does not match the time range provided",
        ));
    }
    if !window.is_outside(&policy.regular_hours) {
        return Err(EngineError::bad_request(format!(
            "Overtime must be outside regular working hours ({}-{})",
            policy.regular_hours.start.format("%H:%M"),
            policy.regular_hours.end.format("%H:%M")
        )));
    }
    Ok(())
}

/// Decides whether `submission` is allowed at `now`.
///
/// On success returns the period the record belongs to.
///
/// # Errors
///
/// - `NotFound` when the employee or a referenced period does not exist.
/// - `BadRequest` for every rule violation, with a specific reason.
pub fn can_submit(
    tx: &mut dyn UnitOfWork,
    submission: &Submission,
    now: NaiveDateTime,
    policy: &OvertimePolicy,
) -> EngineResult<AttendancePeriod> {
    let employee = tx
        .employees()
        .get(submission.employee_id())
        .ok_or_else(|| EngineError::not_found("Employee not found"))?;
    if !employee.is_active() {
        return Err(EngineError::bad_request("Employee account is not active"));
    }

    match *submission {
        Submission::Attendance { date, .. } => {
            reject_weekend(date)?;
            let period = tx
                .periods()
                .find_first(&|p| p.is_current() && p.contains_date(date))
                .ok_or_else(|| {
                    EngineError::bad_request("No active attendance period found for today")
                })?;
            if period.payroll_processed {
                return Err(EngineError::bad_request(
                    "Cannot submit attendance for processed payroll period",
                ));
            }
            Ok(period)
        }
        Submission::Overtime {
            employee_id,
            date,
            window,
        } => {
            let period = tx
                .periods()
                .find_first(&|p| p.is_current())
                .ok_or_else(|| EngineError::bad_request("No active attendance period found"))?;
            if !period.contains_date(date) {
                return Err(EngineError::bad_request(
                    "Overtime date must be within the active attendance period",
                ));
            }
            if period.payroll_processed {
                return Err(EngineError::bad_request(
                    "Cannot submit overtime for processed payroll period",
                ));
            }
            if date > now.date() {
                return Err(EngineError::bad_request("Cannot submit overtime for future dates"));
            }

            let duplicate = tx
                .overtime()
                .count(&|o| o.employee_id == employee_id && o.date == date);
            if duplicate > 0 {
                return Err(EngineError::bad_request(
                    "Overtime record already exists for this date",
                ));
            }

            let attendance = tx
                .attendance()
                .find_first(&|a| a.employee_id == employee_id && a.date == date)
                .ok_or_else(|| EngineError::bad_request("No attendance record found for this date"))?;
            if attendance.status != AttendanceStatus::Present {
                return Err(EngineError::bad_request(
                    "Cannot submit overtime when attendance status is not PRESENT",
                ));
            }

            validate_overtime_window(&window, policy)?;
            Ok(period)
        }
        Submission::Reimbursement {
            period_id, amount, ..
        } => {
            reject_non_positive_amount(amount)?;
            let period = tx
                .periods()
                .get(period_id)
                .ok_or_else(|| EngineError::not_found("Attendance period not found"))?;
            if period.status != PeriodStatus::Active {
                return Err(EngineError::bad_request(
                    "Cannot submit reimbursement for inactive period",
                ));
            }
            if period.payroll_processed {
                return Err(EngineError::bad_request(
                    "Cannot submit reimbursement for processed payroll period",
                ));
            }
            if !period.contains_date(now.date()) {
                return Err(EngineError::bad_request(
                    "Can only submit reimbursements during the active attendance period",
                ));
            }
            Ok(period)
        }
    }
}
