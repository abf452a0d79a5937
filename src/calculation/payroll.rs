//! One employee's payroll for one period.
//!
//! [`calculate_payroll`] is pure: the caller gathers the facts (attended days,
//! approved overtime hours, approved reimbursements) and this module turns them
//! into a [`PayrollCalculation`] with a step-by-step trace.
//!
//! Intermediate amounts are carried at full precision. Money written to the
//! result is rounded to `money_scale` places, midpoint away from zero. Gross pay
//! is rounded once from the unrounded components. The tax threshold and rate
//! apply to the unrounded gross; net is the exact difference of the rounded
//! gross and rounded deductions.
//!
//! Every sum and product is checked. An amount outside the range of `Decimal`
//! is a calculation error rather than a panic.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PayrollPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationStep, CalculationTrace, CalculationWarning, PayrollCalculation};

use super::{
    calculate_deductions, calculate_overtime_pay, calculate_prorated_salary, count_working_days,
    overflow,
};

/// The facts a payroll calculation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollInput {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub monthly_salary: Decimal,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// PRESENT attendance records in the period.
    pub attended_days: u32,
    /// Sum of APPROVED overtime hours in the period.
    pub overtime_hours: Decimal,
    /// Sum of APPROVED reimbursements in the period.
    pub reimbursements: Decimal,
}

/// Rounds a money amount to `scale` places, midpoint away from zero.
pub fn round_money(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Adds up `values`, failing with `"{quantity} overflowed"` instead of panicking.
pub fn checked_total<I>(values: I, quantity: &str) -> EngineResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
        .ok_or_else(|| overflow(quantity))
}

/// Calculates one employee's pay for one period.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the period contains no working
/// day, the policy's `hours_per_day` is not positive, or an amount overflows.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{calculate_payroll, PayrollInput};
/// use payroll_engine::config::PayrollPolicy;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
/// use uuid::Uuid;
///
/// let input = PayrollInput {
///     employee_id: Uuid::new_v4(),
///     employee_name: "Howard Hoeger".to_string(),
///     monthly_salary: Decimal::from_str("5749.58").unwrap(),
///     period_start: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
///     period_end: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
///     attended_days: 1,
///     overtime_hours: Decimal::from(3),
///     reimbursements: Decimal::ZERO,
/// };
///
/// let result = calculate_payroll(&input, &PayrollPolicy::default()).unwrap();
/// assert_eq!(result.working_days, 6);
/// assert_eq!(result.gross_pay, Decimal::from_str("1497.29").unwrap());
/// assert_eq!(result.net_pay, Decimal::from_str("1497.29").unwrap());
/// ```
pub fn calculate_payroll(
    input: &PayrollInput,
    policy: &PayrollPolicy,
) -> EngineResult<PayrollCalculation> {
    if policy.hours_per_day <= Decimal::ZERO {
        return Err(EngineError::calculation("hours_per_day must be greater than zero"));
    }

    let scale = policy.money_scale;
    let mut trace = CalculationTrace::default();

    // Step 1: working days in the period
    let working_days = count_working_days(input.period_start, input.period_end);
    trace.steps.push(CalculationStep {
        step_number: 1,
        rule_id: "working_days".to_string(),
        rule_name: "Working Days".to_string(),
        input: serde_json::json!({
            "period_start": input.period_start,
            "period_end": input.period_end
        }),
        output: serde_json::json!({ "working_days": working_days }),
        reasoning: format!(
            "{} Monday–Friday days between {} and {}",
            working_days, input.period_start, input.period_end
        ),
    });

    if working_days == 0 {
        return Err(EngineError::calculation("Attendance period has no working days"));
    }

    if input.attended_days > working_days {
        trace.warnings.push(CalculationWarning {
            code: "ATTENDANCE_EXCEEDS_WORKING_DAYS".to_string(),
            message: format!(
                "{} attended days recorded against {} working days",
                input.attended_days, working_days
            ),
        });
    }

    // Step 2: prorated salary
    let prorated = calculate_prorated_salary(
        input.monthly_salary,
        working_days,
        input.attended_days,
        2,
    )?;
    trace.steps.push(prorated.audit_step);

    // Step 3: overtime pay
    let overtime = calculate_overtime_pay(
        input.monthly_salary,
        working_days,
        input.overtime_hours,
        policy,
        3,
    )?;
    trace.steps.push(overtime.audit_step);

    // Step 4: gross pay
    let raw_gross = prorated
        .amount
        .checked_add(overtime.amount)
        .and_then(|sum| sum.checked_add(input.reimbursements))
        .ok_or_else(|| overflow("Gross pay"))?;
    let gross_pay = round_money(raw_gross, scale);
    trace.steps.push(CalculationStep {
        step_number: 4,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        input: serde_json::json!({
            "prorated_salary": prorated.amount.round_dp(4).normalize().to_string(),
            "overtime_pay": overtime.amount.round_dp(4).normalize().to_string(),
            "reimbursements": input.reimbursements.normalize().to_string()
        }),
        output: serde_json::json!({ "gross_pay": gross_pay.to_string() }),
        reasoning: format!(
            "${} salary + ${} overtime + ${} reimbursements = ${}",
            round_money(prorated.amount, scale),
            round_money(overtime.amount, scale),
            round_money(input.reimbursements, scale),
            gross_pay
        ),
    });

    // Step 5: deductions
    let deductions_result = calculate_deductions(raw_gross, &policy.tax, 5)?;
    let deductions = round_money(deductions_result.amount, scale);
    trace.steps.push(deductions_result.audit_step);

    // Step 6: net pay
    let net_pay = gross_pay
        .checked_sub(deductions)
        .ok_or_else(|| overflow("Net pay"))?;
    trace.steps.push(CalculationStep {
        step_number: 6,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "deductions": deductions.to_string()
        }),
        output: serde_json::json!({ "net_pay": net_pay.to_string() }),
        reasoning: format!("${} - ${} = ${}", gross_pay, deductions, net_pay),
    });

    Ok(PayrollCalculation {
        employee_id: input.employee_id,
        employee_name: input.employee_name.clone(),
        base_salary: input.monthly_salary,
        working_days,
        attended_days: input.attended_days,
        prorated_salary: round_money(prorated.amount, scale),
        overtime_hours: input.overtime_hours,
        hourly_rate: round_money(overtime.hourly_rate, scale),
        overtime_rate: round_money(overtime.overtime_rate, scale),
        overtime_pay: round_money(overtime.amount, scale),
        reimbursements: round_money(input.reimbursements, scale),
        gross_pay,
        deductions,
        net_pay,
        trace,
    })
}
