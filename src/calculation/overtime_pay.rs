//! Overtime pay from approved overtime hours.
//!
//! The hourly rate is the salary for one working day spread over the paid
//! hours of a day. Overtime is paid at that rate times the configured
//! multiplier.

use rust_decimal::Decimal;

use crate::config::PayrollPolicy;
use crate::error::EngineResult;
use crate::models::CalculationStep;

use super::overflow;

/// The result of pricing overtime, including the audit step.
#[derive(Debug, Clone)]
pub struct OvertimePayResult {
    /// Salary per working hour, unrounded.
    pub hourly_rate: Decimal,
    /// Hourly rate times the multiplier, unrounded.
    pub overtime_rate: Decimal,
    /// Hours times the overtime rate, unrounded.
    pub amount: Decimal,
    pub audit_step: CalculationStep,
}

/// Prices `overtime_hours` for an employee on `monthly_salary`.
///
/// The caller guarantees `working_days > 0` and a positive `hours_per_day`.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`](crate::error::EngineError) when a
/// rate or the amount leaves the range of `Decimal`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_overtime_pay;
/// use payroll_engine::config::PayrollPolicy;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let result = calculate_overtime_pay(
///     Decimal::from_str("5749.58").unwrap(),
///     6,
///     Decimal::from(3),
///     &PayrollPolicy::default(),
///     3,
/// )
/// .unwrap();
///
/// assert_eq!(result.overtime_rate.round_dp(2), Decimal::from_str("179.67").unwrap());
/// assert_eq!(result.amount.round_dp(2), Decimal::from_str("539.02").unwrap());
/// ```
pub fn calculate_overtime_pay(
    monthly_salary: Decimal,
    working_days: u32,
    overtime_hours: Decimal,
    policy: &PayrollPolicy,
    step_number: u32,
) -> EngineResult<OvertimePayResult> {
    let hourly_rate = monthly_salary
        .checked_div(Decimal::from(working_days))
        .and_then(|daily| daily.checked_div(policy.hours_per_day))
        .ok_or_else(|| overflow("Hourly rate"))?;
    let overtime_rate = hourly_rate
        .checked_mul(policy.overtime_multiplier)
        .ok_or_else(|| overflow("Overtime rate"))?;
    let amount = overtime_hours
        .checked_mul(overtime_rate)
        .ok_or_else(|| overflow("Overtime pay"))?;

    let reasoning = if overtime_hours.is_zero() {
        "No approved overtime in this period".to_string()
    } else {
        format!(
            "{} hours × ${} (${} hourly × {}) = ${}",
            overtime_hours.normalize(),
            overtime_rate.round_dp(2),
            hourly_rate.round_dp(2),
            policy.overtime_multiplier.normalize(),
            amount.round_dp(2)
        )
    };

    let audit_step = CalculationStep {
        step_number,
        rule_id: "overtime_pay".to_string(),
        rule_name: "Overtime Pay".to_string(),
        input: serde_json::json!({
            "monthly_salary": monthly_salary.normalize().to_string(),
            "working_days": working_days,
            "hours_per_day": policy.hours_per_day.normalize().to_string(),
            "overtime_multiplier": policy.overtime_multiplier.normalize().to_string(),
            "overtime_hours": overtime_hours.normalize().to_string()
        }),
        output: serde_json::json!({
            "hourly_rate": hourly_rate.round_dp(4).normalize().to_string(),
            "overtime_rate": overtime_rate.round_dp(4).normalize().to_string(),
            "overtime_pay": amount.round_dp(4).normalize().to_string()
        }),
        reasoning,
    };

    Ok(OvertimePayResult {
        hourly_rate,
        overtime_rate,
        amount,
        audit_step,
    })
}
