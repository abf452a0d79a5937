//! Salary proration by attendance.

use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::CalculationStep;

use super::overflow;

/// The prorated salary and the step recording it.
#[derive(Debug, Clone)]
pub struct ProratedSalaryResult {
    /// Unrounded prorated salary.
    pub amount: Decimal,
    /// Salary for one working day.
    pub daily_rate: Decimal,
    pub audit_step: CalculationStep,
}

/// Scales the monthly salary by attended over working days.
///
/// `monthly_salary / working_days * attended_days`, kept at full precision.
/// The caller guarantees `working_days > 0`.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`](crate::error::EngineError) when
/// the salary is too large to scale.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_prorated_salary;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let result = calculate_prorated_salary(Decimal::from_str("5749.58").unwrap(), 6, 1, 2).unwrap();
/// assert_eq!(result.amount.round_dp(2), Decimal::from_str("958.26").unwrap());
/// ```
pub fn calculate_prorated_salary(
    monthly_salary: Decimal,
    working_days: u32,
    attended_days: u32,
    step_number: u32,
) -> EngineResult<ProratedSalaryResult> {
    let daily_rate = monthly_salary
        .checked_div(Decimal::from(working_days))
        .ok_or_else(|| overflow("Daily rate"))?;
    let amount = daily_rate
        .checked_mul(Decimal::from(attended_days))
        .ok_or_else(|| overflow("Prorated salary"))?;

    let audit_step = CalculationStep {
        step_number,
        rule_id: "prorated_salary".to_string(),
        rule_name: "Prorated Salary".to_string(),
        input: serde_json::json!({
            "monthly_salary": monthly_salary.normalize().to_string(),
            "working_days": working_days,
            "attended_days": attended_days
        }),
        output: serde_json::json!({
            "daily_rate": daily_rate.round_dp(4).normalize().to_string(),
            "prorated_salary": amount.round_dp(4).normalize().to_string()
        }),
        reasoning: format!(
            "${} / {} working days × {} attended days = ${}",
            monthly_salary.normalize(),
            working_days,
            attended_days,
            amount.round_dp(2)
        ),
    };

    Ok(ProratedSalaryResult {
        amount,
        daily_rate,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_full_attendance_pays_full_salary() {
        let result = calculate_prorated_salary(dec("11000"), 22, 22, 2).unwrap();
        assert_eq!(result.amount, dec("11000"));
        assert_eq!(result.daily_rate, dec("500"));
    }

    #[test]
    fn test_no_attendance_pays_nothing() {
        let result = calculate_prorated_salary(dec("8000"), 20, 0, 2).unwrap();
        assert_eq!(result.amount, Decimal::ZERO);
    }

    #[test]
    fn test_audit_step_records_inputs() {
        let result = calculate_prorated_salary(dec("5749.58"), 6, 1, 2).unwrap();
        assert_eq!(result.audit_step.step_number, 2);
        assert_eq!(result.audit_step.rule_id, "prorated_salary");
        assert_eq!(result.audit_step.input["working_days"], 6);
        assert_eq!(result.audit_step.output["prorated_salary"], "958.2633");
    }

    #[test]
    fn test_salary_too_large_to_scale() {
        let result = calculate_prorated_salary(Decimal::MAX, 1, 2, 2);
        assert_eq!(
            result.unwrap_err(),
            crate::error::EngineError::calculation("Prorated salary overflowed")
        );
    }
}
