//! Flat-bracket tax deduction.

use rust_decimal::Decimal;

use crate::config::TaxPolicy;
use crate::error::EngineResult;
use crate::models::CalculationStep;

use super::overflow;

/// The deduction and its audit step.
#[derive(Debug, Clone)]
pub struct DeductionResult {
    /// Amount withheld, unrounded.
    pub amount: Decimal,
    /// Whether gross pay crossed the threshold.
    pub applied: bool,
    pub audit_step: CalculationStep,
}

/// Withholds `gross_pay × rate` when gross pay is strictly above the threshold.
///
/// `gross_pay` is compared as given, so pass it before rounding.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`](crate::error::EngineError) when
/// the deduction leaves the range of `Decimal`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_deductions;
/// use payroll_engine::config::TaxPolicy;
/// use rust_decimal::Decimal;
///
/// let policy = TaxPolicy::default();
/// assert_eq!(calculate_deductions(Decimal::from(5000), &policy, 5).unwrap().amount, Decimal::ZERO);
/// assert_eq!(calculate_deductions(Decimal::from(11000), &policy, 5).unwrap().amount, Decimal::from(1100));
/// ```
pub fn calculate_deductions(
    gross_pay: Decimal,
    policy: &TaxPolicy,
    step_number: u32,
) -> EngineResult<DeductionResult> {
    let applied = gross_pay > policy.threshold;
    let amount = if applied {
        gross_pay
            .checked_mul(policy.rate)
            .ok_or_else(|| overflow("Deductions"))?
    } else {
        Decimal::ZERO
    };
    let shown = gross_pay.round_dp(4).normalize();

    let reasoning = if applied {
        format!(
            "Gross ${} is above ${}: ${} × {} = ${}",
            shown,
            policy.threshold.normalize(),
            shown,
            policy.rate.normalize(),
            amount.round_dp(2)
        )
    } else {
        format!(
            "Gross ${} is at or below ${}: no deduction",
            shown,
            policy.threshold.normalize()
        )
    };

    let audit_step = CalculationStep {
        step_number,
        rule_id: "deductions".to_string(),
        rule_name: "Tax Deduction".to_string(),
        input: serde_json::json!({
            "gross_pay": shown.to_string(),
            "threshold": policy.threshold.normalize().to_string(),
            "rate": policy.rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "applied": applied,
            "deductions": amount.normalize().to_string()
        }),
        reasoning,
    };

    Ok(DeductionResult {
        amount,
        applied,
        audit_step,
    })
}
