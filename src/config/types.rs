//! Configuration types for the payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat-bracket tax rule applied to gross pay.
///
/// Gross pay strictly above `threshold` is taxed at `rate`; anything at or
/// below it is not taxed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    /// Gross pay above which the rate applies.
    pub threshold: Decimal,
    /// Fraction of gross pay withheld (e.g. 0.10).
    pub rate: Decimal,
}

/// Payroll calculation parameters from `payroll.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollPolicy {
    /// Paid hours in one working day, used to derive the hourly rate.
    pub hours_per_day: Decimal,
    /// Multiplier applied to the hourly rate for overtime.
    pub overtime_multiplier: Decimal,
    /// Decimal places kept for money in payslip snapshots.
    pub money_scale: u32,
    /// Deduction rule.
    pub tax: TaxPolicy,
}

/// The fixed regular-hours window overtime must stay outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegularHours {
    /// Start of regular hours.
    pub start: NaiveTime,
    /// End of regular hours.
    pub end: NaiveTime,
}

/// Overtime submission limits from `overtime.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimePolicy {
    /// Upper bound (inclusive) on overtime hours per day.
    pub max_hours_per_day: Decimal,
    /// Allowed gap between declared hours and the start/end span.
    pub hours_tolerance: Decimal,
    /// Regular working hours.
    pub regular_hours: RegularHours,
}

/// Pagination limits from `pagination.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationPolicy {
    /// Page size used when the caller gives none.
    pub default_limit: u32,
    /// Largest page size a caller may ask for.
    pub max_limit: u32,
}

/// The complete engine configuration.
///
/// Aggregates every file of a configuration directory. `Default` reproduces
/// the shipped `config/payroll` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Payroll calculation parameters.
    pub payroll: PayrollPolicy,
    /// Overtime submission limits.
    pub overtime: OvertimePolicy,
    /// Pagination limits.
    pub pagination: PaginationPolicy,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            threshold: Decimal::from(5000),
            rate: Decimal::new(10, 2),
        }
    }
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            hours_per_day: Decimal::from(8),
            overtime_multiplier: Decimal::new(15, 1),
            money_scale: 2,
            tax: TaxPolicy::default(),
        }
    }
}

impl Default for RegularHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
        }
    }
}

impl Default for OvertimePolicy {
    fn default() -> Self {
        Self {
            max_hours_per_day: Decimal::from(3),
            hours_tolerance: Decimal::new(1, 1),
            regular_hours: RegularHours::default(),
        }
    }
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            payroll: PayrollPolicy::default(),
            overtime: OvertimePolicy::default(),
            pagination: PaginationPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_flat_bracket() {
        let policy = PayrollPolicy::default();
        assert_eq!(policy.tax.threshold, Decimal::from(5000));
        assert_eq!(policy.tax.rate.to_string(), "0.10");
        assert_eq!(policy.overtime_multiplier.to_string(), "1.5");
        assert_eq!(policy.hours_per_day, Decimal::from(8));
    }

    #[test]
    fn test_default_regular_hours() {
        let hours = RegularHours::default();
        assert_eq!(hours.start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(hours.end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
    }

    #[test]
    fn test_deserialize_overtime_policy() {
        let yaml = r#"
max_hours_per_day: "3"
hours_tolerance: "0.1"
regular_hours:
  start: "07:30:00"
  end: "16:30:00"
"#;
        let policy: OvertimePolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.max_hours_per_day, Decimal::from(3));
        assert_eq!(
            policy.regular_hours.start,
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
    }
}
