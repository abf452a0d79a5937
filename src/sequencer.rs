//! Month-scoped, human-readable code generation.
//!
//! Employee codes look like `EMP2406001` (tag, `yymm`, 3-digit counter) and
//! payslip numbers like `PAY2024060001` (tag, `yyyymm`, 4-digit counter). The
//! counter restarts at 1 under each new month prefix.
//!
//! The next code is derived from the codes already stored, so callers must run
//! it inside the same unit of work that inserts the new code. The store's
//! unique index on the code column rejects any duplicate that slips through.

use chrono::NaiveDate;

/// Generates sequential codes under a month prefix.
///
/// # Example
///
/// ```
/// use payroll_engine::sequencer::CodeSequencer;
/// use chrono::NaiveDate;
///
/// let june = NaiveDate::from_ymd_opt(2024, 6, 17).unwrap();
/// let prefix = CodeSequencer::EMPLOYEE.prefix(june);
/// assert_eq!(prefix, "EMP2406");
///
/// let next = CodeSequencer::EMPLOYEE.next_code(&prefix, ["EMP2406001", "EMP2406002"]);
/// assert_eq!(next, "EMP2406003");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSequencer {
    tag: &'static str,
    date_format: &'static str,
    width: usize,
}

impl CodeSequencer {
    /// Employee codes: `EMPyymmNNN`.
    pub const EMPLOYEE: Self = Self {
        tag: "EMP",
        date_format: "%y%m",
        width: 3,
    };

    /// Payslip numbers: `PAYyyyymmNNNN`.
    pub const PAYSLIP: Self = Self {
        tag: "PAY",
        date_format: "%Y%m",
        width: 4,
    };

    /// The prefix for the month containing `date`.
    pub fn prefix(&self, date: NaiveDate) -> String {
        format!("{}{}", self.tag, date.format(self.date_format))
    }

    /// Returns the code following the greatest existing code under `prefix`.
    ///
    /// Codes whose suffix is not purely numeric are ignored. With no match the
    /// sequence starts at 1. A counter that outgrows the width is written with
    /// more digits (`999` is followed by `1000`), never wrapped.
    pub fn next_code<I, S>(&self, prefix: &str, existing: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let last = existing
            .into_iter()
            .filter_map(|code| {
                let suffix = code.as_ref().strip_prefix(prefix)?;
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                suffix.parse::<u64>().ok()
            })
            .max()
            .unwrap_or(0);

        format!("{}{:0width$}", prefix, last + 1, width = self.width)
    }

    /// Prefix for `date`, then the next code under it.
    pub fn generate<I, S>(&self, date: NaiveDate, existing: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.next_code(&self.prefix(date), existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_code_of_month() {
        let none: [&str; 0] = [];
        assert_eq!(
            CodeSequencer::EMPLOYEE.generate(date(2024, 6, 1), none),
            "EMP2406001"
        );
        assert_eq!(
            CodeSequencer::PAYSLIP.generate(date(2024, 6, 1), none),
            "PAY2024060001"
        );
    }

    #[test]
    fn test_other_months_are_ignored() {
        let existing = ["EMP2405007", "EMP2405008"];
        assert_eq!(
            CodeSequencer::EMPLOYEE.generate(date(2024, 6, 1), existing),
            "EMP2406001"
        );
    }

    #[test]
    fn test_overflow_widens() {
        let existing = ["EMP2406998", "EMP2406999"];
        assert_eq!(
            CodeSequencer::EMPLOYEE.next_code("EMP2406", existing),
            "EMP24061000"
        );

        let existing = ["EMP2406999", "EMP24061000"];
        assert_eq!(
            CodeSequencer::EMPLOYEE.next_code("EMP2406", existing),
            "EMP24061001"
        );
    }

    #[test]
    fn test_non_numeric_suffix_is_ignored() {
        let existing = ["EMP2406004", "EMP2406-X", "EMP2406"];
        assert_eq!(
            CodeSequencer::EMPLOYEE.next_code("EMP2406", existing),
            "EMP2406005"
        );
    }

    proptest! {
        #[test]
        fn prop_codes_are_contiguous(count in 1usize..60) {
            let june = date(2024, 6, 10);
            let mut issued: Vec<String> = Vec::new();
            for _ in 0..count {
                let code = CodeSequencer::EMPLOYEE.generate(june, &issued);
                issued.push(code);
            }
            for (i, code) in issued.iter().enumerate() {
                prop_assert_eq!(code, &format!("EMP2406{:03}", i + 1));
            }
        }

        #[test]
        fn prop_new_month_restarts(count in 1usize..30, day in 1u32..=28) {
            let mut issued: Vec<String> = Vec::new();
            for _ in 0..count {
                let code = CodeSequencer::PAYSLIP.generate(date(2024, 6, day), &issued);
                issued.push(code);
            }
            let next_month = CodeSequencer::PAYSLIP.generate(date(2024, 7, day), &issued);
            prop_assert_eq!(next_month, "PAY2024070001".to_string());
        }
    }
}
