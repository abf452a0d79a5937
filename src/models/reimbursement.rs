//! Expense reimbursement claims.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review status of a reimbursement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReimbursementStatus {
    /// Awaiting review; the only editable state.
    Pending,
    /// Approved; counts towards payroll.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
}

/// An expense claim attached to a period rather than a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reimbursement {
    /// Unique identifier.
    pub id: Uuid,
    /// The claimant.
    pub employee_id: Uuid,
    /// The period the claim is paid in.
    pub attendance_period_id: Uuid,
    /// Claimed amount, always greater than zero.
    pub amount: Decimal,
    /// What the expense was for.
    pub description: String,
    /// Link to the receipt.
    pub receipt_url: Option<String>,
    /// Review status.
    pub status: ReimbursementStatus,
    /// Reviewer who approved the claim.
    pub approved_by: Option<Uuid>,
    /// When the claim was approved.
    pub approved_at: Option<NaiveDateTime>,
    /// Who submitted the claim.
    pub created_by: Uuid,
    /// Who last changed the claim.
    pub updated_by: Option<Uuid>,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last change time.
    pub updated_at: NaiveDateTime,
}

impl Reimbursement {
    /// True while the claim may still be edited or deleted.
    pub fn is_pending(&self) -> bool {
        self.status == ReimbursementStatus::Pending
    }
}
