//! Expense reimbursement claims.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::audit::{Actor, AuditAction, AuditEntry};
use crate::calculation::checked_total;
use crate::error::{EngineError, EngineResult};
use crate::models::{Page, PageRequest, PeriodStatus, Reimbursement, ReimbursementStatus};
use crate::store::{Record, UnitOfWork};

use super::Context;
use super::eligibility::{Submission, can_submit, reject_non_positive_amount};

/// Input for a reimbursement claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReimbursement {
    pub attendance_period_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    #[serde(default)]
    pub receipt_url: Option<String>,
}

/// Partial update of a pending claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReimbursement {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub receipt_url: Option<String>,
}

/// Reviewer decision on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReimbursementStatus {
    pub status: ReimbursementStatus,
}

/// Filters for listing an employee's claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReimbursementQuery {
    #[serde(default)]
    pub attendance_period_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<ReimbursementStatus>,
}

/// Count and total amount of claims in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReimbursementStatusSummary {
    pub status: ReimbursementStatus,
    pub count: usize,
    pub total_amount: Decimal,
}

fn find_reimbursement(
    tx: &mut dyn UnitOfWork,
    id: Uuid,
    employee_id: Option<Uuid>,
) -> EngineResult<Reimbursement> {
    tx.reimbursements()
        .get(id)
        .filter(|r| employee_id.is_none_or(|e| r.employee_id == e))
        .ok_or_else(|| EngineError::not_found("Reimbursement not found"))
}

/// Checks that an employee may still change `claim`. `verb` is "update" or
/// "delete" and ends up in the message.
fn ensure_editable(tx: &mut dyn UnitOfWork, claim: &Reimbursement, verb: &str) -> EngineResult<()> {
    if claim.status != ReimbursementStatus::Pending {
        return Err(EngineError::forbidden(format!(
            "Can only {} pending reimbursements",
            verb
        )));
    }
    let period = tx
        .periods()
        .get(claim.attendance_period_id)
        .ok_or_else(|| EngineError::not_found("Attendance period not found"))?;
    if period.status != PeriodStatus::Active {
        return Err(EngineError::bad_request(format!(
            "Cannot {} reimbursement for inactive period",
            verb
        )));
    }
    if period.payroll_processed {
        return Err(EngineError::bad_request(format!(
            "Cannot {} reimbursement for processed payroll period",
            verb
        )));
    }
    Ok(())
}

/// Reimbursement operations.
#[derive(Clone)]
pub struct ReimbursementService {
    ctx: Context,
}

impl ReimbursementService {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Files a claim against a period.
    ///
    /// # Errors
    ///
    /// An amount that is not positive or does not fit a money column is
    /// refused before the store is touched;
    /// everything else comes from the eligibility gate.
    pub async fn create(
        &self,
        employee_id: Uuid,
        input: CreateReimbursement,
        actor: &Actor,
    ) -> EngineResult<Reimbursement> {
        reject_non_positive_amount(input.amount)?;

        let now = self.ctx.now();
        let policy = self.ctx.config.overtime.clone();
        let user_id = actor.user_id;

        let claim = self
            .ctx
            .store
            .transaction(move |tx| {
                let submission = Submission::Reimbursement {
                    employee_id,
                    period_id: input.attendance_period_id,
                    amount: input.amount,
                };
                let period = can_submit(tx, &submission, now, &policy)?;

                tx.reimbursements().insert(Reimbursement {
                    id: Uuid::new_v4(),
                    employee_id,
                    attendance_period_id: period.id,
                    amount: input.amount,
                    description: input.description,
                    receipt_url: input.receipt_url,
                    status: ReimbursementStatus::Pending,
                    approved_by: None,
                    approved_at: None,
                    created_by: user_id,
                    updated_by: None,
                    created_at: now,
                    updated_at: now,
                })
            })
            .await?;

        info!(
            employee_id = %employee_id,
            reimbursement_id = %claim.id,
            amount = %claim.amount,
            "Reimbursement submitted"
        );
        self.ctx
            .audit(
                AuditEntry::new(Reimbursement::ENTITY, claim.id, AuditAction::Create, actor)
                    .with_new(&claim),
            )
            .await;

        Ok(claim)
    }

    /// Lists one employee's claims, newest first.
    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
        query: ReimbursementQuery,
        page: PageRequest,
    ) -> EngineResult<Page<Reimbursement>> {
        let mut claims = self
            .ctx
            .store
            .transaction(move |tx| {
                Ok(tx.reimbursements().filter(&|r| {
                    r.employee_id == employee_id
                        && query
                            .attendance_period_id
                            .is_none_or(|id| r.attendance_period_id == id)
                        && query.status.is_none_or(|s| r.status == s)
                }))
            })
            .await?;
        claims.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::paginate(claims, page))
    }

    /// Finds one claim, optionally scoped to its owner.
    pub async fn find_one(&self, id: Uuid, employee_id: Option<Uuid>) -> EngineResult<Reimbursement> {
        self.ctx
            .store
            .transaction(move |tx| find_reimbursement(tx, id, employee_id))
            .await
    }

    /// Edits a pending claim in an open period.
    pub async fn update(
        &self,
        id: Uuid,
        employee_id: Uuid,
        input: UpdateReimbursement,
        actor: &Actor,
    ) -> EngineResult<Reimbursement> {
        if let Some(amount) = input.amount {
            reject_non_positive_amount(amount)?;
        }

        let now = self.ctx.now();
        let user_id = actor.user_id;

        let (before, after) = self
            .ctx
            .store
            .transaction(move |tx| {
                let before = find_reimbursement(tx, id, Some(employee_id))?;
                ensure_editable(tx, &before, "update")?;

                let mut after = before.clone();
                if let Some(amount) = input.amount {
                    after.amount = amount;
                }
                if let Some(description) = input.description {
                    after.description = description;
                }
                if input.receipt_url.is_some() {
                    after.receipt_url = input.receipt_url;
                }
                after.updated_by = Some(user_id);
                after.updated_at = now;

                let after = tx.reimbursements().update(after)?;
                Ok((before, after))
            })
            .await?;

        info!(reimbursement_id = %id, "Reimbursement updated");
        self.ctx
            .audit(
                AuditEntry::new(Reimbursement::ENTITY, id, AuditAction::Update, actor)
                    .with_old(&before)
                    .with_new(&after),
            )
            .await;

        Ok(after)
    }

    /// Withdraws a pending claim in an open period.
    pub async fn delete(
        &self,
        id: Uuid,
        employee_id: Uuid,
        actor: &Actor,
    ) -> EngineResult<Reimbursement> {
        let removed = self
            .ctx
            .store
            .transaction(move |tx| {
                let claim = find_reimbursement(tx, id, Some(employee_id))?;
                ensure_editable(tx, &claim, "delete")?;
                tx.reimbursements().delete(id)
            })
            .await?;

        info!(reimbursement_id = %id, "Reimbursement deleted");
        self.ctx
            .audit(
                AuditEntry::new(Reimbursement::ENTITY, id, AuditAction::Delete, actor)
                    .with_old(&removed),
            )
            .await;

        Ok(removed)
    }

    /// Records a reviewer decision on a pending claim.
    pub async fn update_status(
        &self,
        id: Uuid,
        input: UpdateReimbursementStatus,
        actor: &Actor,
    ) -> EngineResult<Reimbursement> {
        let now = self.ctx.now();
        let user_id = actor.user_id;

        let (before, after) = self
            .ctx
            .store
            .transaction(move |tx| {
                let before = find_reimbursement(tx, id, None)?;
                if before.status != ReimbursementStatus::Pending {
                    return Err(EngineError::forbidden(
                        "Can only change the status of pending reimbursements",
                    ));
                }
                let period = tx.periods().get(before.attendance_period_id);
                if period.is_some_and(|p| p.payroll_processed) {
                    return Err(EngineError::bad_request(
                        "Cannot update reimbursement for processed payroll period",
                    ));
                }

                let mut after = before.clone();
                after.status = input.status;
                if input.status == ReimbursementStatus::Approved {
                    after.approved_by = Some(user_id);
                    after.approved_at = Some(now);
                }
                after.updated_by = Some(user_id);
                after.updated_at = now;

                let after = tx.reimbursements().update(after)?;
                Ok((before, after))
            })
            .await?;

        info!(
            reimbursement_id = %id,
            from = ?before.status,
            to = ?after.status,
            "Reimbursement status changed"
        );
        self.ctx
            .audit(
                AuditEntry::new(Reimbursement::ENTITY, id, AuditAction::Update, actor)
                    .with_old(&serde_json::json!({ "status": before.status }))
                    .with_new(&serde_json::json!({ "status": after.status })),
            )
            .await;

        Ok(after)
    }

    /// Claims grouped by status, optionally within one period. Statuses
    /// without claims are left out.
    pub async fn summary(&self, period_id: Option<Uuid>) -> EngineResult<Vec<ReimbursementStatusSummary>> {
        let claims = self
            .ctx
            .store
            .transaction(move |tx| {
                Ok(tx
                    .reimbursements()
                    .filter(&|r| period_id.is_none_or(|id| r.attendance_period_id == id)))
            })
            .await?;

        let mut summary = Vec::new();
        for status in [
            ReimbursementStatus::Pending,
            ReimbursementStatus::Approved,
            ReimbursementStatus::Rejected,
        ] {
            let matching: Vec<&Reimbursement> =
                claims.iter().filter(|r| r.status == status).collect();
            if matching.is_empty() {
                continue;
            }
            summary.push(ReimbursementStatusSummary {
                status,
                count: matching.len(),
                total_amount: checked_total(matching.iter().map(|r| r.amount), "Total amount")?,
            });
        }

        Ok(summary)
    }
}
