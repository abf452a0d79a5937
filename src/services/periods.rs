//! Attendance-period lifecycle.
//!
//! A period moves through these states:
//!
//! ```text
//! create ──► Active (is_active, ACTIVE) ◄──► Inactive (!is_active, ACTIVE)
//!                      │                              │
//!                      └──────────► Closed ◄──────────┘
//!                                     │ (CLOSED, reopenable)
//!                      payroll run ──► Processed (payroll_processed, frozen)
//! ```
//!
//! At most one period is active at any time. Activating a period and
//! deactivating every other one happen in the same unit of work, and the
//! store's partial unique index on `is_active` rejects anything that would
//! leave two active periods behind.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::audit::{Actor, AuditAction, AuditEntry};
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendancePeriod, Page, PageRequest, PeriodStatus};
use crate::store::{Record, UnitOfWork};

use super::Context;

/// Input for creating a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePeriod {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Whether the new period becomes the current one. Defaults to `true`.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update of a period. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePeriod {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub status: Option<PeriodStatus>,
}

/// Number of records referencing a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRecordCounts {
    pub attendance: usize,
    pub overtime: usize,
    pub reimbursements: usize,
    pub payslips: usize,
}

impl PeriodRecordCounts {
    fn load(tx: &mut dyn UnitOfWork, period_id: Uuid) -> Self {
        Self {
            attendance: tx
                .attendance()
                .count(&|a| a.attendance_period_id == period_id),
            overtime: tx.overtime().count(&|o| o.attendance_period_id == period_id),
            reimbursements: tx
                .reimbursements()
                .count(&|r| r.attendance_period_id == period_id),
            payslips: tx.payslips().count(&|p| p.attendance_period_id == period_id),
        }
    }

    /// Total dependent records.
    pub fn total(&self) -> usize {
        self.attendance + self.overtime + self.reimbursements + self.payslips
    }
}

/// A period with the number of records attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDetails {
    #[serde(flatten)]
    pub period: AttendancePeriod,
    #[serde(rename = "_count")]
    pub counts: PeriodRecordCounts,
}

/// Clears `is_active` on every period except `keep`.
fn deactivate_others(
    tx: &mut dyn UnitOfWork,
    keep: Option<Uuid>,
    actor: Uuid,
    now: NaiveDateTime,
) -> EngineResult<usize> {
    let active = tx
        .periods()
        .filter(&|p| p.is_active && Some(p.id) != keep);
    let count = active.len();
    for mut period in active {
        period.is_active = false;
        period.updated_by = Some(actor);
        period.updated_at = now;
        tx.periods().update(period)?;
    }
    Ok(count)
}

fn reject_overlap(
    tx: &mut dyn UnitOfWork,
    start: NaiveDate,
    end: NaiveDate,
    skip: Option<Uuid>,
) -> EngineResult<()> {
    let overlapping = tx.periods().count(&|p| {
        Some(p.id) != skip && p.status != PeriodStatus::Closed && p.overlaps(start, end)
    });
    if overlapping > 0 {
        return Err(EngineError::conflict(
            "Period overlaps with existing active period",
        ));
    }
    Ok(())
}

fn find_period(tx: &mut dyn UnitOfWork, id: Uuid) -> EngineResult<AttendancePeriod> {
    tx.periods()
        .get(id)
        .ok_or_else(|| EngineError::not_found("Attendance period not found"))
}

/// Period lifecycle operations.
#[derive(Clone)]
pub struct PeriodService {
    ctx: Context,
}

impl PeriodService {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Creates a period.
    ///
    /// # Errors
    ///
    /// - `BadRequest` "Start date must be before end date" unless start < end.
    /// - `Conflict` "Period overlaps with existing active period" when the
    ///   range overlaps any period that is not CLOSED.
    pub async fn create(&self, input: CreatePeriod, actor: &Actor) -> EngineResult<AttendancePeriod> {
        if input.start_date >= input.end_date {
            return Err(EngineError::bad_request("Start date must be before end date"));
        }

        let now = self.ctx.now();
        let user_id = actor.user_id;
        let period = AttendancePeriod::new(
            input.name,
            input.start_date,
            input.end_date,
            input.is_active.unwrap_or(true),
            user_id,
            now,
        );

        let (period, deactivated) = self
            .ctx
            .store
            .transaction(move |tx| {
                reject_overlap(tx, period.start_date, period.end_date, None)?;
                let deactivated = if period.is_active {
                    deactivate_others(tx, None, user_id, now)?
                } else {
                    0
                };
                let period = tx.periods().insert(period)?;
                Ok((period, deactivated))
            })
            .await?;

        info!(
            period_id = %period.id,
            start_date = %period.start_date,
            end_date = %period.end_date,
            is_active = period.is_active,
            deactivated,
            "Attendance period created"
        );
        self.ctx
            .audit(
                AuditEntry::new(AttendancePeriod::ENTITY, period.id, AuditAction::Create, actor)
                    .with_new(&period),
            )
            .await;

        Ok(period)
    }

    /// Lists periods, latest start date first.
    pub async fn list(&self, page: PageRequest) -> EngineResult<Page<AttendancePeriod>> {
        let mut periods = self
            .ctx
            .store
            .transaction(|tx| Ok(tx.periods().filter(&|_| true)))
            .await?;
        periods.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(Page::paginate(periods, page))
    }

    /// Finds a period with its dependent record counts.
    pub async fn find_one(&self, id: Uuid) -> EngineResult<PeriodDetails> {
        self.ctx
            .store
            .transaction(move |tx| {
                let period = find_period(tx, id)?;
                let counts = PeriodRecordCounts::load(tx, id);
                Ok(PeriodDetails { period, counts })
            })
            .await
    }

    /// Returns the current period.
    ///
    /// # Errors
    ///
    /// `NotFound` "No active period found" when no period is active.
    pub async fn find_current(&self) -> EngineResult<AttendancePeriod> {
        self.ctx
            .store
            .transaction(|tx| {
                tx.periods()
                    .find_first(&|p| p.is_current())
                    .ok_or_else(|| EngineError::not_found("No active period found"))
            })
            .await
    }

    /// Applies a partial update.
    ///
    /// Processed periods are frozen. Changed dates are re-validated against
    /// the unchanged ones and against other open periods. Setting `is_active`
    /// deactivates every other period; closing a period clears `is_active`.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdatePeriod,
        actor: &Actor,
    ) -> EngineResult<AttendancePeriod> {
        let now = self.ctx.now();
        let user_id = actor.user_id;

        let (before, after) = self
            .ctx
            .store
            .transaction(move |tx| {
                let before = find_period(tx, id)?;
                if before.payroll_processed {
                    return Err(EngineError::bad_request(
                        "Cannot update period that has been processed",
                    ));
                }

                let mut after = before.clone();
                if input.start_date.is_some() || input.end_date.is_some() {
                    let start = input.start_date.unwrap_or(before.start_date);
                    let end = input.end_date.unwrap_or(before.end_date);
                    if start >= end {
                        return Err(EngineError::bad_request(
                            "Start date must be before end date",
                        ));
                    }
                    reject_overlap(tx, start, end, Some(id))?;
                    after.start_date = start;
                    after.end_date = end;
                }
                if let Some(name) = input.name {
                    after.name = name;
                }
                if let Some(status) = input.status {
                    after.status = status;
                }

                match input.is_active {
                    Some(true) if after.status == PeriodStatus::Closed => {
                        return Err(EngineError::bad_request(
                            "Cannot activate a closed period",
                        ));
                    }
                    Some(true) => {
                        deactivate_others(tx, Some(id), user_id, now)?;
                        after.is_active = true;
                    }
                    Some(false) => after.is_active = false,
                    None => {}
                }
                if after.status == PeriodStatus::Closed {
                    after.is_active = false;
                }

                after.updated_by = Some(user_id);
                after.updated_at = now;
                let after = tx.periods().update(after)?;
                Ok((before, after))
            })
            .await?;

        info!(
            period_id = %after.id,
            is_active = after.is_active,
            status = ?after.status,
            "Attendance period updated"
        );
        self.ctx
            .audit(
                AuditEntry::new(AttendancePeriod::ENTITY, id, AuditAction::Update, actor)
                    .with_old(&before)
                    .with_new(&after),
            )
            .await;

        Ok(after)
    }

    /// Deletes a period that is unprocessed and has no dependent records.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> EngineResult<AttendancePeriod> {
        let removed = self
            .ctx
            .store
            .transaction(move |tx| {
                let period = find_period(tx, id)?;
                if period.payroll_processed {
                    return Err(EngineError::bad_request("Cannot delete processed period"));
                }
                if PeriodRecordCounts::load(tx, id).total() > 0 {
                    return Err(EngineError::bad_request(
                        "Cannot delete period with existing records",
                    ));
                }
                tx.periods().delete(id)
            })
            .await?;

        info!(period_id = %id, "Attendance period deleted");
        self.ctx
            .audit(
                AuditEntry::new(AttendancePeriod::ENTITY, id, AuditAction::Delete, actor)
                    .with_old(&removed),
            )
            .await;

        Ok(removed)
    }
}
