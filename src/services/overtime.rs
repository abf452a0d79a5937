//! Overtime requests and their review.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::audit::{Actor, AuditAction, AuditEntry};
use crate::error::{EngineError, EngineResult};
use crate::models::{Overtime, OvertimeStatus, OvertimeWindow, Page, PageRequest, clock_time};
use crate::store::{Record, UnitOfWork};

use super::Context;
use super::eligibility::{Submission, can_submit, validate_overtime_hours, validate_overtime_window};

/// Input for an overtime request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOvertime {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub window: OvertimeWindow,
    pub reason: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a pending request. The date cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOvertime {
    #[serde(default, with = "clock_time::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "clock_time::option")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub hours_worked: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Reviewer decision on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOvertimeStatus {
    pub status: OvertimeStatus,
}

/// Filters for listing an employee's overtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeQuery {
    #[serde(default)]
    pub status: Option<OvertimeStatus>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

fn find_overtime(
    tx: &mut dyn UnitOfWork,
    id: Uuid,
    employee_id: Option<Uuid>,
) -> EngineResult<Overtime> {
    tx.overtime()
        .get(id)
        .filter(|o| employee_id.is_none_or(|e| o.employee_id == e))
        .ok_or_else(|| EngineError::not_found("Overtime record not found"))
}

/// Overtime operations.
#[derive(Clone)]
pub struct OvertimeService {
    ctx: Context,
}

impl OvertimeService {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Submits an overtime request for a day the employee attended.
    pub async fn create(
        &self,
        employee_id: Uuid,
        input: CreateOvertime,
        actor: &Actor,
    ) -> EngineResult<Overtime> {
        let policy = self.ctx.config.overtime.clone();
        validate_overtime_hours(input.window.hours_worked, &policy)?;

        let now = self.ctx.now();
        let user_id = actor.user_id;

        let overtime = self
            .ctx
            .store
            .transaction(move |tx| {
                let submission = Submission::Overtime {
                    employee_id,
                    date: input.date,
                    window: input.window,
                };
                let period = can_submit(tx, &submission, now, &policy)?;

                tx.overtime().insert(Overtime {
                    id: Uuid::new_v4(),
                    employee_id,
                    attendance_period_id: period.id,
                    date: input.date,
                    window: input.window,
                    reason: input.reason,
                    description: input.description,
                    status: OvertimeStatus::Pending,
                    approved_by: None,
                    approved_at: None,
                    cancelled_at: None,
                    created_by: user_id,
                    updated_by: None,
                    created_at: now,
                    updated_at: now,
                })
            })
            .await?;

        info!(
            employee_id = %employee_id,
            overtime_id = %overtime.id,
            date = %overtime.date,
            hours = %overtime.window.hours_worked,
            "Overtime submitted"
        );
        self.ctx
            .audit(
                AuditEntry::new(Overtime::ENTITY, overtime.id, AuditAction::Create, actor)
                    .with_new(&overtime),
            )
            .await;

        Ok(overtime)
    }

    /// Lists one employee's overtime, latest day first.
    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
        query: OvertimeQuery,
        page: PageRequest,
    ) -> EngineResult<Page<Overtime>> {
        let mut records = self
            .ctx
            .store
            .transaction(move |tx| {
                Ok(tx.overtime().filter(&|o| {
                    o.employee_id == employee_id
                        && query.status.is_none_or(|s| o.status == s)
                        && query.start_date.is_none_or(|d| o.date >= d)
                        && query.end_date.is_none_or(|d| o.date <= d)
                }))
            })
            .await?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(Page::paginate(records, page))
    }

    /// Finds one request, optionally scoped to its owner.
    pub async fn find_one(&self, id: Uuid, employee_id: Option<Uuid>) -> EngineResult<Overtime> {
        self.ctx
            .store
            .transaction(move |tx| find_overtime(tx, id, employee_id))
            .await
    }

    /// Edits a pending request.
    ///
    /// The time window is re-validated when start, end and hours are all
    /// supplied together.
    pub async fn update(
        &self,
        id: Uuid,
        employee_id: Uuid,
        input: UpdateOvertime,
        actor: &Actor,
    ) -> EngineResult<Overtime> {
        let policy = self.ctx.config.overtime.clone();
        if let Some(hours) = input.hours_worked {
            validate_overtime_hours(hours, &policy)?;
        }

        let now = self.ctx.now();
        let user_id = actor.user_id;

        let (before, after) = self
            .ctx
            .store
            .transaction(move |tx| {
                let before = find_overtime(tx, id, Some(employee_id))?;
                if !before.is_pending() {
                    return Err(EngineError::forbidden(
                        "Cannot update overtime that has been processed",
                    ));
                }

                if let (Some(start_time), Some(end_time), Some(hours_worked)) =
                    (input.start_time, input.end_time, input.hours_worked)
                {
                    let window = OvertimeWindow {
                        start_time,
                        end_time,
                        hours_worked,
                    };
                    validate_overtime_window(&window, &policy)?;
                }

                let mut after = before.clone();
                if let Some(start_time) = input.start_time {
                    after.window.start_time = start_time;
                }
                if let Some(end_time) = input.end_time {
                    after.window.end_time = end_time;
                }
                if let Some(hours_worked) = input.hours_worked {
                    after.window.hours_worked = hours_worked;
                }
                if let Some(reason) = input.reason {
                    after.reason = reason;
                }
                if input.description.is_some() {
                    after.description = input.description;
                }
                after.updated_by = Some(user_id);
                after.updated_at = now;

                let after = tx.overtime().update(after)?;
                Ok((before, after))
            })
            .await?;

        info!(overtime_id = %id, "Overtime updated");
        self.ctx
            .audit(
                AuditEntry::new(Overtime::ENTITY, id, AuditAction::Update, actor)
                    .with_old(&before)
                    .with_new(&after),
            )
            .await;

        Ok(after)
    }

    /// Withdraws a pending request.
    pub async fn delete(&self, id: Uuid, employee_id: Uuid, actor: &Actor) -> EngineResult<Overtime> {
        let removed = self
            .ctx
            .store
            .transaction(move |tx| {
                let overtime = find_overtime(tx, id, Some(employee_id))?;
                if !overtime.is_pending() {
                    return Err(EngineError::forbidden(
                        "Cannot delete overtime that has been processed",
                    ));
                }
                tx.overtime().delete(id)
            })
            .await?;

        info!(overtime_id = %id, "Overtime deleted");
        self.ctx
            .audit(
                AuditEntry::new(Overtime::ENTITY, id, AuditAction::Delete, actor)
                    .with_old(&removed),
            )
            .await;

        Ok(removed)
    }

    /// Records a reviewer decision. An approved request is final.
    pub async fn update_status(
        &self,
        id: Uuid,
        input: UpdateOvertimeStatus,
        actor: &Actor,
    ) -> EngineResult<Overtime> {
        let now = self.ctx.now();
        let user_id = actor.user_id;

        let (before, after) = self
            .ctx
            .store
            .transaction(move |tx| {
                let before = find_overtime(tx, id, None)?;
                if before.status == OvertimeStatus::Approved {
                    return Err(EngineError::forbidden(
                        "Overtime request already approved, cannot update",
                    ));
                }
                let period = tx.periods().get(before.attendance_period_id);
                if period.is_some_and(|p| p.payroll_processed) {
                    return Err(EngineError::bad_request(
                        "Cannot update overtime for processed payroll period",
                    ));
                }

                let mut after = before.clone();
                after.status = input.status;
                match input.status {
                    OvertimeStatus::Approved => {
                        after.approved_at = Some(now);
                        after.approved_by = Some(user_id);
                    }
                    OvertimeStatus::Pending => {}
                    OvertimeStatus::Rejected | OvertimeStatus::Cancelled => {
                        after.cancelled_at = Some(now);
                    }
                }
                after.updated_by = Some(user_id);
                after.updated_at = now;

                let after = tx.overtime().update(after)?;
                Ok((before, after))
            })
            .await?;

        info!(
            overtime_id = %id,
            from = ?before.status,
            to = ?after.status,
            "Overtime status changed"
        );
        self.ctx
            .audit(
                AuditEntry::new(Overtime::ENTITY, id, AuditAction::Update, actor)
                    .with_old(&serde_json::json!({ "status": before.status }))
                    .with_new(&serde_json::json!({
                        "status": after.status,
                        "approved_at": after.approved_at,
                        "cancelled_at": after.cancelled_at,
                    })),
            )
            .await;

        Ok(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::Employee;
    use crate::services::SubmitAttendance;
    use crate::services::testing::{Harness, at, date, dec, harness};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn evening(day: NaiveDate, hours: &str) -> CreateOvertime {
        CreateOvertime {
            date: day,
            window: OvertimeWindow {
                start_time: time(18, 0),
                end_time: time(21, 0),
                hours_worked: dec(hours),
            },
            reason: "Release".to_string(),
            description: None,
        }
    }

    async fn attended(h: &Harness) -> Employee {
        h.period(date(2024, 6, 3), date(2024, 6, 10)).await;
        let ada = h.employee("Ada Byron", "5749.58").await;
        h.services
            .attendance
            .submit(ada.id, SubmitAttendance::default(), &h.actor_for(&ada))
            .await
            .unwrap();
        h.clock.set(at(2024, 6, 3, 21, 30));
        ada
    }

    #[tokio::test]
    async fn test_create_overtime_after_attendance() {
        let h = harness();
        let ada = attended(&h).await;

        let overtime = h
            .services
            .overtime
            .create(ada.id, evening(date(2024, 6, 3), "3"), &h.actor_for(&ada))
            .await
            .unwrap();
        assert_eq!(overtime.status, OvertimeStatus::Pending);

        let duplicate = h
            .services
            .overtime
            .create(ada.id, evening(date(2024, 6, 3), "3"), &h.actor_for(&ada))
            .await;
        assert_eq!(
            duplicate.unwrap_err(),
            EngineError::bad_request("Overtime record already exists for this date")
        );
    }

    #[tokio::test]
    async fn test_hours_above_daily_maximum() {
        let h = harness();
        let ada = attended(&h).await;
        let result = h
            .services
            .overtime
            .create(ada.id, evening(date(2024, 6, 3), "4"), &h.actor_for(&ada))
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Maximum overtime is 3 hours per day"
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_only_while_pending() {
        let h = harness();
        let ada = attended(&h).await;
        let actor = h.actor_for(&ada);
        let overtime = h
            .services
            .overtime
            .create(ada.id, evening(date(2024, 6, 3), "3"), &actor)
            .await
            .unwrap();

        let mismatch = h
            .services
            .overtime
            .update(
                overtime.id,
                ada.id,
                UpdateOvertime {
                    start_time: Some(time(18, 0)),
                    end_time: Some(time(20, 0)),
                    hours_worked: Some(dec("3")),
                    ..UpdateOvertime::default()
                },
                &actor,
            )
            .await;
        assert!(matches!(mismatch, Err(EngineError::BadRequest { .. })));

        let updated = h
            .services
            .overtime
            .update(
                overtime.id,
                ada.id,
                UpdateOvertime {
                    start_time: Some(time(18, 0)),
                    end_time: Some(time(20, 0)),
                    hours_worked: Some(dec("2")),
                    reason: Some("Hotfix".to_string()),
                    ..UpdateOvertime::default()
                },
                &actor,
            )
            .await
            .unwrap();
        assert_eq!(updated.window.hours_worked, dec("2"));
        assert_eq!(updated.reason, "Hotfix");

        h.services
            .overtime
            .update_status(
                overtime.id,
                UpdateOvertimeStatus {
                    status: OvertimeStatus::Approved,
                },
                &h.admin,
            )
            .await
            .unwrap();

        let update = h
            .services
            .overtime
            .update(overtime.id, ada.id, UpdateOvertime::default(), &actor)
            .await;
        assert_eq!(
            update.unwrap_err(),
            EngineError::forbidden("Cannot update overtime that has been processed")
        );

        let delete = h.services.overtime.delete(overtime.id, ada.id, &actor).await;
        assert_eq!(
            delete.unwrap_err(),
            EngineError::forbidden("Cannot delete overtime that has been processed")
        );
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let h = harness();
        let ada = attended(&h).await;
        let overtime = h
            .services
            .overtime
            .create(ada.id, evening(date(2024, 6, 3), "3"), &h.actor_for(&ada))
            .await
            .unwrap();

        let rejected = h
            .services
            .overtime
            .update_status(
                overtime.id,
                UpdateOvertimeStatus {
                    status: OvertimeStatus::Rejected,
                },
                &h.admin,
            )
            .await
            .unwrap();
        assert!(rejected.cancelled_at.is_some());
        assert!(rejected.approved_at.is_none());

        let approved = h
            .services
            .overtime
            .update_status(
                overtime.id,
                UpdateOvertimeStatus {
                    status: OvertimeStatus::Approved,
                },
                &h.admin,
            )
            .await
            .unwrap();
        assert_eq!(approved.approved_by, Some(h.admin.user_id));

        let again = h
            .services
            .overtime
            .update_status(
                overtime.id,
                UpdateOvertimeStatus {
                    status: OvertimeStatus::Cancelled,
                },
                &h.admin,
            )
            .await;
        assert_eq!(
            again.unwrap_err(),
            EngineError::forbidden("Overtime request already approved, cannot update")
        );
    }

    #[tokio::test]
    async fn test_list_and_scoped_lookup() {
        let h = harness();
        let ada = attended(&h).await;
        let alan = h.employee("Alan Turing", "6000").await;
        let overtime = h
            .services
            .overtime
            .create(ada.id, evening(date(2024, 6, 3), "3"), &h.actor_for(&ada))
            .await
            .unwrap();

        let page = h
            .services
            .overtime
            .list_for_employee(
                ada.id,
                OvertimeQuery {
                    status: Some(OvertimeStatus::Pending),
                    ..OvertimeQuery::default()
                },
                PageRequest { page: 1, limit: 10 },
            )
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);

        assert!(h.services.overtime.find_one(overtime.id, None).await.is_ok());
        assert!(h.services.overtime.find_one(overtime.id, Some(alan.id)).await.is_err());
    }
}
