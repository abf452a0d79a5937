//! Daily attendance submissions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::{Actor, AuditAction, AuditEntry};
use crate::error::{EngineError, EngineResult};
use crate::models::{Attendance, AttendanceStatus, Page, PageRequest};
use crate::store::Record;

use super::Context;
use super::eligibility::{Submission, can_submit, reject_weekend};

/// Optional payload of an attendance submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAttendance {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Filters for listing attendance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<AttendanceStatus>,
    #[serde(default)]
    pub attendance_period_id: Option<Uuid>,
}

impl AttendanceQuery {
    fn matches(&self, record: &Attendance) -> bool {
        self.start_date.is_none_or(|d| record.date >= d)
            && self.end_date.is_none_or(|d| record.date <= d)
            && self.status.is_none_or(|s| record.status == s)
            && self
                .attendance_period_id
                .is_none_or(|id| record.attendance_period_id == id)
    }
}

/// Attendance counts for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total_days: usize,
    pub present_days: usize,
    pub absent_days: usize,
    /// Present days as a percentage of all recorded days, two decimals.
    pub attendance_rate: String,
}

impl AttendanceSummary {
    fn from_records(records: &[Attendance]) -> Self {
        let total_days = records.len();
        let present_days = records.iter().filter(|a| a.is_present()).count();
        let rate = if total_days == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(present_days as u64) * Decimal::ONE_HUNDRED
                / Decimal::from(total_days as u64)
        };

        Self {
            total_days,
            present_days,
            absent_days: total_days - present_days,
            attendance_rate: format!("{:.2}", rate.round_dp(2)),
        }
    }
}

/// Attendance operations.
#[derive(Clone)]
pub struct AttendanceService {
    ctx: Context,
}

impl AttendanceService {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Records today's attendance for `employee_id`.
    ///
    /// Submitting twice on the same day returns the first record unchanged.
    ///
    /// # Errors
    ///
    /// Anything the eligibility gate rejects; weekends are refused before the
    /// store is touched.
    pub async fn submit(
        &self,
        employee_id: Uuid,
        input: SubmitAttendance,
        actor: &Actor,
    ) -> EngineResult<Attendance> {
        let now = self.ctx.now();
        let today = now.date();
        reject_weekend(today)?;

        let policy = self.ctx.config.overtime.clone();
        let user_id = actor.user_id;

        let (record, created) = self
            .ctx
            .store
            .transaction(move |tx| {
                let submission = Submission::Attendance {
                    employee_id,
                    date: today,
                };
                let period = can_submit(tx, &submission, now, &policy)?;

                if let Some(existing) = tx
                    .attendance()
                    .find_first(&|a| a.employee_id == employee_id && a.date == today)
                {
                    return Ok((existing, false));
                }

                let record = tx.attendance().insert(Attendance {
                    id: Uuid::new_v4(),
                    employee_id,
                    attendance_period_id: period.id,
                    date: today,
                    check_in_time: now,
                    status: AttendanceStatus::Present,
                    notes: input.notes,
                    created_by: user_id,
                    created_at: now,
                    updated_at: now,
                })?;
                Ok((record, true))
            })
            .await?;

        if created {
            info!(
                employee_id = %employee_id,
                date = %today,
                attendance_id = %record.id,
                "Attendance submitted"
            );
            self.ctx
                .audit(
                    AuditEntry::new(Attendance::ENTITY, record.id, AuditAction::Create, actor)
                        .with_new(&record),
                )
                .await;
        } else {
            debug!(employee_id = %employee_id, date = %today, "Attendance already recorded");
        }

        Ok(record)
    }

    /// Lists attendance, latest day first. `None` lists every employee.
    pub async fn list(
        &self,
        employee_id: Option<Uuid>,
        query: AttendanceQuery,
        page: PageRequest,
    ) -> EngineResult<Page<Attendance>> {
        let mut records = self
            .ctx
            .store
            .transaction(move |tx| {
                Ok(tx.attendance().filter(&|a| {
                    employee_id.is_none_or(|id| a.employee_id == id) && query.matches(a)
                }))
            })
            .await?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(Page::paginate(records, page))
    }

    /// Summarises one employee's attendance, optionally within one period.
    pub async fn summary(
        &self,
        employee_id: Uuid,
        period_id: Option<Uuid>,
    ) -> EngineResult<AttendanceSummary> {
        let records = self
            .ctx
            .store
            .transaction(move |tx| {
                Ok(tx.attendance().filter(&|a| {
                    a.employee_id == employee_id
                        && period_id.is_none_or(|id| a.attendance_period_id == id)
                }))
            })
            .await?;
        Ok(AttendanceSummary::from_records(&records))
    }

    /// Finds one record. With `employee_id` set, records of other employees
    /// are reported as missing.
    pub async fn find_one(&self, id: Uuid, employee_id: Option<Uuid>) -> EngineResult<Attendance> {
        self.ctx
            .store
            .transaction(move |tx| {
                tx.attendance()
                    .get(id)
                    .filter(|a| employee_id.is_none_or(|e| a.employee_id == e))
                    .ok_or_else(|| EngineError::not_found("Attendance record not found"))
            })
            .await
    }

    /// Every attendance record of a period, ordered by day.
    pub async fn by_period(&self, period_id: Uuid) -> EngineResult<Vec<Attendance>> {
        let mut records = self
            .ctx
            .store
            .transaction(move |tx| {
                if tx.periods().get(period_id).is_none() {
                    return Err(EngineError::not_found("Attendance period not found"));
                }
                Ok(tx
                    .attendance()
                    .filter(&|a| a.attendance_period_id == period_id))
            })
            .await?;
        records.sort_by(|a, b| a.date.cmp(&b.date).then(a.employee_id.cmp(&b.employee_id)));
        Ok(records)
    }
}
