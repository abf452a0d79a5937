//! Payroll batch processing and reporting.
//!
//! A run computes and stores one payslip per selected employee. Each employee
//! is handled in its own unit of work, so one failure is recorded in the
//! result and the batch moves on. The period is marked processed only after a
//! full run (no employee filter) in which every employee succeeded.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::{Actor, AuditAction, AuditEntry};
use crate::calculation::{PayrollInput, calculate_payroll, checked_total};
use crate::config::PayrollPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendancePeriod, Employee, OvertimeStatus, Page, PageRequest, PayrollCalculation, Payslip,
    PeriodStatus, ReimbursementStatus,
};
use crate::sequencer::CodeSequencer;
use crate::store::{Record, UnitOfWork};

use super::Context;

/// Request to run payroll for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessPayroll {
    pub attendance_period_id: Uuid,
    /// Restricts the run to these employees. A restricted run never marks
    /// the period processed.
    #[serde(default)]
    pub employee_ids: Option<Vec<Uuid>>,
}

/// Result for one employee in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayrollOutcome {
    /// The payslip that was stored.
    Processed(Payslip),
    /// Why the employee was skipped.
    Failed { employee_id: Uuid, error: String },
}

impl PayrollOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, PayrollOutcome::Processed(_))
    }
}

/// Report of a payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRun {
    pub period_id: Uuid,
    pub total_employees: usize,
    pub processed_successfully: usize,
    pub failed: usize,
    pub results: Vec<PayrollOutcome>,
}

/// Totals over the payslips stored for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollSummary {
    pub period_id: Uuid,
    pub period_name: String,
    /// Active employees right now.
    pub total_employees: usize,
    /// Payslips stored for the period.
    pub processed_employees: usize,
    pub total_gross_pay: Decimal,
    pub total_net_pay: Decimal,
    pub total_deductions: Decimal,
    pub total_overtime_pay: Decimal,
    pub total_reimbursements: Decimal,
    pub processed_at: Option<NaiveDateTime>,
    pub processed_by: Option<Uuid>,
}

/// Whether payroll can still run for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollStatus {
    pub period_id: Uuid,
    pub period_name: String,
    pub total_employees: usize,
    pub processed_employees: usize,
    pub is_processed: bool,
    pub processed_at: Option<NaiveDateTime>,
    pub can_process: bool,
}

/// A processed period with its payslip totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollHistoryEntry {
    #[serde(flatten)]
    pub period: AttendancePeriod,
    pub payslip_count: usize,
    pub total_net_pay: Decimal,
}

/// Collects the facts a calculation needs for `employee` in `period`:
/// PRESENT days, APPROVED overtime hours and APPROVED reimbursements.
pub(crate) fn payroll_input(
    tx: &mut dyn UnitOfWork,
    employee: &Employee,
    period: &AttendancePeriod,
) -> EngineResult<PayrollInput> {
    let (employee_id, period_id) = (employee.id, period.id);

    let attended_days = tx.attendance().count(&|a| {
        a.employee_id == employee_id && a.attendance_period_id == period_id && a.is_present()
    });
    let overtime = tx.overtime().filter(&|o| {
        o.employee_id == employee_id
            && o.attendance_period_id == period_id
            && o.status == OvertimeStatus::Approved
    });
    let overtime_hours = checked_total(
        overtime.iter().map(|o| o.window.hours_worked),
        "Overtime hours",
    )?;
    let claims = tx.reimbursements().filter(&|r| {
        r.employee_id == employee_id
            && r.attendance_period_id == period_id
            && r.status == ReimbursementStatus::Approved
    });
    let reimbursements = checked_total(claims.iter().map(|r| r.amount), "Reimbursements")?;

    Ok(PayrollInput {
        employee_id,
        employee_name: employee.full_name.clone(),
        monthly_salary: employee.monthly_salary,
        period_start: period.start_date,
        period_end: period.end_date,
        attended_days: u32::try_from(attended_days).unwrap_or(u32::MAX),
        overtime_hours,
        reimbursements,
    })
}

/// Computes and stores one employee's payslip inside a unit of work.
fn process_employee(
    tx: &mut dyn UnitOfWork,
    employee: &Employee,
    period_id: Uuid,
    policy: &PayrollPolicy,
    processed_by: Uuid,
    now: NaiveDateTime,
) -> EngineResult<(Payslip, PayrollCalculation)> {
    let period = tx
        .periods()
        .get(period_id)
        .ok_or_else(|| EngineError::not_found("Attendance period not found"))?;
    if period.payroll_processed {
        return Err(EngineError::bad_request(
            "Payroll already processed for this period",
        ));
    }

    let employee_id = employee.id;
    let existing = tx
        .payslips()
        .count(&|p| p.employee_id == employee_id && p.attendance_period_id == period_id);
    if existing > 0 {
        return Err(EngineError::conflict("Payslip already exists for this period"));
    }

    let input = payroll_input(tx, employee, &period)?;
    let calculation = calculate_payroll(&input, policy)?;

    let numbers: Vec<String> = tx
        .payslips()
        .filter(&|_| true)
        .into_iter()
        .map(|p| p.payslip_number)
        .collect();
    let number = CodeSequencer::PAYSLIP.generate(period.start_date, &numbers);

    let payslip = tx.payslips().insert(Payslip::from_calculation(
        &calculation,
        period_id,
        number,
        processed_by,
        now,
    ))?;
    Ok((payslip, calculation))
}

/// Payroll operations.
#[derive(Clone)]
pub struct PayrollService {
    ctx: Context,
}

impl PayrollService {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Runs payroll for a period.
    ///
    /// # Errors
    ///
    /// Fails before any payslip is written when the period is missing,
    /// already processed or closed, or when no active employee is selected.
    /// Per-employee failures are reported in [`PayrollRun::results`].
    pub async fn process(&self, input: ProcessPayroll, actor: &Actor) -> EngineResult<PayrollRun> {
        let period_id = input.attendance_period_id;
        let partial = input.employee_ids.is_some();

        let employees = self
            .ctx
            .store
            .transaction(move |tx| {
                let period = tx
                    .periods()
                    .get(period_id)
                    .ok_or_else(|| EngineError::not_found("Attendance period not found"))?;
                if period.payroll_processed {
                    return Err(EngineError::bad_request(
                        "Payroll already processed for this period",
                    ));
                }
                if period.status == PeriodStatus::Closed {
                    return Err(EngineError::bad_request(
                        "Cannot process payroll for closed period",
                    ));
                }

                let selected = tx.employees().filter(&|e| {
                    e.is_active()
                        && input
                            .employee_ids
                            .as_ref()
                            .is_none_or(|ids| ids.contains(&e.id))
                });
                if selected.is_empty() {
                    return Err(EngineError::bad_request(
                        "No active employees found for processing",
                    ));
                }
                Ok(selected)
            })
            .await?;

        info!(
            period_id = %period_id,
            employees = employees.len(),
            partial,
            "Processing payroll"
        );

        let policy = self.ctx.config.payroll.clone();
        let processed_by = actor.user_id;
        let mut results = Vec::with_capacity(employees.len());

        for employee in &employees {
            let now = self.ctx.now();
            let policy = policy.clone();
            let outcome = self
                .ctx
                .store
                .transaction(move |tx| {
                    process_employee(tx, employee, period_id, &policy, processed_by, now)
                })
                .await;

            match outcome {
                Ok((payslip, calculation)) => {
                    for warning in &calculation.trace.warnings {
                        warn!(
                            employee_id = %employee.id,
                            code = %warning.code,
                            "{}",
                            warning.message
                        );
                    }
                    info!(
                        employee_id = %employee.id,
                        employee_name = %employee.full_name,
                        payslip_number = %payslip.payslip_number,
                        net_pay = %payslip.net_pay,
                        "Processed payroll for employee"
                    );
                    self.ctx
                        .audit(
                            AuditEntry::new(Payslip::ENTITY, payslip.id, AuditAction::Create, actor)
                                .with_new(&payslip),
                        )
                        .await;
                    results.push(PayrollOutcome::Processed(payslip));
                }
                Err(e) => {
                    error!(
                        employee_id = %employee.id,
                        employee_name = %employee.full_name,
                        error = %e,
                        "Failed to process payroll for employee"
                    );
                    results.push(PayrollOutcome::Failed {
                        employee_id: employee.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let processed_successfully = results.iter().filter(|r| r.is_processed()).count();
        let failed = results.len() - processed_successfully;

        if !partial && failed == 0 {
            self.mark_processed(period_id, actor).await?;
        }

        Ok(PayrollRun {
            period_id,
            total_employees: employees.len(),
            processed_successfully,
            failed,
            results,
        })
    }

    async fn mark_processed(&self, period_id: Uuid, actor: &Actor) -> EngineResult<()> {
        let now = self.ctx.now();
        let user_id = actor.user_id;

        let (before, after) = self
            .ctx
            .store
            .transaction(move |tx| {
                let before = tx
                    .periods()
                    .get(period_id)
                    .ok_or_else(|| EngineError::not_found("Attendance period not found"))?;
                let mut after = before.clone();
                after.payroll_processed = true;
                after.processed_at = Some(now);
                after.processed_by = Some(user_id);
                after.updated_by = Some(user_id);
                after.updated_at = now;
                let after = tx.periods().update(after)?;
                Ok((before, after))
            })
            .await?;

        info!(period_id = %period_id, "Period marked as payroll processed");
        self.ctx
            .audit(
                AuditEntry::new(AttendancePeriod::ENTITY, period_id, AuditAction::Update, actor)
                    .with_old(&before)
                    .with_new(&after),
            )
            .await;
        Ok(())
    }

    /// Totals over the payslips stored for a period.
    pub async fn summary(&self, period_id: Uuid) -> EngineResult<PayrollSummary> {
        self.ctx
            .store
            .transaction(move |tx| {
                let period = tx
                    .periods()
                    .get(period_id)
                    .ok_or_else(|| EngineError::not_found("Period not found"))?;
                let payslips = tx.payslips().filter(&|p| p.attendance_period_id == period_id);
                let total_employees = tx.employees().count(&|e| e.is_active());

                let total = |field: fn(&Payslip) -> Decimal, quantity: &str| {
                    checked_total(payslips.iter().map(field), quantity)
                };

                Ok(PayrollSummary {
                    period_id,
                    period_name: period.name,
                    total_employees,
                    processed_employees: payslips.len(),
                    total_gross_pay: total(|p| p.gross_pay, "Total gross pay")?,
                    total_net_pay: total(|p| p.net_pay, "Total net pay")?,
                    total_deductions: total(|p| p.deductions, "Total deductions")?,
                    total_overtime_pay: total(|p| p.total_overtime_pay, "Total overtime pay")?,
                    total_reimbursements: total(|p| p.total_reimbursements, "Total reimbursements")?,
                    processed_at: period.processed_at,
                    processed_by: period.processed_by,
                })
            })
            .await
    }

    /// Whether payroll can still run for a period.
    pub async fn status(&self, period_id: Uuid) -> EngineResult<PayrollStatus> {
        self.ctx
            .store
            .transaction(move |tx| {
                let period = tx
                    .periods()
                    .get(period_id)
                    .ok_or_else(|| EngineError::not_found("Period not found"))?;
                let processed_employees = tx
                    .payslips()
                    .count(&|p| p.attendance_period_id == period_id);
                let total_employees = tx.employees().count(&|e| e.is_active());

                Ok(PayrollStatus {
                    period_id,
                    can_process: period.can_process_payroll(),
                    period_name: period.name,
                    total_employees,
                    processed_employees,
                    is_processed: period.payroll_processed,
                    processed_at: period.processed_at,
                })
            })
            .await
    }

    /// Processed periods, most recently processed first.
    pub async fn history(&self, page: PageRequest) -> EngineResult<Page<PayrollHistoryEntry>> {
        let mut entries = self
            .ctx
            .store
            .transaction(move |tx| {
                let periods = tx.periods().filter(&|p| p.payroll_processed);
                let mut entries = Vec::with_capacity(periods.len());
                for period in periods {
                    let period_id = period.id;
                    let payslips = tx.payslips().filter(&|p| p.attendance_period_id == period_id);
                    entries.push(PayrollHistoryEntry {
                        payslip_count: payslips.len(),
                        total_net_pay: checked_total(
                            payslips.iter().map(|p| p.net_pay),
                            "Total net pay",
                        )?,
                        period,
                    });
                }
                Ok(entries)
            })
            .await?;
        entries.sort_by(|a, b| b.period.processed_at.cmp(&a.period.processed_at));
        Ok(Page::paginate(entries, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveTime;

    use crate::clock::Clock;
    use crate::models::{OvertimeWindow, Reimbursement};
    use crate::services::testing::{Harness, at, date, dec, harness};
    use crate::services::{
        CreateOvertime, CreateReimbursement, SubmitAttendance, UpdateOvertimeStatus,
        UpdateReimbursementStatus,
    };

    fn full_run(period: &AttendancePeriod) -> ProcessPayroll {
        ProcessPayroll {
            attendance_period_id: period.id,
            employee_ids: None,
        }
    }

    fn payslip(outcome: &PayrollOutcome) -> &Payslip {
        match outcome {
            PayrollOutcome::Processed(payslip) => payslip,
            PayrollOutcome::Failed { error, .. } => panic!("payroll failed: {}", error),
        }
    }

    /// One attended Monday with three approved overtime hours.
    async fn fixture_employee(h: &Harness) -> Employee {
        let employee = h.employee("Howard Hoeger", "5749.58").await;
        let actor = h.actor_for(&employee);
        h.services
            .attendance
            .submit(employee.id, SubmitAttendance::default(), &actor)
            .await
            .unwrap();

        h.clock.set(at(2024, 6, 3, 21, 30));
        let overtime = h
            .services
            .overtime
            .create(
                employee.id,
                CreateOvertime {
                    date: date(2024, 6, 3),
                    window: OvertimeWindow {
                        start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                        end_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
                        hours_worked: dec("3"),
                    },
                    reason: "Month-end close".to_string(),
                    description: None,
                },
                &actor,
            )
            .await
            .unwrap();
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
        employee
    }

    #[tokio::test]
    async fn test_full_run_matches_fixture_and_flips_period() {
        let h = harness();
        let period = h.period(date(2024, 6, 3), date(2024, 6, 10)).await;
        let employee = fixture_employee(&h).await;

        let run = h.services.payroll.process(full_run(&period), &h.admin).await.unwrap();
        assert_eq!(run.total_employees, 1);
        assert_eq!(run.processed_successfully, 1);
        assert_eq!(run.failed, 0);

        let slip = payslip(&run.results[0]);
        assert_eq!(slip.employee_id, employee.id);
        assert_eq!(slip.payslip_number, "PAY2024060001");
        assert_eq!(slip.working_days, 6);
        assert_eq!(slip.attended_days, 1);
        assert_eq!(slip.prorated_salary, dec("958.26"));
        assert_eq!(slip.overtime_rate, dec("179.67"));
        assert_eq!(slip.total_overtime_pay, dec("539.02"));
        assert_eq!(slip.gross_pay, dec("1497.29"));
        assert_eq!(slip.deductions, Decimal::ZERO);
        assert_eq!(slip.net_pay, dec("1497.29"));

        let status = h.services.payroll.status(period.id).await.unwrap();
        assert!(status.is_processed);
        assert!(!status.can_process);
        assert_eq!(status.processed_employees, 1);

        let again = h.services.payroll.process(full_run(&period), &h.admin).await;
        assert_eq!(
            again.unwrap_err(),
            EngineError::bad_request("Payroll already processed for this period")
        );
    }

    #[tokio::test]
    async fn test_partial_run_never_flips_and_is_idempotent() {
        let h = harness();
        let period = h.period(date(2024, 6, 3), date(2024, 6, 10)).await;
        let ada = h.employee("Ada Byron", "6000").await;
        let alan = h.employee("Alan Turing", "6000").await;

        let partial = ProcessPayroll {
            attendance_period_id: period.id,
            employee_ids: Some(vec![ada.id]),
        };
        let run = h.services.payroll.process(partial.clone(), &h.admin).await.unwrap();
        assert_eq!(run.processed_successfully, 1);
        assert!(!h.services.payroll.status(period.id).await.unwrap().is_processed);

        let rerun = h.services.payroll.process(partial, &h.admin).await.unwrap();
        assert_eq!(rerun.processed_successfully, 0);
        assert_eq!(rerun.failed, 1);
        assert_eq!(
            rerun.results[0],
            PayrollOutcome::Failed {
                employee_id: ada.id,
                error: "Payslip already exists for this period".to_string(),
            }
        );

        // Ada fails again, so the full run is not complete either.
        let full = h.services.payroll.process(full_run(&period), &h.admin).await.unwrap();
        assert_eq!(full.processed_successfully, 1);
        assert_eq!(full.failed, 1);
        assert_eq!(payslip(&full.results[1]).employee_id, alan.id);
        assert_eq!(payslip(&full.results[1]).payslip_number, "PAY2024060002");
        assert!(!h.services.payroll.status(period.id).await.unwrap().is_processed);

        let summary = h.services.payroll.summary(period.id).await.unwrap();
        assert_eq!(summary.processed_employees, 2);
        assert_eq!(summary.total_employees, 2);
    }

    #[tokio::test]
    async fn test_approved_reimbursements_are_paid() {
        let h = harness();
        let period = h.period(date(2024, 6, 3), date(2024, 6, 10)).await;
        let ada = h.employee("Ada Byron", "6000").await;
        let actor = h.actor_for(&ada);

        let approved = h
            .services
            .reimbursements
            .create(
                ada.id,
                CreateReimbursement {
                    attendance_period_id: period.id,
                    amount: dec("120.50"),
                    description: "Train tickets".to_string(),
                    receipt_url: None,
                },
                &actor,
            )
            .await
            .unwrap();
        h.services
            .reimbursements
            .create(
                ada.id,
                CreateReimbursement {
                    attendance_period_id: period.id,
                    amount: dec("99"),
                    description: "Still pending".to_string(),
                    receipt_url: None,
                },
                &actor,
            )
            .await
            .unwrap();
        h.services
            .reimbursements
            .update_status(
                approved.id,
                UpdateReimbursementStatus {
                    status: ReimbursementStatus::Approved,
                },
                &h.admin,
            )
            .await
            .unwrap();

        let run = h.services.payroll.process(full_run(&period), &h.admin).await.unwrap();
        let slip = payslip(&run.results[0]);
        assert_eq!(slip.attended_days, 0);
        assert_eq!(slip.total_reimbursements, dec("120.50"));
        assert_eq!(slip.gross_pay, dec("120.50"));
        assert_eq!(slip.net_pay, dec("120.50"));
    }

    #[tokio::test]
    async fn test_preconditions() {
        let h = harness();
        let missing = h
            .services
            .payroll
            .process(
                ProcessPayroll {
                    attendance_period_id: Uuid::new_v4(),
                    employee_ids: None,
                },
                &h.admin,
            )
            .await;
        assert_eq!(
            missing.unwrap_err(),
            EngineError::not_found("Attendance period not found")
        );

        let period = h.period(date(2024, 6, 3), date(2024, 6, 10)).await;
        let empty = h.services.payroll.process(full_run(&period), &h.admin).await;
        assert_eq!(
            empty.unwrap_err(),
            EngineError::bad_request("No active employees found for processing")
        );
    }

    #[tokio::test]
    async fn test_weekend_only_period_fails_per_employee() {
        let h = harness();
        let period = h.period(date(2024, 6, 8), date(2024, 6, 9)).await;
        let ada = h.employee("Ada Byron", "6000").await;

        let run = h.services.payroll.process(full_run(&period), &h.admin).await.unwrap();
        assert_eq!(run.failed, 1);
        assert_eq!(
            run.results[0],
            PayrollOutcome::Failed {
                employee_id: ada.id,
                error: "Calculation error: Attendance period has no working days".to_string(),
            }
        );
        assert!(!h.services.payroll.status(period.id).await.unwrap().is_processed);
    }

    #[tokio::test]
    async fn test_payslip_number_follows_period_month() {
        let h = harness();
        let may = h.period(date(2024, 5, 1), date(2024, 5, 31)).await;
        h.employee("Ada Byron", "6000").await;
        assert_eq!(h.clock.now().date(), date(2024, 6, 3));

        let run = h.services.payroll.process(full_run(&may), &h.admin).await.unwrap();
        assert_eq!(payslip(&run.results[0]).payslip_number, "PAY2024050001");
    }

    #[tokio::test]
    async fn test_overflowing_claims_fail_only_that_employee() {
        let h = harness();
        let period = h.period(date(2024, 6, 3), date(2024, 6, 10)).await;
        let ada = h.employee("Ada Byron", "6000").await;
        let alan = h.employee("Alan Turing", "6000").await;

        let now = h.clock.now();
        let (ada_id, period_id, admin_id) = (ada.id, period.id, h.admin.user_id);
        h.store
            .transaction(move |tx| {
                for _ in 0..2 {
                    tx.reimbursements().insert(Reimbursement {
                        id: Uuid::new_v4(),
                        employee_id: ada_id,
                        attendance_period_id: period_id,
                        amount: dec("50000000000000000000000000000"),
                        description: "Imported claim".to_string(),
                        receipt_url: None,
                        status: ReimbursementStatus::Approved,
                        approved_by: Some(admin_id),
                        approved_at: Some(now),
                        created_by: ada_id,
                        updated_by: None,
                        created_at: now,
                        updated_at: now,
                    })?;
                }
                Ok(())
            })
            .await
            .unwrap();

        let run = h.services.payroll.process(full_run(&period), &h.admin).await.unwrap();
        assert_eq!(run.total_employees, 2);
        assert_eq!(run.processed_successfully, 1);
        assert_eq!(run.failed, 1);
        assert_eq!(
            run.results[0],
            PayrollOutcome::Failed {
                employee_id: ada.id,
                error: "Calculation error: Reimbursements overflowed".to_string(),
            }
        );
        assert_eq!(payslip(&run.results[1]).employee_id, alan.id);
        assert!(!h.services.payroll.status(period.id).await.unwrap().is_processed);
    }

    #[tokio::test]
    async fn test_history_lists_processed_periods() {
        let h = harness();
        let period = h.period(date(2024, 6, 3), date(2024, 6, 10)).await;
        h.employee("Ada Byron", "11000").await;
        h.services.payroll.process(full_run(&period), &h.admin).await.unwrap();

        let history = h
            .services
            .payroll
            .history(PageRequest { page: 1, limit: 10 })
            .await
            .unwrap();
        assert_eq!(history.data.len(), 1);
        assert_eq!(history.data[0].period.id, period.id);
        assert_eq!(history.data[0].payslip_count, 1);
        // 11000 with nothing attended earns nothing
        assert_eq!(history.data[0].total_net_pay, Decimal::ZERO);
    }
}
