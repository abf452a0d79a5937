//! Payslip previews and stored payslips.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::audit::{Actor, AuditAction, AuditEntry};
use crate::calculation::{calculate_payroll, checked_total};
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendancePeriod, PayrollCalculation, Payslip};
use crate::store::{Record, UnitOfWork};

use super::Context;
use super::payroll::payroll_input;

/// One employee's pay for the current period, computed but not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipPreview {
    pub period: AttendancePeriod,
    pub calculation: PayrollCalculation,
}

/// Previews for every active employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipPreviewSummary {
    pub period: AttendancePeriod,
    pub employees: Vec<PayrollCalculation>,
    pub total_net_pay: Decimal,
}

fn current_period(tx: &mut dyn UnitOfWork) -> EngineResult<AttendancePeriod> {
    tx.periods()
        .find_first(&|p| p.is_current())
        .ok_or_else(|| EngineError::not_found("No active period found"))
}

/// Payslip operations.
#[derive(Clone)]
pub struct PayslipService {
    ctx: Context,
}

impl PayslipService {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Computes what `employee_id` would be paid for the current period.
    pub async fn preview(&self, employee_id: Uuid, actor: &Actor) -> EngineResult<PayslipPreview> {
        let policy = self.ctx.config.payroll.clone();

        let preview = self
            .ctx
            .store
            .transaction(move |tx| {
                let employee = tx
                    .employees()
                    .get(employee_id)
                    .ok_or_else(|| EngineError::not_found("Employee not found"))?;
                let period = current_period(tx)?;
                let input = payroll_input(tx, &employee, &period)?;
                let calculation = calculate_payroll(&input, &policy)?;
                Ok(PayslipPreview {
                    period,
                    calculation,
                })
            })
            .await?;

        debug!(
            employee_id = %employee_id,
            period_id = %preview.period.id,
            net_pay = %preview.calculation.net_pay,
            "Payslip preview"
        );
        self.ctx
            .audit(AuditEntry::new(Payslip::ENTITY, employee_id, AuditAction::Read, actor))
            .await;

        Ok(preview)
    }

    /// Previews every active employee for the current period.
    pub async fn preview_all(&self) -> EngineResult<PayslipPreviewSummary> {
        let policy = self.ctx.config.payroll.clone();

        self.ctx
            .store
            .transaction(move |tx| {
                let period = current_period(tx)?;
                let employees = tx.employees().filter(&|e| e.is_active());

                let mut calculations = Vec::with_capacity(employees.len());
                for employee in &employees {
                    let input = payroll_input(tx, employee, &period)?;
                    calculations.push(calculate_payroll(&input, &policy)?);
                }
                let total_net_pay =
                    checked_total(calculations.iter().map(|c| c.net_pay), "Total net pay")?;

                Ok(PayslipPreviewSummary {
                    period,
                    employees: calculations,
                    total_net_pay,
                })
            })
            .await
    }

    /// The stored payslip of `employee_id` for `period_id`.
    pub async fn find(&self, employee_id: Uuid, period_id: Uuid, actor: &Actor) -> EngineResult<Payslip> {
        let payslip = self
            .ctx
            .store
            .transaction(move |tx| {
                tx.payslips()
                    .find_first(&|p| {
                        p.employee_id == employee_id && p.attendance_period_id == period_id
                    })
                    .ok_or_else(|| EngineError::not_found("Payslip not found"))
            })
            .await?;

        self.ctx
            .audit(AuditEntry::new(Payslip::ENTITY, payslip.id, AuditAction::Read, actor))
            .await;

        Ok(payslip)
    }

    /// Every payslip stored for a period, by payslip number.
    pub async fn list_for_period(&self, period_id: Uuid) -> EngineResult<Vec<Payslip>> {
        let mut payslips = self
            .ctx
            .store
            .transaction(move |tx| {
                if tx.periods().get(period_id).is_none() {
                    return Err(EngineError::not_found("Attendance period not found"));
                }
                Ok(tx.payslips().filter(&|p| p.attendance_period_id == period_id))
            })
            .await?;
        payslips.sort_by(|a, b| a.payslip_number.cmp(&b.payslip_number));
        Ok(payslips)
    }
}
