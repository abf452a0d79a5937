//! Business operations over the store.
//!
//! Each service owns one area of the back office and shares a [`Context`]
//! (store, audit sink, clock, configuration). Every write runs inside a single
//! unit of work; audit entries are written after the unit of work commits.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use payroll_engine::audit::TracingAuditSink;
//! use payroll_engine::clock::SystemClock;
//! use payroll_engine::config::EngineConfig;
//! use payroll_engine::services::Services;
//! use payroll_engine::store::MemoryStore;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let services = Services::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(TracingAuditSink),
//!     Arc::new(SystemClock),
//!     EngineConfig::default(),
//! );
//!
//! let missing = services.periods.find_current().await;
//! assert!(missing.is_err());
//! # }
//! ```

mod attendance;
mod eligibility;
mod employees;
mod overtime;
mod payroll;
mod payslips;
mod periods;
mod reimbursements;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::audit::{AuditEntry, AuditSink, record_audit};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::store::Store;

pub use attendance::{AttendanceQuery, AttendanceService, AttendanceSummary, SubmitAttendance};
pub use eligibility::{Submission, can_submit, validate_overtime_hours};
pub use employees::{CreateEmployee, EmployeeQuery, EmployeeService, UpdateEmployee};
pub use overtime::{
    CreateOvertime, OvertimeQuery, OvertimeService, UpdateOvertime, UpdateOvertimeStatus,
};
pub use payroll::{
    PayrollHistoryEntry, PayrollOutcome, PayrollRun, PayrollService, PayrollStatus,
    PayrollSummary, ProcessPayroll,
};
pub use payslips::{PayslipPreview, PayslipPreviewSummary, PayslipService};
pub use periods::{
    CreatePeriod, PeriodDetails, PeriodRecordCounts, PeriodService, UpdatePeriod,
};
pub use reimbursements::{
    CreateReimbursement, ReimbursementQuery, ReimbursementService, ReimbursementStatusSummary,
    UpdateReimbursement, UpdateReimbursementStatus,
};

/// Collaborators shared by every service.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn Store>,
    pub audit: Arc<dyn AuditSink>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<EngineConfig>,
}

impl Context {
    /// Current local time.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Current local date.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date()
    }

    /// Best-effort audit write.
    pub async fn audit(&self, entry: AuditEntry) {
        record_audit(self.audit.as_ref(), entry).await;
    }
}

/// Every service, wired to the same collaborators.
#[derive(Clone)]
pub struct Services {
    pub periods: PeriodService,
    pub employees: EmployeeService,
    pub attendance: AttendanceService,
    pub overtime: OvertimeService,
    pub reimbursements: ReimbursementService,
    pub payroll: PayrollService,
    pub payslips: PayslipService,
}

impl Services {
    pub fn new(
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let context = Context {
            store,
            audit,
            clock,
            config: Arc::new(config),
        };

        Self {
            periods: PeriodService::new(context.clone()),
            employees: EmployeeService::new(context.clone()),
            attendance: AttendanceService::new(context.clone()),
            overtime: OvertimeService::new(context.clone()),
            reimbursements: ReimbursementService::new(context.clone()),
            payroll: PayrollService::new(context.clone()),
            payslips: PayslipService::new(context),
        }
    }
}

/// Shared fixtures for service tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::str::FromStr;
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::audit::{Actor, MemoryAuditSink};
    use crate::clock::FixedClock;
    use crate::config::EngineConfig;
    use crate::models::{AttendancePeriod, Employee};
    use crate::store::{MemoryStore, Store};

    use super::{CreateEmployee, CreatePeriod, Services};

    pub fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    pub struct Harness {
        pub services: Services,
        pub store: Arc<dyn Store>,
        pub clock: Arc<FixedClock>,
        pub audit: MemoryAuditSink,
        pub admin: Actor,
    }

    /// Services over an empty store with the clock on Monday 2024-06-03 09:00.
    pub fn harness() -> Harness {
        let clock = Arc::new(FixedClock::new(at(2024, 6, 3, 9, 0)));
        let audit = MemoryAuditSink::new();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let services = Services::new(
            store.clone(),
            Arc::new(audit.clone()),
            clock.clone(),
            EngineConfig::default(),
        );
        Harness {
            services,
            store,
            clock,
            audit,
            admin: Actor::new(Uuid::new_v4()),
        }
    }

    impl Harness {
        pub async fn period(&self, start: NaiveDate, end: NaiveDate) -> AttendancePeriod {
            self.services
                .periods
                .create(
                    CreatePeriod {
                        name: format!("{} - {}", start, end),
                        start_date: start,
                        end_date: end,
                        is_active: None,
                    },
                    &self.admin,
                )
                .await
                .unwrap()
        }

        pub async fn employee(&self, name: &str, salary: &str) -> Employee {
            let slug = name.to_lowercase().replace(' ', ".");
            self.services
                .employees
                .create(
                    CreateEmployee {
                        employee_number: format!("N-{}", slug),
                        full_name: name.to_string(),
                        email: format!("{}@example.com", slug),
                        department: "Operations".to_string(),
                        position: "Analyst".to_string(),
                        monthly_salary: dec(salary),
                        status: None,
                    },
                    &self.admin,
                )
                .await
                .unwrap()
        }

        pub fn actor_for(&self, employee: &Employee) -> Actor {
            Actor::new(employee.id)
        }
    }
}
