//! Record storage behind an atomic unit of work.
//!
//! Services never touch storage directly. They describe a unit of work as a
//! closure over `&mut dyn UnitOfWork` and hand it to a [`Store`], which runs it
//! atomically: either every write inside the closure lands, or none does.
//!
//! ```
//! use std::sync::Arc;
//! use payroll_engine::store::{MemoryStore, Store};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
//! let active = store
//!     .transaction(|tx| Ok(tx.periods().count(&|p| p.is_active)))
//!     .await
//!     .unwrap();
//! assert_eq!(active, 0);
//! # }
//! ```

mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Attendance, AttendancePeriod, Employee, Overtime, Payslip, Reimbursement,
};

pub use memory::{MemoryStore, MemoryTable};

/// A persisted record type.
pub trait Record: Clone + Send + Sync + 'static {
    /// Entity name used in messages and audit entries.
    const ENTITY: &'static str;

    /// Primary key.
    fn id(&self) -> Uuid;

    /// `(index, value)` pairs that must be unique across the table.
    ///
    /// Returning a key only for some rows gives a partial unique index.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Typed access to one table inside a unit of work.
pub trait Table<T: Record>: Send {
    /// Looks a record up by id.
    fn get(&self, id: Uuid) -> Option<T>;

    /// First record matching `predicate`, in insertion order.
    fn find_first(&self, predicate: &dyn Fn(&T) -> bool) -> Option<T>;

    /// Every record matching `predicate`, in insertion order.
    fn filter(&self, predicate: &dyn Fn(&T) -> bool) -> Vec<T>;

    /// Number of records matching `predicate`.
    fn count(&self, predicate: &dyn Fn(&T) -> bool) -> usize;

    /// Inserts a new record. Fails with `Conflict` on a duplicate id or unique key.
    fn insert(&mut self, record: T) -> EngineResult<T>;

    /// Replaces the record with the same id. Fails with `NotFound` if absent
    /// and `Conflict` if a unique key collides with another row.
    fn update(&mut self, record: T) -> EngineResult<T>;

    /// Removes and returns a record.
    fn delete(&mut self, id: Uuid) -> EngineResult<T>;
}

/// The set of tables visible to a unit of work.
pub trait UnitOfWork: Send {
    fn periods(&mut self) -> &mut dyn Table<AttendancePeriod>;
    fn employees(&mut self) -> &mut dyn Table<Employee>;
    fn attendance(&mut self) -> &mut dyn Table<Attendance>;
    fn overtime(&mut self) -> &mut dyn Table<Overtime>;
    fn reimbursements(&mut self) -> &mut dyn Table<Reimbursement>;
    fn payslips(&mut self) -> &mut dyn Table<Payslip>;
}

/// A unit of work as accepted by [`Store::run`].
pub type Work<'a> = Box<dyn FnOnce(&mut dyn UnitOfWork) -> EngineResult<()> + Send + 'a>;

/// Transactional record store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Runs `work` atomically. Writes are kept only if it returns `Ok`.
    async fn run(&self, work: Work<'_>) -> EngineResult<()>;
}

impl dyn Store {
    /// Runs `work` atomically and returns its result.
    pub async fn transaction<'a, T, F>(&'a self, work: F) -> EngineResult<T>
    where
        T: Send + 'a,
        F: FnOnce(&mut dyn UnitOfWork) -> EngineResult<T> + Send + 'a,
    {
        let mut output = None;
        let slot = &mut output;
        self.run(Box::new(
            move |tx: &mut dyn UnitOfWork| -> EngineResult<()> {
                *slot = Some(work(tx)?);
                Ok(())
            },
        ))
        .await?;
        output.ok_or_else(|| EngineError::store("unit of work finished without a result"))
    }
}

impl Record for AttendancePeriod {
    const ENTITY: &'static str = "AttendancePeriod";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        if self.is_active {
            vec![("is_active", "true".to_string())]
        } else {
            Vec::new()
        }
    }
}

impl Record for Employee {
    const ENTITY: &'static str = "Employee";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("employee_code", self.employee_code.clone()),
            ("employee_number", self.employee_number.clone()),
            ("email", self.email.to_lowercase()),
        ]
    }
}

impl Record for Attendance {
    const ENTITY: &'static str = "Attendance";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("employee_date", format!("{}:{}", self.employee_id, self.date))]
    }
}

impl Record for Overtime {
    const ENTITY: &'static str = "Overtime";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("employee_date", format!("{}:{}", self.employee_id, self.date))]
    }
}

impl Record for Reimbursement {
    const ENTITY: &'static str = "Reimbursement";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Payslip {
    const ENTITY: &'static str = "Payslip";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("payslip_number", self.payslip_number.clone()),
            (
                "employee_period",
                format!("{}:{}", self.employee_id, self.attendance_period_id),
            ),
        ]
    }
}
