//! In-process [`Store`] implementation.
//!
//! All tables sit behind one `tokio::sync::Mutex`. A unit of work runs against
//! a staged copy of the tables and the copy replaces the live tables only when
//! the work succeeds, so units of work are serialized and all-or-nothing.
//!
//! Rows are shared copy-on-write: staging a unit of work copies pointers, and
//! a table's rows are cloned only the first time the work writes to it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Attendance, AttendancePeriod, Employee, Overtime, Payslip, Reimbursement,
};

use super::{Record, Store, Table, UnitOfWork, Work};

/// A table kept as a vector in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryTable<T> {
    rows: Arc<Vec<T>>,
}

impl<T> Default for MemoryTable<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(Vec::new()),
        }
    }
}

impl<T: Record> MemoryTable<T> {
    fn position(&self, id: Uuid) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }

    fn check_unique(&self, record: &T, skip: Option<Uuid>) -> EngineResult<()> {
        for (index, value) in record.unique_keys() {
            let taken = self
                .rows
                .iter()
                .filter(|row| Some(row.id()) != skip)
                .any(|row| row.unique_keys().iter().any(|(i, v)| *i == index && *v == value));
            if taken {
                return Err(EngineError::conflict(format!(
                    "{} with {} `{}` already exists",
                    T::ENTITY,
                    index,
                    value
                )));
            }
        }
        Ok(())
    }
}

impl<T: Record> Table<T> for MemoryTable<T> {
    fn get(&self, id: Uuid) -> Option<T> {
        self.rows.iter().find(|row| row.id() == id).cloned()
    }

    fn find_first(&self, predicate: &dyn Fn(&T) -> bool) -> Option<T> {
        self.rows.iter().find(|row| predicate(row)).cloned()
    }

    fn filter(&self, predicate: &dyn Fn(&T) -> bool) -> Vec<T> {
        self.rows.iter().filter(|row| predicate(row)).cloned().collect()
    }

    fn count(&self, predicate: &dyn Fn(&T) -> bool) -> usize {
        self.rows.iter().filter(|row| predicate(row)).count()
    }

    fn insert(&mut self, record: T) -> EngineResult<T> {
        if self.position(record.id()).is_some() {
            return Err(EngineError::conflict(format!(
                "{} `{}` already exists",
                T::ENTITY,
                record.id()
            )));
        }
        self.check_unique(&record, None)?;
        Arc::make_mut(&mut self.rows).push(record.clone());
        Ok(record)
    }

    fn update(&mut self, record: T) -> EngineResult<T> {
        let index = self
            .position(record.id())
            .ok_or_else(|| EngineError::not_found(format!("{} not found", T::ENTITY)))?;
        self.check_unique(&record, Some(record.id()))?;
        Arc::make_mut(&mut self.rows)[index] = record.clone();
        Ok(record)
    }

    fn delete(&mut self, id: Uuid) -> EngineResult<T> {
        let index = self
            .position(id)
            .ok_or_else(|| EngineError::not_found(format!("{} not found", T::ENTITY)))?;
        Ok(Arc::make_mut(&mut self.rows).remove(index))
    }
}

/// Every table of the memory store.
#[derive(Debug, Clone, Default)]
struct Tables {
    periods: MemoryTable<AttendancePeriod>,
    employees: MemoryTable<Employee>,
    attendance: MemoryTable<Attendance>,
    overtime: MemoryTable<Overtime>,
    reimbursements: MemoryTable<Reimbursement>,
    payslips: MemoryTable<Payslip>,
}

impl UnitOfWork for Tables {
    fn periods(&mut self) -> &mut dyn Table<AttendancePeriod> {
        &mut self.periods
    }

    fn employees(&mut self) -> &mut dyn Table<Employee> {
        &mut self.employees
    }

    fn attendance(&mut self) -> &mut dyn Table<Attendance> {
        &mut self.attendance
    }

    fn overtime(&mut self) -> &mut dyn Table<Overtime> {
        &mut self.overtime
    }

    fn reimbursements(&mut self) -> &mut dyn Table<Reimbursement> {
        &mut self.reimbursements
    }

    fn payslips(&mut self) -> &mut dyn Table<Payslip> {
        &mut self.payslips
    }
}

/// Store keeping every table in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn run(&self, work: Work<'_>) -> EngineResult<()> {
        let mut live = self.tables.lock().await;
        let mut staged = live.clone();
        work(&mut staged)?;
        *live = staged;
        Ok(())
    }
}
