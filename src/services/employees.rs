//! Employee records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::audit::{Actor, AuditAction, AuditEntry};
use crate::error::{EngineError, EngineResult};
use crate::models::{Employee, EmployeeStatus, Page, PageRequest};
use crate::sequencer::CodeSequencer;
use crate::store::{Record, UnitOfWork};

use super::Context;
use super::eligibility::validate_money;

/// Input for creating an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEmployee {
    pub employee_number: String,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub monthly_salary: Decimal,
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
}

/// Partial update of an employee. The generated code never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEmployee {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub monthly_salary: Option<Decimal>,
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
}

/// Filters for listing employees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeQuery {
    /// Case-insensitive match on name, number, email, department or position.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
}

fn validate_salary(salary: Decimal) -> EngineResult<()> {
    if salary <= Decimal::ZERO {
        return Err(EngineError::bad_request(
            "Monthly salary must be greater than zero",
        ));
    }
    validate_money(salary, "Monthly salary")
}

fn find_employee(tx: &mut dyn UnitOfWork, id: Uuid) -> EngineResult<Employee> {
    tx.employees()
        .get(id)
        .ok_or_else(|| EngineError::not_found("Employee not found"))
}

/// Employee operations.
#[derive(Clone)]
pub struct EmployeeService {
    ctx: Context,
}

impl EmployeeService {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Creates an employee with a generated `EMPyymmNNN` code.
    ///
    /// The code's month comes from the clock; the counter continues from the
    /// greatest code already issued that month.
    pub async fn create(&self, input: CreateEmployee, actor: &Actor) -> EngineResult<Employee> {
        validate_salary(input.monthly_salary)?;

        let now = self.ctx.now();
        let user_id = actor.user_id;

        let employee = self
            .ctx
            .store
            .transaction(move |tx| {
                let email = input.email.to_lowercase();
                let taken = tx.employees().count(&|e| {
                    e.email.to_lowercase() == email || e.employee_number == input.employee_number
                });
                if taken > 0 {
                    return Err(EngineError::conflict(
                        "Employee email or number already exists",
                    ));
                }

                let codes: Vec<String> = tx
                    .employees()
                    .filter(&|_| true)
                    .into_iter()
                    .map(|e| e.employee_code)
                    .collect();
                let employee_code = CodeSequencer::EMPLOYEE.generate(now.date(), &codes);

                tx.employees().insert(Employee {
                    id: Uuid::new_v4(),
                    employee_code,
                    employee_number: input.employee_number,
                    full_name: input.full_name,
                    email: input.email,
                    department: input.department,
                    position: input.position,
                    monthly_salary: input.monthly_salary,
                    status: input.status.unwrap_or_default(),
                    created_by: user_id,
                    updated_by: None,
                    created_at: now,
                    updated_at: now,
                })
            })
            .await?;

        info!(
            employee_id = %employee.id,
            employee_code = %employee.employee_code,
            "Employee created"
        );
        self.ctx
            .audit(
                AuditEntry::new(Employee::ENTITY, employee.id, AuditAction::Create, actor)
                    .with_new(&employee),
            )
            .await;

        Ok(employee)
    }

    /// Lists employees, newest first.
    pub async fn list(&self, query: EmployeeQuery, page: PageRequest) -> EngineResult<Page<Employee>> {
        let mut employees = self
            .ctx
            .store
            .transaction(move |tx| {
                Ok(tx.employees().filter(&|e| {
                    query.search.as_deref().is_none_or(|term| e.matches_search(term))
                        && query
                            .department
                            .as_deref()
                            .is_none_or(|d| e.department.eq_ignore_ascii_case(d))
                        && query.status.is_none_or(|s| e.status == s)
                }))
            })
            .await?;
        employees.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::paginate(employees, page))
    }

    /// Finds one employee.
    pub async fn find_one(&self, id: Uuid) -> EngineResult<Employee> {
        self.ctx
            .store
            .transaction(move |tx| find_employee(tx, id))
            .await
    }

    /// Applies a partial update.
    pub async fn update(&self, id: Uuid, input: UpdateEmployee, actor: &Actor) -> EngineResult<Employee> {
        if let Some(salary) = input.monthly_salary {
            validate_salary(salary)?;
        }

        let now = self.ctx.now();
        let user_id = actor.user_id;

        let (before, after) = self
            .ctx
            .store
            .transaction(move |tx| {
                let before = find_employee(tx, id)?;
                let mut after = before.clone();

                if let Some(email) = input.email {
                    if !email.eq_ignore_ascii_case(&before.email) {
                        let lowered = email.to_lowercase();
                        let taken = tx
                            .employees()
                            .count(&|e| e.id != id && e.email.to_lowercase() == lowered);
                        if taken > 0 {
                            return Err(EngineError::conflict("Email already exists"));
                        }
                    }
                    after.email = email;
                }
                if let Some(full_name) = input.full_name {
                    after.full_name = full_name;
                }
                if let Some(department) = input.department {
                    after.department = department;
                }
                if let Some(position) = input.position {
                    after.position = position;
                }
                if let Some(salary) = input.monthly_salary {
                    after.monthly_salary = salary;
                }
                if let Some(status) = input.status {
                    after.status = status;
                }

                after.updated_by = Some(user_id);
                after.updated_at = now;
                let after = tx.employees().update(after)?;
                Ok((before, after))
            })
            .await?;

        info!(employee_id = %id, "Employee updated");
        self.ctx
            .audit(
                AuditEntry::new(Employee::ENTITY, id, AuditAction::Update, actor)
                    .with_old(&before)
                    .with_new(&after),
            )
            .await;

        Ok(after)
    }

    /// Deletes an employee who has never been paid.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> EngineResult<Employee> {
        let removed = self
            .ctx
            .store
            .transaction(move |tx| {
                find_employee(tx, id)?;
                if tx.payslips().count(&|p| p.employee_id == id) > 0 {
                    return Err(EngineError::conflict(
                        "Cannot delete employee with existing payslips",
                    ));
                }
                tx.employees().delete(id)
            })
            .await?;

        info!(employee_id = %id, "Employee deleted");
        self.ctx
            .audit(
                AuditEntry::new(Employee::ENTITY, id, AuditAction::Delete, actor)
                    .with_old(&removed),
            )
            .await;

        Ok(removed)
    }
}
