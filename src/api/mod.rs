//! HTTP API for the payroll engine.
//!
//! Exposes periods, employees, attendance, overtime, reimbursements, payroll
//! runs and payslips as JSON endpoints. Authentication happens upstream; the
//! acting user's id arrives in the `x-user-id` header.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::{REQUEST_ID_HEADER, USER_ID_HEADER, create_router};
pub use request::{
    AttendanceListQuery, EmployeeListQuery, OvertimeListQuery, PageQuery, PeriodFilter,
    ReimbursementListQuery,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
