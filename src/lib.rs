//! Attendance-period and payroll engine for an HR back office.
//!
//! The crate keeps employees, daily attendance, overtime requests and
//! reimbursement claims against attendance periods, and turns them into
//! payslips when an administrator runs payroll for a period.
//!
//! - [`services`] holds the business operations, each running in one store
//!   unit of work.
//! - [`calculation`] is the pure payroll calculator.
//! - [`sequencer`] generates `EMPyymmNNN` and `PAYyyyymmNNNN` codes.
//! - [`api`] exposes the services over HTTP.

pub mod api;
pub mod audit;
pub mod calculation;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod sequencer;
pub mod services;
pub mod store;
