//! Query-string types for the payroll API.
//!
//! List endpoints accept `page` and `limit` next to their filters. Each query
//! splits into the service's filter type and a resolved [`PageRequest`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PaginationPolicy;
use crate::models::{
    AttendanceStatus, EmployeeStatus, OvertimeStatus, PageRequest, ReimbursementStatus,
};
use crate::services::{AttendanceQuery, EmployeeQuery, OvertimeQuery, ReimbursementQuery};

/// Plain `?page=&limit=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Resolves the page against the configured limits.
    pub fn resolve(&self, policy: &PaginationPolicy) -> PageRequest {
        PageRequest::resolve(self.page, self.limit, policy)
    }
}

/// `GET /employees`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
}

impl EmployeeListQuery {
    pub fn split(self, policy: &PaginationPolicy) -> (EmployeeQuery, PageRequest) {
        (
            EmployeeQuery {
                search: self.search.filter(|s| !s.trim().is_empty()),
                department: self.department,
                status: self.status,
            },
            PageRequest::resolve(self.page, self.limit, policy),
        )
    }
}

/// `GET /attendance`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub attendance_period_id: Option<Uuid>,
}

impl AttendanceListQuery {
    pub fn split(self, policy: &PaginationPolicy) -> (AttendanceQuery, PageRequest) {
        (
            AttendanceQuery {
                start_date: self.start_date,
                end_date: self.end_date,
                status: self.status,
                attendance_period_id: self.attendance_period_id,
            },
            PageRequest::resolve(self.page, self.limit, policy),
        )
    }
}

/// `GET /overtime`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OvertimeListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OvertimeStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl OvertimeListQuery {
    pub fn split(self, policy: &PaginationPolicy) -> (OvertimeQuery, PageRequest) {
        (
            OvertimeQuery {
                status: self.status,
                start_date: self.start_date,
                end_date: self.end_date,
            },
            PageRequest::resolve(self.page, self.limit, policy),
        )
    }
}

/// `GET /reimbursements`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReimbursementListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub attendance_period_id: Option<Uuid>,
    pub status: Option<ReimbursementStatus>,
}

impl ReimbursementListQuery {
    pub fn split(self, policy: &PaginationPolicy) -> (ReimbursementQuery, PageRequest) {
        (
            ReimbursementQuery {
                attendance_period_id: self.attendance_period_id,
                status: self.status,
            },
            PageRequest::resolve(self.page, self.limit, policy),
        )
    }
}

/// Optional `?attendance_period_id=` used by summaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodFilter {
    pub attendance_period_id: Option<Uuid>,
}
