//! HTTP request handlers for the payroll API.
//!
//! Handlers are thin: they extract the acting user, decode the body or query,
//! call one service operation and map its error into an [`ApiErrorResponse`].

use axum::{
    Json, Router,
    async_trait,
    extract::{
        FromRequestParts, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit::Actor;
use crate::error::EngineError;
use crate::services::{
    CreateEmployee, CreateOvertime, CreatePeriod, CreateReimbursement, ProcessPayroll,
    SubmitAttendance, UpdateEmployee, UpdateOvertime, UpdateOvertimeStatus, UpdatePeriod,
    UpdateReimbursement, UpdateReimbursementStatus,
};

use super::request::{
    AttendanceListQuery, EmployeeListQuery, OvertimeListQuery, PageQuery, PeriodFilter,
    ReimbursementListQuery,
};
use super::response::ApiErrorResponse;
use super::state::AppState;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

type ApiResult<T> = Result<T, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/attendance-periods", post(create_period).get(list_periods))
        .route("/attendance-periods/current", get(current_period))
        .route(
            "/attendance-periods/:id",
            get(find_period).patch(update_period).delete(delete_period),
        )
        .route("/attendance-periods/:id/attendance", get(period_attendance))
        .route("/attendance-periods/:id/payslips", get(period_payslips))
        .route("/employees", post(create_employee).get(list_employees))
        .route(
            "/employees/:id",
            get(find_employee).patch(update_employee).delete(delete_employee),
        )
        .route("/attendance", post(submit_attendance).get(list_attendance))
        .route("/attendance/summary", get(attendance_summary))
        .route("/attendance/:id", get(find_attendance))
        .route("/overtime", post(create_overtime).get(list_overtime))
        .route(
            "/overtime/:id",
            get(find_overtime).patch(update_overtime).delete(delete_overtime),
        )
        .route("/overtime/:id/status", patch(update_overtime_status))
        .route(
            "/reimbursements",
            post(create_reimbursement).get(list_reimbursements),
        )
        .route("/reimbursements/summary", get(reimbursement_summary))
        .route(
            "/reimbursements/:id",
            get(find_reimbursement)
                .patch(update_reimbursement)
                .delete(delete_reimbursement),
        )
        .route(
            "/reimbursements/:id/status",
            patch(update_reimbursement_status),
        )
        .route("/payroll/process", post(process_payroll))
        .route("/payroll/history", get(payroll_history))
        .route("/payroll/:period_id/summary", get(payroll_summary))
        .route("/payroll/:period_id/status", get(payroll_status))
        .route("/payslips/preview", get(preview_payslip))
        .route("/payslips/preview/all", get(preview_all_payslips))
        .route("/payslips/:period_id", get(find_payslip))
        .with_state(state)
}

/// The acting user, taken from the headers set by the upstream gateway.
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let user_id = header(USER_ID_HEADER)
            .and_then(|v| Uuid::parse_str(&v).ok())
            .ok_or_else(|| EngineError::unauthorized("Missing or invalid user id"))?;
        let ip_address = header(FORWARDED_FOR_HEADER)
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()));
        let request_id = header(REQUEST_ID_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(
            request_id = %request_id,
            method = %parts.method,
            uri = %parts.uri,
            user_id = %user_id,
            "Handling request"
        );

        Ok(Actor {
            user_id,
            ip_address,
            request_id: Some(request_id),
        })
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    Ok(payload?.0)
}

fn path<T>(param: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    Ok(param?.0)
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    Ok(params?.0)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// Attendance periods

async fn create_period(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreatePeriod>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let period = state.services().periods.create(body(payload)?, &actor).await?;
    Ok((StatusCode::CREATED, Json(period)))
}

async fn list_periods(
    State(state): State<AppState>,
    _actor: Actor,
    params: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let page = query(params)?.resolve(&state.config().pagination);
    Ok(Json(state.services().periods.list(page).await?))
}

async fn current_period(State(state): State<AppState>, _actor: Actor) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().periods.find_current().await?))
}

async fn find_period(
    State(state): State<AppState>,
    _actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().periods.find_one(path(id)?).await?))
}

async fn update_period(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePeriod>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let period = state
        .services()
        .periods
        .update(path(id)?, body(payload)?, &actor)
        .await?;
    Ok(Json(period))
}

async fn delete_period(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().periods.delete(path(id)?, &actor).await?))
}

async fn period_attendance(
    State(state): State<AppState>,
    _actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().attendance.by_period(path(id)?).await?))
}

async fn period_payslips(
    State(state): State<AppState>,
    _actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().payslips.list_for_period(path(id)?).await?))
}

// Employees

async fn create_employee(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateEmployee>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let employee = state.services().employees.create(body(payload)?, &actor).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn list_employees(
    State(state): State<AppState>,
    _actor: Actor,
    params: Result<Query<EmployeeListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let (filter, page) = query(params)?.split(&state.config().pagination);
    Ok(Json(state.services().employees.list(filter, page).await?))
}

async fn find_employee(
    State(state): State<AppState>,
    _actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().employees.find_one(path(id)?).await?))
}

async fn update_employee(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateEmployee>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let employee = state
        .services()
        .employees
        .update(path(id)?, body(payload)?, &actor)
        .await?;
    Ok(Json(employee))
}

async fn delete_employee(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().employees.delete(path(id)?, &actor).await?))
}

// Attendance (self-service)

async fn submit_attendance(
    State(state): State<AppState>,
    actor: Actor,
    payload: Option<Json<SubmitAttendance>>,
) -> ApiResult<impl IntoResponse> {
    let input = payload.map(|Json(input)| input).unwrap_or_default();
    let record = state
        .services()
        .attendance
        .submit(actor.user_id, input, &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_attendance(
    State(state): State<AppState>,
    actor: Actor,
    params: Result<Query<AttendanceListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let (filter, page) = query(params)?.split(&state.config().pagination);
    let records = state
        .services()
        .attendance
        .list(Some(actor.user_id), filter, page)
        .await?;
    Ok(Json(records))
}

async fn attendance_summary(
    State(state): State<AppState>,
    actor: Actor,
    params: Result<Query<PeriodFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let filter = query(params)?;
    let summary = state
        .services()
        .attendance
        .summary(actor.user_id, filter.attendance_period_id)
        .await?;
    Ok(Json(summary))
}

async fn find_attendance(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .services()
        .attendance
        .find_one(path(id)?, Some(actor.user_id))
        .await?;
    Ok(Json(record))
}

// Overtime

async fn create_overtime(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateOvertime>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .services()
        .overtime
        .create(actor.user_id, body(payload)?, &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_overtime(
    State(state): State<AppState>,
    actor: Actor,
    params: Result<Query<OvertimeListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let (filter, page) = query(params)?.split(&state.config().pagination);
    let records = state
        .services()
        .overtime
        .list_for_employee(actor.user_id, filter, page)
        .await?;
    Ok(Json(records))
}

async fn find_overtime(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .services()
        .overtime
        .find_one(path(id)?, Some(actor.user_id))
        .await?;
    Ok(Json(record))
}

async fn update_overtime(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateOvertime>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .services()
        .overtime
        .update(path(id)?, actor.user_id, body(payload)?, &actor)
        .await?;
    Ok(Json(record))
}

async fn delete_overtime(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .services()
        .overtime
        .delete(path(id)?, actor.user_id, &actor)
        .await?;
    Ok(Json(record))
}

async fn update_overtime_status(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateOvertimeStatus>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .services()
        .overtime
        .update_status(path(id)?, body(payload)?, &actor)
        .await?;
    Ok(Json(record))
}

// Reimbursements

async fn create_reimbursement(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateReimbursement>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let claim = state
        .services()
        .reimbursements
        .create(actor.user_id, body(payload)?, &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

async fn list_reimbursements(
    State(state): State<AppState>,
    actor: Actor,
    params: Result<Query<ReimbursementListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let (filter, page) = query(params)?.split(&state.config().pagination);
    let claims = state
        .services()
        .reimbursements
        .list_for_employee(actor.user_id, filter, page)
        .await?;
    Ok(Json(claims))
}

async fn reimbursement_summary(
    State(state): State<AppState>,
    _actor: Actor,
    params: Result<Query<PeriodFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let filter = query(params)?;
    let summary = state
        .services()
        .reimbursements
        .summary(filter.attendance_period_id)
        .await?;
    Ok(Json(summary))
}

async fn find_reimbursement(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let claim = state
        .services()
        .reimbursements
        .find_one(path(id)?, Some(actor.user_id))
        .await?;
    Ok(Json(claim))
}

async fn update_reimbursement(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateReimbursement>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let claim = state
        .services()
        .reimbursements
        .update(path(id)?, actor.user_id, body(payload)?, &actor)
        .await?;
    Ok(Json(claim))
}

async fn delete_reimbursement(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let claim = state
        .services()
        .reimbursements
        .delete(path(id)?, actor.user_id, &actor)
        .await?;
    Ok(Json(claim))
}

async fn update_reimbursement_status(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateReimbursementStatus>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let claim = state
        .services()
        .reimbursements
        .update_status(path(id)?, body(payload)?, &actor)
        .await?;
    Ok(Json(claim))
}

// Payroll

async fn process_payroll(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<ProcessPayroll>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let run = state.services().payroll.process(body(payload)?, &actor).await?;
    Ok(Json(run))
}

async fn payroll_history(
    State(state): State<AppState>,
    _actor: Actor,
    params: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let page = query(params)?.resolve(&state.config().pagination);
    Ok(Json(state.services().payroll.history(page).await?))
}

async fn payroll_summary(
    State(state): State<AppState>,
    _actor: Actor,
    period_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().payroll.summary(path(period_id)?).await?))
}

async fn payroll_status(
    State(state): State<AppState>,
    _actor: Actor,
    period_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().payroll.status(path(period_id)?).await?))
}

// Payslips

async fn preview_payslip(State(state): State<AppState>, actor: Actor) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().payslips.preview(actor.user_id, &actor).await?))
}

async fn preview_all_payslips(
    State(state): State<AppState>,
    _actor: Actor,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services().payslips.preview_all().await?))
}

async fn find_payslip(
    State(state): State<AppState>,
    actor: Actor,
    period_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let payslip = state
        .services()
        .payslips
        .find(actor.user_id, path(period_id)?, &actor)
        .await?;
    Ok(Json(payslip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::response::ApiError;
    use crate::audit::MemoryAuditSink;
    use crate::clock::FixedClock;
    use crate::config::{ConfigLoader, EngineConfig};
    use crate::models::AttendancePeriod;
    use crate::store::MemoryStore;
    use axum::{body::Body, http::Request};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        AppState::new(
            ConfigLoader::from_config(EngineConfig::default()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryAuditSink::new()),
            Arc::new(FixedClock::new(monday)),
        )
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_ID_HEADER, Uuid::new_v4().to_string());
        match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn error_body(response: axum::response::Response) -> ApiError {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_user() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_user_id_returns_401() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/attendance-periods")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_body(response).await.code, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_create_period_returns_201() {
        let router = create_router(create_test_state());
        let body = r#"{"name":"June 2024","start_date":"2024-06-01","end_date":"2024-06-30"}"#;

        let response = router
            .oneshot(request("POST", "/attendance-periods", Some(body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let period: AttendancePeriod = serde_json::from_slice(&body).unwrap();
        assert_eq!(period.name, "June 2024");
        assert!(period.is_active);
    }

    #[tokio::test]
    async fn test_reversed_period_dates_return_400() {
        let router = create_router(create_test_state());
        let body = r#"{"name":"Backwards","start_date":"2024-06-30","end_date":"2024-06-01"}"#;

        let response = router
            .oneshot(request("POST", "/attendance-periods", Some(body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_body(response).await.message,
            "Start date must be before end date"
        );
    }

    #[tokio::test]
    async fn test_invalid_path_id_returns_400() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(request("GET", "/employees/not-a-uuid", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(request("POST", "/employees", Some("{invalid json")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_current_period_returns_404() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(request("GET", "/attendance-periods/current", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_body(response).await.code, "NOT_FOUND");
    }
}
