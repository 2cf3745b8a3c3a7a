use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::LocationReading;
use super::evaluator::CheckInRejection;
use super::repository::AttendanceRepository;
use super::service::{AttendanceService, AttendanceServiceError};
use crate::workflows::directory::{caller_from_headers, Coordinate, DirectoryRepository};
use crate::workflows::repository::RepositoryError;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CheckInPayload {
    #[serde(default)]
    pub(crate) location: Option<LocationReading>,
}

/// Router builder exposing check-in, check-out, and geofence preview.
pub fn attendance_router<D, A>(service: Arc<AttendanceService<D, A>>) -> Router
where
    D: DirectoryRepository + 'static,
    A: AttendanceRepository + 'static,
{
    Router::new()
        .route("/api/v1/attendance/check-in", post(check_in_handler::<D, A>))
        .route("/api/v1/attendance/check-out", post(check_out_handler::<D, A>))
        .route("/api/v1/attendance/preview", post(preview_handler::<D, A>))
        .route("/api/v1/attendance/today", get(today_handler::<D, A>))
        .with_state(service)
}

pub(crate) async fn check_in_handler<D, A>(
    State(service): State<Arc<AttendanceService<D, A>>>,
    headers: HeaderMap,
    axum::Json(payload): axum::Json<CheckInPayload>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AttendanceRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    let location = payload.location;
    let now = Local::now().naive_local();

    match service.check_in(caller.as_ref(), location, now) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_out_handler<D, A>(
    State(service): State<Arc<AttendanceService<D, A>>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AttendanceRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    let now = Local::now().naive_local();

    match service.check_out(caller.as_ref(), now) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn preview_handler<D, A>(
    State(service): State<Arc<AttendanceService<D, A>>>,
    headers: HeaderMap,
    axum::Json(coordinate): axum::Json<Coordinate>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AttendanceRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    match service.preview(caller.as_ref(), coordinate) {
        Ok(preview) => (StatusCode::OK, axum::Json(preview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn today_handler<D, A>(
    State(service): State<Arc<AttendanceService<D, A>>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AttendanceRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    let now = Local::now().naive_local();

    match service.today(caller.as_ref(), now) {
        Ok(Some(record)) => (StatusCode::OK, axum::Json(record)).into_response(),
        Ok(None) => {
            let payload = json!({ "date": now.date(), "record": serde_json::Value::Null });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: AttendanceServiceError) -> Response {
    let status = match &error {
        AttendanceServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AttendanceServiceError::EmployeeNotFound(_) => StatusCode::NOT_FOUND,
        AttendanceServiceError::Rejected(CheckInRejection::AlreadyCheckedIn { .. })
        | AttendanceServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AttendanceServiceError::Rejected(_) | AttendanceServiceError::NoActiveCheckIn => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AttendanceServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AttendanceServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
