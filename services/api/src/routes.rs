use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use workforce::workflows::attendance::{attendance_router, AttendanceRepository, AttendanceService};
use workforce::workflows::directory::DirectoryRepository;
use workforce::workflows::leave::{leave_router, LeaveRepository, LeaveService};

pub(crate) fn with_workflow_routes<D, A, L>(
    attendance: Arc<AttendanceService<D, A>>,
    leave: Arc<LeaveService<D, L>>,
) -> axum::Router
where
    D: DirectoryRepository + 'static,
    A: AttendanceRepository + 'static,
    L: LeaveRepository + 'static,
{
    attendance_router(attendance)
        .merge(leave_router(leave))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
