use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Datelike, Local};
use serde::Deserialize;
use serde_json::json;

use super::domain::{LeaveDraft, LeaveRequest, LeaveRequestId, LeaveStatusView, LeaveType};
use super::engine::TransitionError;
use super::repository::LeaveRepository;
use super::service::{LeaveService, LeaveServiceError};
use crate::workflows::directory::{caller_from_headers, DirectoryRepository, EmployeeId};
use crate::workflows::repository::RepositoryError;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuotaQuery {
    pub(crate) year: Option<i32>,
    pub(crate) leave_type: Option<LeaveType>,
}

/// Router builder exposing submission, approval, and quota endpoints.
pub fn leave_router<D, L>(service: Arc<LeaveService<D, L>>) -> Router
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/leave/requests",
            post(submit_handler::<D, L>).get(mine_handler::<D, L>),
        )
        .route("/api/v1/leave/requests/:id", get(get_handler::<D, L>))
        .route(
            "/api/v1/leave/requests/:id/progress",
            get(progress_handler::<D, L>),
        )
        .route(
            "/api/v1/leave/requests/:id/approve",
            post(approve_handler::<D, L>),
        )
        .route(
            "/api/v1/leave/requests/:id/reject",
            post(reject_handler::<D, L>),
        )
        .route("/api/v1/leave/inbox", get(inbox_handler::<D, L>))
        .route(
            "/api/v1/employees/:id/approval-chain",
            get(chain_handler::<D, L>),
        )
        .route("/api/v1/employees/:id/quota", get(quota_handler::<D, L>))
        .with_state(service)
}

pub(crate) async fn submit_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<LeaveDraft>,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    let now = Local::now().naive_local();

    match service.submit(caller.as_ref(), draft, now) {
        Ok(request) => (StatusCode::CREATED, axum::Json(request.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mine_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    match service.requests_for(caller.as_ref()) {
        Ok(requests) => (StatusCode::OK, axum::Json(views(&requests))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    Path(id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    match service.get(&LeaveRequestId(id)) {
        Ok(request) => (StatusCode::OK, axum::Json(request.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progress_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    Path(id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    match service.progress(&LeaveRequestId(id)) {
        Ok(progress) => (StatusCode::OK, axum::Json(progress)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    let now = Local::now().naive_local();

    match service.approve(caller.as_ref(), &LeaveRequestId(id), now) {
        Ok(transition) => {
            let payload = json!({
                "request": transition.request.status_view(),
                "outcome": transition.outcome,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    let now = Local::now().naive_local();

    match service.reject(caller.as_ref(), &LeaveRequestId(id), now) {
        Ok(request) => (StatusCode::OK, axum::Json(request.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn inbox_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    let caller = caller_from_headers(&headers);
    match service.pending_for(caller.as_ref()) {
        Ok(requests) => (StatusCode::OK, axum::Json(views(&requests))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn chain_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    Path(id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    let employee_id = EmployeeId::new(id);
    match service.resolve_chain(&employee_id) {
        Ok(chain) => {
            let payload = json!({ "employee_id": employee_id, "steps": chain });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn quota_handler<D, L>(
    State(service): State<Arc<LeaveService<D, L>>>,
    Path(id): Path<String>,
    Query(query): Query<QuotaQuery>,
) -> Response
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    let employee_id = EmployeeId::new(id);
    let year = query.year.unwrap_or_else(|| Local::now().year());

    let result = match query.leave_type {
        Some(leave_type) => service
            .quota(&employee_id, leave_type, year)
            .map(|summary| vec![summary]),
        None => service.quotas(&employee_id, year),
    };

    match result {
        Ok(summaries) => (StatusCode::OK, axum::Json(summaries)).into_response(),
        Err(error) => error_response(error),
    }
}

fn views(requests: &[LeaveRequest]) -> Vec<LeaveStatusView> {
    requests.iter().map(LeaveRequest::status_view).collect()
}

pub(crate) fn error_response(error: LeaveServiceError) -> Response {
    let status = match &error {
        LeaveServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        LeaveServiceError::NotCurrentApprover { .. } | LeaveServiceError::SelfApproval(_) => {
            StatusCode::FORBIDDEN
        }
        LeaveServiceError::EmployeeNotFound(_)
        | LeaveServiceError::RequestNotFound(_)
        | LeaveServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        LeaveServiceError::Transition(TransitionError::AlreadyFinalized { .. })
        | LeaveServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        LeaveServiceError::Admission(_)
        | LeaveServiceError::SelfSubstitute(_)
        | LeaveServiceError::SubstituteNotFound(_)
        | LeaveServiceError::Transition(TransitionError::ChainDrift { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LeaveServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
