//! Leave approval driven end to end through the public HTTP router.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use workforce::config::WorkflowConfig;
    use workforce::workflows::directory::{
        AttendanceCondition, DirectoryRepository, Employee, EmployeeId, LocationZone, Role,
        Shift, ShiftId,
    };
    use workforce::workflows::leave::{
        leave_router, LeaveRepository, LeaveRequest, LeaveRequestId, LeaveService, LeaveStatus,
    };
    use workforce::workflows::RepositoryError;

    pub(super) struct MemoryDirectory {
        employees: HashMap<EmployeeId, Employee>,
    }

    impl MemoryDirectory {
        fn seeded() -> Self {
            let employees = [
                Employee::new("u1", "Somchai", Role::Ceo, AttendanceCondition::Exempt),
                Employee::new("u6", "Wipada", Role::OfficeManager, AttendanceCondition::Flexible),
                Employee::new("u3", "Somsak", Role::Supervisor, AttendanceCondition::Shift),
                Employee::new("u7", "Ploy", Role::Employee, AttendanceCondition::Shift),
            ];
            Self {
                employees: employees
                    .into_iter()
                    .map(|employee| (employee.id.clone(), employee))
                    .collect(),
            }
        }
    }

    impl DirectoryRepository for MemoryDirectory {
        fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
            Ok(self.employees.get(id).cloned())
        }

        fn shift(&self, _id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
            Ok(None)
        }

        fn zones(&self) -> Result<Vec<LocationZone>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryLeave {
        requests: Mutex<Vec<LeaveRequest>>,
    }

    impl LeaveRepository for MemoryLeave {
        fn insert(&self, request: LeaveRequest) -> Result<LeaveRequest, RepositoryError> {
            let mut guard = self.requests.lock().expect("repository mutex poisoned");
            guard.push(request.clone());
            Ok(request)
        }

        fn update(&self, mut request: LeaveRequest) -> Result<LeaveRequest, RepositoryError> {
            let mut guard = self.requests.lock().expect("repository mutex poisoned");
            let stored = guard
                .iter_mut()
                .find(|existing| existing.id == request.id)
                .ok_or(RepositoryError::NotFound)?;
            if stored.revision != request.revision {
                return Err(RepositoryError::Conflict);
            }
            request.revision += 1;
            *stored = request.clone();
            Ok(request)
        }

        fn fetch(&self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, RepositoryError> {
            let guard = self.requests.lock().expect("repository mutex poisoned");
            Ok(guard.iter().find(|request| request.id == *id).cloned())
        }

        fn for_requester(
            &self,
            requester: &EmployeeId,
        ) -> Result<Vec<LeaveRequest>, RepositoryError> {
            let guard = self.requests.lock().expect("repository mutex poisoned");
            Ok(guard
                .iter()
                .filter(|request| request.requester == *requester)
                .cloned()
                .collect())
        }

        fn pending(&self) -> Result<Vec<LeaveRequest>, RepositoryError> {
            let guard = self.requests.lock().expect("repository mutex poisoned");
            Ok(guard
                .iter()
                .filter(|request| request.status == LeaveStatus::Pending)
                .cloned()
                .collect())
        }
    }

    pub(super) fn build_router() -> axum::Router {
        let service = LeaveService::new(
            Arc::new(MemoryDirectory::seeded()),
            Arc::new(MemoryLeave::default()),
            &WorkflowConfig::default(),
        );
        leave_router(Arc::new(service))
    }
}

mod routing {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use workforce::workflows::directory::CALLER_HEADER;

    use super::common::build_router;

    async fn read_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    async fn call(router: &axum::Router, request: Request<Body>) -> Response {
        router
            .clone()
            .oneshot(request)
            .await
            .expect("router executes")
    }

    fn post(uri: &str, caller: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(CALLER_HEADER, caller)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn request_is_approved_by_each_role_in_turn() {
        let router = build_router();

        let submitted = call(
            &router,
            post(
                "/api/v1/leave/requests",
                "u7",
                json!({
                    "leave_type": "VACATION",
                    "start_date": "2030-03-04",
                    "end_date": "2030-03-05",
                    "reason": "wedding",
                }),
            ),
        )
        .await;
        assert_eq!(submitted.status(), StatusCode::CREATED);
        let view = read_json(submitted).await;
        let request_id = view["request_id"].as_str().expect("id").to_string();
        assert_eq!(view["status"], "PENDING");
        assert_eq!(
            view["current_approver"],
            json!({ "kind": "role", "value": "SUPERVISOR" })
        );

        let approve_uri = format!("/api/v1/leave/requests/{request_id}/approve");
        let wrong_step = call(&router, post(&approve_uri, "u1", json!({}))).await;
        assert_eq!(
            wrong_step.status(),
            StatusCode::OK,
            "ceo holds the override capability"
        );
        let body = read_json(wrong_step).await;
        assert_eq!(body["outcome"]["kind"], "advanced");
        assert_eq!(
            body["request"]["current_approver"],
            json!({ "kind": "role", "value": "OFFICE_MANAGER" })
        );

        let denied = call(
            &router,
            post(
                &format!("/api/v1/leave/requests/{request_id}/reject"),
                "u3",
                json!({}),
            ),
        )
        .await;
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let second = call(&router, post(&approve_uri, "u6", json!({}))).await;
        assert_eq!(second.status(), StatusCode::OK);
        let last = call(&router, post(&approve_uri, "u1", json!({}))).await;
        let body = read_json(last).await;
        assert_eq!(body["outcome"]["kind"], "completed");
        assert_eq!(body["request"]["status"], "APPROVED");

        let progress = call(
            &router,
            Request::get(format!("/api/v1/leave/requests/{request_id}/progress"))
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        let body = read_json(progress).await;
        let states: Vec<&str> = body["steps"]
            .as_array()
            .expect("steps")
            .iter()
            .map(|step| step["state"].as_str().expect("state"))
            .collect();
        assert_eq!(states, vec!["completed", "completed", "completed"]);
    }

    #[tokio::test]
    async fn sick_leave_without_certificate_is_unprocessable() {
        let router = build_router();

        let response = call(
            &router,
            post(
                "/api/v1/leave/requests",
                "u7",
                json!({
                    "leave_type": "SICK",
                    "start_date": "2030-05-06",
                    "end_date": "2030-05-08",
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = read_json(response).await;
        assert!(body["error"]
            .as_str()
            .expect("message")
            .contains("medical certificate"));
    }
}
