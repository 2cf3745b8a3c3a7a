use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAttendanceRepository, InMemoryDirectory, InMemoryLeaveRepository,
};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use workforce::config::AppConfig;
use workforce::error::AppError;
use workforce::telemetry;
use workforce::workflows::attendance::AttendanceService;
use workforce::workflows::leave::LeaveService;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let directory = Arc::new(InMemoryDirectory::seeded()?);
    let attendance_service = Arc::new(AttendanceService::new(
        directory.clone(),
        Arc::new(InMemoryAttendanceRepository::default()),
        &config.workflow,
    ));
    let leave_service = Arc::new(LeaveService::new(
        directory,
        Arc::new(InMemoryLeaveRepository::default()),
        &config.workflow,
    ));

    let app = with_workflow_routes(attendance_service, leave_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        drift_policy = %config.workflow.chain_drift,
        "workforce service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
