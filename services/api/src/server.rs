use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCompetencyRepository};
use crate::routes::with_competency_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use turbine_crew::config::AppConfig;
use turbine_crew::error::AppError;
use turbine_crew::telemetry;
use turbine_crew::workflows::competency::CompetencyService;

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

    let rules = config.competency.rule_table()?;
    info!(
        rules_version = %rules.version,
        max_points = rules.max_points(),
        history_cap = config.competency.history_cap,
        "competency rules loaded"
    );

    let repository = Arc::new(InMemoryCompetencyRepository::default());
    let competency_service = Arc::new(CompetencyService::with_history_cap(
        repository,
        rules,
        config.competency.history_cap,
    ));

    let app = with_competency_routes(competency_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "competency service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
