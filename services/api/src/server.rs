use crate::cli::ServeArgs;
use crate::infra::{bootstrap_admin, AppState, InMemoryIdentityDirectory};
use crate::routes::with_placement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use practicum::config::AppConfig;
use practicum::error::AppError;
use practicum::telemetry;
use practicum::workflows::placement::{
    BootstrapOutcome, InMemoryPlacementStore, PlacementService,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(config.environment, &config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let directory = Arc::new(InMemoryIdentityDirectory::default());
    match &config.bootstrap {
        Some(bootstrap) => {
            if let BootstrapOutcome::Created(user) = bootstrap_admin(&directory, bootstrap)? {
                info!(user_id = %user.id.0, "bootstrap administrator token registered");
            }
        }
        None => warn!("no bootstrap administrator configured; accounts cannot be registered"),
    }

    let store = Arc::new(InMemoryPlacementStore::default());
    let service = Arc::new(PlacementService::new(store));

    let app = with_placement_routes(service, directory)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "placement service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
