use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lead_relay::config::AppConfig;
use lead_relay::error::AppError;
use lead_relay::telemetry;
use lead_relay::workflows::qualification::{
    InMemoryProspectStore, LeadQualificationService, TwoFactorClient,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};

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

    let provider = TwoFactorClient::new(&config.otp_provider)
        .inspect_err(|err| error!(error = %err, "unable to build otp provider client"))?;
    let store = Arc::new(InMemoryProspectStore::default());
    let service = Arc::new(LeadQualificationService::new(
        store,
        Arc::new(provider),
        &config.qualification,
    ));

    let app = with_operational_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        provider = %config.otp_provider.base_url,
        disqualifying_tiers = ?config.qualification.disqualifying_tiers,
        "lead qualification relay ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
