use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::{init_metrics, init_tracing};
use service_core::readiness::{FunctionalChecks, ReadinessGate};
use std::sync::Arc;
use tokio::signal;
use web_service::config::WebConfig;
use web_service::services::{CacheRoundTripCheck, CacheStore, DatabaseConnectCheck, RedisCache};
use web_service::{AppState, Application};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    let config = match WebConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(
        &config.app.name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    ) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "web-service stopped");
        std::process::exit(1);
    }
}

async fn run(config: WebConfig) -> anyhow::Result<()> {
    // Recorder first, so the gate's probe counters are kept
    init_metrics()?;

    tracing::info!(
        environment = %config.environment,
        tag = %config.app.tag,
        public = config.environment.is_public(),
        "Starting web-service"
    );

    let cache: Arc<dyn CacheStore> = Arc::new(RedisCache::new(&config.redis.url())?);
    let checks = FunctionalChecks::new()
        .with(CacheRoundTripCheck::new(cache.clone()))
        .with(DatabaseConnectCheck::new(
            config.mongodb.uri.clone(),
            config.mongodb.database.clone(),
        ));

    // Run healthcheck before responding to traffic
    let gate = ReadinessGate::new(config.readiness.probe.clone());
    gate.run(&config.readiness_targets(), &checks).await?;

    let state = AppState {
        ip_rate_limiter: create_ip_rate_limiter(
            config.rate_limit.max_requests,
            config.rate_limit.window_seconds,
        ),
        readiness: gate.subscribe(),
        cache,
        checks,
        config: config.clone(),
    };

    let application = Application::build(state).await?;
    tracing::info!(
        port = application.port(),
        "Application available at {}",
        config.app.url
    );
    application.run_until_stopped(shutdown_signal()).await?;

    Ok(())
}
