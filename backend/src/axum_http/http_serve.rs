use crate::{
    auth::AuthConfig,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::job_tasks::JobTaskRegistry,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::infra::{
    analyzer::http_analyzer::{HttpAnalyzerConfig, HttpVideoAnalyzer},
    db::postgres::postgres_connection::PgPoolSquad,
    storages::local_storage::LocalFileStorage,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let tasks = Arc::new(JobTaskRegistry::new(config.processing.max_concurrent_jobs));
    let analyzer = Arc::new(HttpVideoAnalyzer::new(HttpAnalyzerConfig {
        base_url: config.analyzer.base_url.clone(),
        timeout: Duration::from_secs(config.analyzer.timeout_secs),
    })?);
    let storage = Arc::new(LocalFileStorage::open(&config.storage.media_root).await?);

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/videos",
            routers::videos::routes(Arc::clone(&db_pool)),
        )
        .nest(
            "/api/v1/jobs",
            routers::jobs::routes(Arc::clone(&db_pool), analyzer, storage, Arc::clone(&tasks)),
        )
        .nest(
            "/api/v1/credits",
            routers::credits::routes(Arc::clone(&db_pool)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(AuthConfig::new(&config.auth.jwt_secret)))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        in_flight = tasks.in_flight(),
        "Server stopped, waiting for background jobs"
    );
    tasks.wait_all().await;
    info!("Background jobs drained");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
