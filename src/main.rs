use axum::extract::DefaultBodyLimit;
use axum::{routing::delete, routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pacs_portal::app_state::AppState;
use pacs_portal::config::AppConfig;
use pacs_portal::db;
use pacs_portal::routes;
use pacs_portal::services::{
    archive::ArchiveTracker,
    challenge::ChallengeStore,
    mailer::CodeMailer,
    pacs::PacsClient,
    token::TokenService,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing pacs-portal server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "archive_jobs_total",
        "Archive jobs requested over streaming sessions"
    );
    metrics::describe_counter!(
        "archive_jobs_completed",
        "Archive jobs tracked to successful completion"
    );
    metrics::describe_counter!(
        "archive_jobs_failed",
        "Archive jobs that ended in failure or a poll error"
    );
    metrics::describe_counter!("login_attempts_total", "Login attempts received");
    metrics::describe_counter!(
        "logins_completed_total",
        "Verification codes exchanged for a session token"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize PACS gateway client
    tracing::info!(pacs_url = %config.pacs_url, "Initializing PACS gateway client");
    let pacs = PacsClient::new(&config.pacs_url);

    // Initialize verification challenge store
    let challenges = ChallengeStore::new(Duration::from_secs(config.code_ttl_minutes * 60));

    // Initialize session-token service
    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_minutes);

    // Initialize SMTP code dispatch
    tracing::info!(host = %config.smtp_host, "Initializing SMTP relay");
    let mailer = CodeMailer::new(&config.smtp_host, config.smtp_port, &config.mail_from)
        .expect("Failed to initialize SMTP mailer");

    let archive_tracker = ArchiveTracker::new(Duration::from_secs(config.poll_interval_secs));

    // Create shared application state
    let state = AppState::new(db_pool, pacs, challenges, tokens, mailer, archive_tracker);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/auth/register", post(routes::auth::register))
        .route("/api/v1/auth/login", post(routes::auth::login))
        .route("/api/v1/auth/verify", post(routes::auth::verify))
        .route(
            "/api/v1/news",
            get(routes::news::list_news).post(routes::news::create_news),
        )
        .route(
            "/api/v1/news/{id}",
            get(routes::news::get_news)
                .put(routes::news::update_news)
                .delete(routes::news::delete_news),
        )
        .route("/api/v1/studies", get(routes::dicom::list_studies))
        .route(
            "/api/v1/studies/{study_id}",
            delete(routes::dicom::delete_study),
        )
        .route(
            "/api/v1/studies/{study_id}/series",
            get(routes::dicom::list_series),
        )
        .route(
            "/api/v1/studies/{study_id}/archive",
            get(routes::dicom::download_archive),
        )
        .route(
            "/api/v1/series/{series_id}/instances",
            get(routes::dicom::list_instances),
        )
        .route(
            "/api/v1/instances/{instance_id}/tags",
            get(routes::dicom::instance_tags),
        )
        .route("/api/v1/dicom", post(routes::dicom::upload_dicom))
        .route(
            "/api/v1/ws/archive-status",
            get(routes::archive_ws::archive_status),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(256 * 1024 * 1024)); // DICOM uploads are large

    tracing::info!("Starting pacs-portal on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
