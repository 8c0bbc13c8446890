//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors are rendered by the
//! tracker crate as `kernel::error::AppError` problem documents.

use axum::{
    Router, http,
    http::{Method, header},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker::{
    CaixaDrawSource, CheckResultsUseCase, MIGRATOR, RulesRegistry, SqliteTicketRepository,
    TrackerConfig, schedule_recurring, tracker_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,tracker=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(TrackerConfig::from_env()?);

    // Database connection
    let pool = tracker::connect(&config.database_url).await?;
    tracing::info!(database_url = %config.database_url, "Connected to database");

    MIGRATOR.run(&pool).await?;
    tracing::info!("Migrations completed");

    // Lottery rules, with extra tier spellings when configured
    let mut rules = RulesRegistry::builtin();
    if let Some(path) = &config.tier_labels_path {
        let json = tokio::fs::read_to_string(path).await?;
        rules = rules.with_extra_labels_json(&json)?;
        tracing::info!(path = %path.display(), "Loaded extra tier labels");
    }
    let rules = Arc::new(rules);

    let repo = Arc::new(SqliteTicketRepository::new(pool));
    let draw_source = Arc::new(CaixaDrawSource::new(
        config.draw_api_base_url.clone(),
        config.draw_fetch_timeout,
    )?);

    // Background sweep over pending tickets
    let sweep = schedule_recurring(
        Arc::new(CheckResultsUseCase::new(
            repo.clone(),
            draw_source.clone(),
            rules.clone(),
            config.clone(),
        )),
        config.sweep_interval,
        config.sweep_jitter,
    );

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]));

    // Build router
    let app = Router::new()
        .nest(
            "/api",
            tracker_router(repo, draw_source, rules, config.clone()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
