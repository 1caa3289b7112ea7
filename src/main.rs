use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use intake::config::AppConfig;
use intake::db;
use intake::handlers;
use intake::services::calendar::StubCalendar;
use intake::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let default_tenant = config.load_default_tenant()?;

    tracing::info!(
        strategy = ?config.phrase_strategy,
        company = default_tenant.company_name(),
        "booking assistant configured"
    );

    let state = Arc::new(AppState {
        db: db::shared(conn),
        config: config.clone(),
        calendar: Box::new(StubCalendar),
        phrases: config.phrase_strategy.picker(),
        default_tenant,
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
