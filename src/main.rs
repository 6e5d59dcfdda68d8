use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use autocenter::backend;
use autocenter::config::AppConfig;
use autocenter::routes;
use autocenter::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let backend = backend::from_config(&config)?;
    tracing::info!(policy = ?config.slot_policy, "slot policy");

    let state = Arc::new(AppState {
        backend,
        config: config.clone(),
    });
    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
