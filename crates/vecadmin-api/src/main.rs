//! VecAdmin API Server
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vecadmin_api::{create_router, state::AppState};
use vecadmin_core::config::{AppConfig, LoggingConfig};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "vecadmin_api={level},vecadmin_vector={level},tower_http={level}",
            level = logging.level
        ))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("VECADMIN_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?
            .with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(
        vector_db = %config.vector_db.url,
        tenant = %config.vector_db.tenant,
        database = %config.vector_db.database,
        "Default connection"
    );

    let state = Arc::new(AppState::new(config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("VecAdmin API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
