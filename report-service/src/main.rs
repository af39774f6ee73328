use anyhow::Result;
use report_service::{
    clock::SystemClock,
    config::AppConfig,
    http::{self, AppState},
    metrics_server, observability,
    store::PgStore,
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing("info");

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    // Fail at startup rather than on the first request if the template is bad.
    let orchestrator = cfg
        .report
        .orchestrator(PgStore::new(pool), Arc::new(SystemClock))?;

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        default_analysis: cfg.report.include_analysis,
    };

    let addr: SocketAddr = cfg
        .http
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "report service listening");

    axum::serve(listener, http::router(state).into_make_service()).await?;

    Ok(())
}
