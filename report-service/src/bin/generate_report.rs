use anyhow::{bail, Result};
use report_service::{
    clock::SystemClock,
    config::AppConfig,
    http::parse_day,
    observability,
    store::PgStore,
    ReportQuery,
};
use sqlx::postgres::PgPoolOptions;
use std::{env, fs::File, io::BufWriter, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing("info");

    let args: Vec<String> = env::args().collect();
    let mut query = ReportQuery::default();
    match args.len() {
        2 => {}
        3 => query.date = Some(parse_day(&args[2]).map_err(anyhow::Error::msg)?),
        4 => {
            query.start = Some(parse_day(&args[2]).map_err(anyhow::Error::msg)?);
            query.end = Some(parse_day(&args[3]).map_err(anyhow::Error::msg)?);
        }
        _ => bail!("usage: generate_report <output.xlsx> [<date> | <start> <end>]"),
    }
    let output = &args[1];

    // Load configuration (REPORT_CONFIG can point at a report-only file).
    let cfg = AppConfig::load()?;
    query.include_analysis = cfg.report.include_analysis;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let orchestrator = cfg
        .report
        .orchestrator(PgStore::new(pool), Arc::new(SystemClock))?;

    let report = orchestrator.run(&query).await?;
    report.write_to(BufWriter::new(File::create(output)?))?;

    tracing::info!(
        output = %output,
        title = %report.title,
        feeders = report.feeders.len(),
        "report written"
    );

    Ok(())
}
