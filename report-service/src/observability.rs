use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG`, when set, replaces the
/// default `report_service=<level>` filter.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("report_service={default_level},feeder_client={default_level},warn"))
    });

    // A second init (tests, multiple binaries in one process) keeps the first.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
