pub mod categories;
pub mod clock;
pub mod compliance;
pub mod config;
pub mod dates;
pub mod delivery;
pub mod error;
pub mod grid;
pub mod http;
pub mod matrix;
pub mod metrics_server;
pub mod observability;
pub mod orchestrator;
pub mod store;

pub use error::{ReportError, ReportResult};
pub use orchestrator::{Orchestrator, Report, ReportPeriod, ReportQuery};
