mod feeder;
mod hierarchy;
mod reading;

pub use feeder::{Band, Feeder, FeederRecord, FeederStatus};
pub use hierarchy::{BusinessHub, Region};
pub use reading::{Reading, ReadingRecord, ReadingSnapshot};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("unknown band '{0}', expected one of A, B, C, D, E")]
    UnknownBand(String),
    #[error("unknown feeder status '{0}'")]
    UnknownStatus(String),
    #[error("daily energy uptake must be a non-negative number, got {0}")]
    InvalidUptake(f64),
    #[error("feeder {feeder_id} references hub {expected_hub} but was validated against {actual_hub}")]
    HubMismatch {
        feeder_id: String,
        expected_hub: String,
        actual_hub: String,
    },
    #[error("feeder {feeder_id} is in region {feeder_region} but hub {hub_id} belongs to {hub_region}")]
    RegionMismatch {
        feeder_id: String,
        feeder_region: String,
        hub_id: String,
        hub_region: String,
    },
    #[error("reading for feeder {feeder_id} on {date} already exists")]
    DuplicateReading { feeder_id: String, date: time::Date },
}
