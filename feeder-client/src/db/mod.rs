pub mod feeder_queries;
pub mod reading_queries;

pub use feeder_queries::FeederQuery;
