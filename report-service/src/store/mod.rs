//! Collaborators the report engine reads from.
//!
//! The engine only ever sees these traits. `PgStore` backs them with the
//! database, `InMemoryStore` with owned vectors.

pub mod cache;
pub mod memory;
pub mod pg;
mod resolve;

use anyhow::Result;
use feeder_client::domain::{BusinessHub, Feeder, Reading, Region};
use time::Date;

pub use cache::{CachedReadings, ReadingRangeCache};
pub use feeder_client::db::FeederQuery;
pub use memory::InMemoryStore;
pub use pg::PgStore;
pub use resolve::{materialize, FeederView};

#[async_trait::async_trait]
pub trait FeederDirectory: Send + Sync {
    async fn feeders(&self, query: &FeederQuery) -> Result<Vec<Feeder>>;
}

#[async_trait::async_trait]
pub trait HierarchyDirectory: Send + Sync {
    async fn regions(&self) -> Result<Vec<Region>>;

    async fn business_hubs(&self) -> Result<Vec<BusinessHub>>;
}

/// Case-insensitive exact name match.
pub fn find_region<'a>(regions: &'a [Region], name: &str) -> Option<&'a Region> {
    let name = name.trim();
    regions.iter().find(|r| r.name.eq_ignore_ascii_case(name))
}

/// Case-insensitive exact name match.
pub fn find_business_hub<'a>(hubs: &'a [BusinessHub], name: &str) -> Option<&'a BusinessHub> {
    let name = name.trim();
    hubs.iter().find(|h| h.name.eq_ignore_ascii_case(name))
}

#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    /// Readings of every feeder dated within `[start, end]`.
    async fn readings_in_range(&self, start: Date, end: Date) -> Result<Vec<Reading>>;

    async fn reading_on(&self, feeder_id: &str, day: Date) -> Result<Option<Reading>>;
}
