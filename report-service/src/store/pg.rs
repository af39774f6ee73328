use anyhow::Result;
use feeder_client::{
    db::{feeder_queries, reading_queries},
    domain::{BusinessHub, Feeder, Reading, Region},
};
use sqlx::PgPool;
use time::Date;

use super::{FeederDirectory, FeederQuery, HierarchyDirectory, ReadingStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FeederDirectory for PgStore {
    async fn feeders(&self, query: &FeederQuery) -> Result<Vec<Feeder>> {
        feeder_queries::list_feeders(&self.pool, query).await
    }
}

#[async_trait::async_trait]
impl HierarchyDirectory for PgStore {
    async fn regions(&self) -> Result<Vec<Region>> {
        feeder_queries::list_regions(&self.pool).await
    }

    async fn business_hubs(&self) -> Result<Vec<BusinessHub>> {
        feeder_queries::list_business_hubs(&self.pool).await
    }
}

#[async_trait::async_trait]
impl ReadingStore for PgStore {
    async fn readings_in_range(&self, start: Date, end: Date) -> Result<Vec<Reading>> {
        reading_queries::readings_in_range(&self.pool, start, end).await
    }

    async fn reading_on(&self, feeder_id: &str, day: Date) -> Result<Option<Reading>> {
        reading_queries::reading_on(&self.pool, feeder_id, day).await
    }
}
