use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use feeder_client::{
    domain::{BusinessHub, Feeder, Reading, Region},
    DomainError,
};
use parking_lot::RwLock;
use time::{Date, OffsetDateTime};

use super::{FeederDirectory, FeederQuery, HierarchyDirectory, ReadingStore};

/// Store over owned vectors with the same write rules as the database:
/// feeders are validated against their hub and readings are unique per
/// (feeder, day) with append-only history.
#[derive(Default)]
pub struct InMemoryStore {
    regions: Vec<Region>,
    hubs: Vec<BusinessHub>,
    feeders: Vec<Feeder>,
    readings: RwLock<Vec<Reading>>,
    range_scans: AtomicUsize,
    hierarchy_scans: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub fn add_business_hub(&mut self, hub: BusinessHub) -> Result<()> {
        if !self.regions.iter().any(|r| r.id == hub.region_id) {
            return Err(anyhow!(
                "business hub {} references unknown region {}",
                hub.id,
                hub.region_id
            ));
        }
        self.hubs.push(hub);
        Ok(())
    }

    pub fn add_feeder(&mut self, feeder: Feeder) -> Result<()> {
        let hub = self
            .hubs
            .iter()
            .find(|h| h.id == feeder.business_hub_id)
            .ok_or_else(|| {
                anyhow!(
                    "feeder {} references unknown hub {}",
                    feeder.id,
                    feeder.business_hub_id
                )
            })?;
        feeder.validate(hub)?;
        self.feeders.push(feeder);
        Ok(())
    }

    /// Insert a brand new reading; a second reading for the same feeder and
    /// day is rejected.
    pub fn insert_reading(&self, reading: Reading) -> Result<(), DomainError> {
        let mut readings = self.readings.write();
        if readings
            .iter()
            .any(|r| r.feeder_id == reading.feeder_id && r.reading_date == reading.reading_date)
        {
            return Err(DomainError::DuplicateReading {
                feeder_id: reading.feeder_id,
                date: reading.reading_date,
            });
        }
        readings.push(reading);
        Ok(())
    }

    /// Create or overwrite the reading for (feeder, day).
    pub fn record_reading(
        &self,
        feeder_id: &str,
        day: Date,
        value: f64,
        actor: &str,
        at: OffsetDateTime,
    ) -> Reading {
        let mut readings = self.readings.write();
        match readings
            .iter_mut()
            .find(|r| r.feeder_id == feeder_id && r.reading_date == day)
        {
            Some(existing) => {
                existing.record(value, actor, at);
                existing.clone()
            }
            None => {
                let reading = Reading::new(feeder_id, day, value, actor, at);
                readings.push(reading.clone());
                reading
            }
        }
    }

    /// Number of range scans served so far.
    pub fn range_scans(&self) -> usize {
        self.range_scans.load(Ordering::Relaxed)
    }

    /// Number of region and business hub listings served so far.
    pub fn hierarchy_scans(&self) -> usize {
        self.hierarchy_scans.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl FeederDirectory for InMemoryStore {
    async fn feeders(&self, query: &FeederQuery) -> Result<Vec<Feeder>> {
        Ok(self
            .feeders
            .iter()
            .filter(|f| query.matches(f))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl HierarchyDirectory for InMemoryStore {
    async fn regions(&self) -> Result<Vec<Region>> {
        self.hierarchy_scans.fetch_add(1, Ordering::Relaxed);
        Ok(self.regions.clone())
    }

    async fn business_hubs(&self) -> Result<Vec<BusinessHub>> {
        self.hierarchy_scans.fetch_add(1, Ordering::Relaxed);
        Ok(self.hubs.clone())
    }
}

#[async_trait::async_trait]
impl ReadingStore for InMemoryStore {
    async fn readings_in_range(&self, start: Date, end: Date) -> Result<Vec<Reading>> {
        self.range_scans.fetch_add(1, Ordering::Relaxed);
        let mut found: Vec<Reading> = self
            .readings
            .read()
            .iter()
            .filter(|r| r.reading_date >= start && r.reading_date <= end)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (&a.feeder_id, a.reading_date).cmp(&(&b.feeder_id, b.reading_date))
        });
        Ok(found)
    }

    async fn reading_on(&self, feeder_id: &str, day: Date) -> Result<Option<Reading>> {
        Ok(self
            .readings
            .read()
            .iter()
            .find(|r| r.feeder_id == feeder_id && r.reading_date == day)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{find_business_hub, find_region};
    use feeder_client::domain::{Band, FeederStatus};
    use time::macros::{date, datetime};

    fn seeded() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.add_region(Region {
            id: "r-1".into(),
            name: "Lagos West".into(),
        });
        store
            .add_business_hub(BusinessHub {
                id: "h-1".into(),
                name: "Ikeja".into(),
                region_id: "r-1".into(),
            })
            .unwrap();
        store
    }

    fn feeder(region_id: &str) -> Feeder {
        Feeder {
            id: "f-1".into(),
            name: "Allen".into(),
            business_hub_id: "h-1".into(),
            region_id: region_id.into(),
            band: Band::A,
            daily_energy_uptake: 100.0,
            monthly_delivery_plan: 3000.0,
            previous_month_consumption: 2900.0,
            status: FeederStatus::Active,
        }
    }

    #[test]
    fn feeder_in_wrong_region_is_rejected() {
        let mut store = seeded();
        store.add_region(Region {
            id: "r-2".into(),
            name: "Lagos East".into(),
        });
        assert!(store.add_feeder(feeder("r-2")).is_err());
        assert!(store.add_feeder(feeder("r-1")).is_ok());
    }

    #[test]
    fn duplicate_reading_for_same_day_is_rejected() {
        let store = seeded();
        let at = datetime!(2024-01-01 06:00:00 UTC);
        store
            .insert_reading(Reading::new("f-1", date!(2024 - 01 - 01), 10.0, "op", at))
            .unwrap();

        let res = store.insert_reading(Reading::new("f-1", date!(2024 - 01 - 01), 11.0, "op", at));
        assert!(matches!(res, Err(DomainError::DuplicateReading { .. })));
    }

    #[test]
    fn recording_twice_keeps_one_reading_with_history() {
        let store = seeded();
        let day = date!(2024 - 01 - 01);
        store.record_reading("f-1", day, 10.0, "a", datetime!(2024-01-01 06:00:00 UTC));
        let at = datetime!(2024-01-01 07:00:00 UTC);
        let updated = store.record_reading("f-1", day, 12.0, "b", at);

        assert_eq!(updated.cumulative_energy_consumption, 12.0);
        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.history[0].cumulative_energy_consumption, 10.0);
        assert_eq!(store.readings.read().len(), 1);
    }

    #[tokio::test]
    async fn hierarchy_lookup_is_case_insensitive() {
        let store = seeded();
        let regions = store.regions().await.unwrap();
        let hubs = store.business_hubs().await.unwrap();

        let region = find_region(&regions, "LAGOS west");
        let hub = find_business_hub(&hubs, " ikeja ");
        let missing = find_business_hub(&hubs, "Ikej");

        assert_eq!(region.map(|r| r.id.as_str()), Some("r-1"));
        assert_eq!(hub.map(|h| h.id.as_str()), Some("h-1"));
        assert!(missing.is_none());
        assert_eq!(store.hierarchy_scans(), 2);
    }
}
