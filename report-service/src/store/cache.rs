use std::{collections::VecDeque, sync::Arc};

use anyhow::Result;
use feeder_client::domain::Reading;
use parking_lot::Mutex;
use time::{Date, Duration, OffsetDateTime};

use super::ReadingStore;
use crate::clock::Clock;

type RangeKey = (Date, Date);

struct CacheEntry {
    key: RangeKey,
    stored_at: OffsetDateTime,
    readings: Arc<Vec<Reading>>,
}

/// Short-lived cache of reading range scans, keyed by the exact
/// `(start, end)` pair.
///
/// Holds at most `capacity` ranges; inserting a new key evicts the oldest
/// ones, so with the default capacity of 1 every insert clears prior entries.
pub struct ReadingRangeCache {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    entries: Mutex<VecDeque<CacheEntry>>,
}

impl ReadingRangeCache {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            clock,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn get(&self, start: Date, end: Date) -> Option<Arc<Vec<Reading>>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        entries.retain(|e| now - e.stored_at < self.ttl);

        entries
            .iter()
            .find(|e| e.key == (start, end))
            .map(|e| Arc::clone(&e.readings))
    }

    pub fn insert(&self, start: Date, end: Date, readings: Arc<Vec<Reading>>) {
        let key = (start, end);
        let mut entries = self.entries.lock();
        entries.retain(|e| e.key != key);
        entries.push_back(CacheEntry {
            key,
            stored_at: self.clock.now(),
            readings,
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reading access for one report invocation: range scans go through the
/// shared cache, exact-day lookups go straight to the store.
pub struct CachedReadings<'a> {
    store: &'a dyn ReadingStore,
    cache: &'a ReadingRangeCache,
}

impl<'a> CachedReadings<'a> {
    pub fn new(store: &'a dyn ReadingStore, cache: &'a ReadingRangeCache) -> Self {
        Self { store, cache }
    }

    pub async fn range(&self, start: Date, end: Date) -> Result<Arc<Vec<Reading>>> {
        if let Some(hit) = self.cache.get(start, end) {
            metrics::counter!("reading_cache_hits_total").increment(1);
            tracing::debug!(%start, %end, readings = hit.len(), "reading range served from cache");
            return Ok(hit);
        }

        metrics::counter!("reading_cache_misses_total").increment(1);
        let readings = Arc::new(self.store.readings_in_range(start, end).await?);
        self.cache.insert(start, end, Arc::clone(&readings));
        tracing::debug!(%start, %end, readings = readings.len(), "reading range fetched");

        Ok(readings)
    }

    pub async fn on(&self, feeder_id: &str, day: Date) -> Result<Option<Reading>> {
        self.store.reading_on(feeder_id, day).await
    }
}
