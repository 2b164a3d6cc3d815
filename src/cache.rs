pub mod eviction;

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::NaiveDateTime;
use dashmap::DashMap;

use crate::{
    core::{area::AreaCode, window::QueryWindow},
    prelude::*,
};

/// Cache partitions with separate eviction schedules.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, derive_more::Display)]
pub enum Partition {
    /// The window reaches past the current moment, so the data may still change.
    #[display("day-ahead")]
    DayAhead,

    #[display("history")]
    History,
}

impl Partition {
    /// Partition of the window as of `now` in the reference zone.
    pub fn of(window: &QueryWindow, now: NaiveDateTime) -> Self {
        if window.end > now { Self::DayAhead } else { Self::History }
    }
}

/// Bodies are shared across credentials.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    pub area: AreaCode,
    pub window: QueryWindow,
}

/// In-memory memo of raw provider bodies.
#[derive(Default)]
pub struct ResponseCache {
    day_ahead: DashMap<CacheKey, Arc<str>>,
    history: DashMap<CacheKey, Arc<str>>,
    n_hits: AtomicU64,
    n_misses: AtomicU64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CacheStats {
    pub n_hits: u64,
    pub n_misses: u64,
    pub n_day_ahead: usize,
    pub n_history: usize,
}

impl ResponseCache {
    const fn partition(&self, partition: Partition) -> &DashMap<CacheKey, Arc<str>> {
        match partition {
            Partition::DayAhead => &self.day_ahead,
            Partition::History => &self.history,
        }
    }

    pub fn get(&self, partition: Partition, key: &CacheKey) -> Option<Arc<str>> {
        let body = self.partition(partition).get(key).map(|entry| Arc::clone(entry.value()));
        if body.is_some() {
            self.n_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.n_misses.fetch_add(1, Ordering::Relaxed);
        }
        body
    }

    pub fn put(&self, partition: Partition, key: CacheKey, body: Arc<str>) {
        self.partition(partition).insert(key, body);
    }

    /// Clear the partition and return the number of evicted entries.
    #[instrument(skip_all, fields(partition = %partition))]
    pub fn evict(&self, partition: Partition) -> usize {
        let partition = self.partition(partition);
        let n_entries = partition.len();
        partition.clear();
        info!(n_entries, "evicted");
        n_entries
    }

    pub fn evict_all(&self) -> usize {
        self.evict(Partition::DayAhead) + self.evict(Partition::History)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            n_hits: self.n_hits.load(Ordering::Relaxed),
            n_misses: self.n_misses.load(Ordering::Relaxed),
            n_day_ahead: self.day_ahead.len(),
            n_history: self.history.len(),
        }
    }
}
