use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;
use tokio::{task::JoinHandle, time::sleep};

use crate::{
    cache::{Partition, ResponseCache},
    core::clock::{self, REFERENCE_ZONE},
    prelude::*,
};

/// Daily eviction of one cache partition at the local wall-clock time in the reference zone.
#[derive(Builder)]
pub struct EvictionSchedule {
    cache: Arc<ResponseCache>,
    partition: Partition,
    at: NaiveTime,
}

impl EvictionSchedule {
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    #[instrument(skip_all, fields(partition = %self.partition, at = %self.at))]
    async fn run(self) {
        loop {
            let now = clock::now();
            let Some(next) = next_occurrence(now, self.at) else {
                error!("could not find the next eviction time, stopping");
                return;
            };
            info!(%next, "scheduled the next eviction");
            sleep((next - now).to_std().unwrap_or_default()).await;
            self.cache.evict(self.partition);
        }
    }
}

/// Next moment strictly after `now` when the local clock shows `at`.
///
/// Non-existent local times are skipped to the next day, ambiguous ones resolve to the earliest.
pub fn next_occurrence(now: DateTime<Tz>, at: NaiveTime) -> Option<DateTime<Tz>> {
    let mut date = now.date_naive();
    for _ in 0..3 {
        if let Some(candidate) = date.and_time(at).and_local_timezone(REFERENCE_ZONE).earliest()
            && candidate > now
        {
            return Some(candidate);
        }
        date = date.succ_opt()?;
    }
    None
}
