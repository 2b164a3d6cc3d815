use std::{future::Future, sync::Arc, time::Duration};

use bon::Builder;
use chrono::NaiveTime;
use clap::Parser;
use reqwest::Url;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    api::{
        entsoe::{self, Fetch},
        heartbeat,
    },
    cache::{Partition, ResponseCache, eviction::EvictionSchedule},
    cli::query::{AreaArgs, SelectorArgs},
    core::{
        clock,
        error::StatusClass,
        selector::{IntervalUnit, RawSelector},
    },
    prelude::*,
    service::PriceService,
    tables::{build_cache_table, build_prices_table},
};

#[derive(Parser)]
pub struct WatchArgs {
    #[clap(flatten)]
    area: AreaArgs,

    #[clap(long, env = "WATCH_POLLING_INTERVAL", default_value = "15min")]
    polling_interval: humantime::Duration,

    /// Local time in Europe/Copenhagen, shortly after the provider publishes the day-ahead prices.
    #[clap(long, env = "DAY_AHEAD_EVICTION_TIME", default_value = "13:05:00")]
    day_ahead_eviction_time: NaiveTime,

    /// Local time in Europe/Copenhagen, at the provider day boundary.
    #[clap(long, env = "HISTORY_EVICTION_TIME", default_value = "23:00:00")]
    history_eviction_time: NaiveTime,

    #[clap(long = "heartbeat-url", env = "WATCH_HEARTBEAT_URL")]
    heartbeat_url: Option<Url>,
}

impl WatchArgs {
    pub async fn run(self, api_url: Url) -> Result {
        let cache = Arc::new(ResponseCache::default());

        let _day_ahead_eviction = EvictionSchedule::builder()
            .cache(Arc::clone(&cache))
            .partition(Partition::DayAhead)
            .at(self.day_ahead_eviction_time)
            .build()
            .spawn();
        let _history_eviction = EvictionSchedule::builder()
            .cache(Arc::clone(&cache))
            .partition(Partition::History)
            .at(self.history_eviction_time)
            .build()
            .spawn();

        let selector = RawSelector {
            interval_unit: Some(IntervalUnit::Day),
            interval: Some(-1),
            ..self.area.to_raw(&SelectorArgs::default(), clock::now().date_naive())
        };
        let service =
            PriceService::builder().fetcher(entsoe::Api::new(api_url)?).cache(cache).build();

        Watcher::builder()
            .service(service)
            .selector(selector)
            .heartbeat(heartbeat::Client::new(self.heartbeat_url)?)
            .interval(self.polling_interval)
            .build()
            .run(shutdown_signal())
            .await
    }
}

#[derive(Builder)]
struct Watcher<F> {
    service: PriceService<F>,
    selector: RawSelector,
    heartbeat: heartbeat::Client,

    #[builder(into)]
    interval: Duration,
}

impl<F: Fetch> Watcher<F> {
    /// Poll until the shutdown future resolves, then flush the cache.
    async fn run(self, shutdown: impl Future<Output = Result>) -> Result {
        let mut interval = interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => self.poll().await?,
                result = &mut shutdown => {
                    result?;
                    break;
                }
            }
        }

        let n_entries = self.service.cache().evict_all();
        info!(n_entries, "flushed the cache, shutting down…");
        Ok(())
    }

    /// Only validation errors stop the loop, the rest is retried on the next tick.
    #[instrument(skip_all)]
    async fn poll(&self) -> Result {
        match self.service.query(&self.selector, clock::now()).await {
            Ok(document) => {
                info!(n_points = document.n_points(), mean_price = ?document.mean_price(), "polled");
                println!("{}", build_prices_table(&document));
                self.heartbeat.send().await;
            }
            Err(error) => match error.status() {
                StatusClass::BadRequest => return Err(Error::new(error)),
                StatusClass::NoContent => info!("not published yet: {error}"),
                StatusClass::Internal => warn!("failed to poll: {:#}", Error::new(error)),
            },
        }
        println!("{}", build_cache_table(self.service.cache().stats()));
        Ok(())
    }
}

/// Per <https://github.com/tokio-rs/axum/blob/main/examples/graceful-shutdown/src/main.rs>.
async fn shutdown_signal() -> Result {
    let ctrl_c = async { tokio::signal::ctrl_c().await.context("failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("failed to install signal handler")?
            .recv()
            .await;
        Ok::<_, Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}
