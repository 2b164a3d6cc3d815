use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{
    api::entsoe::{
        Fetch,
        response::{PUBLICATION_ROOT, root_name},
    },
    cache::{CacheKey, Partition, ResponseCache},
    core::{
        document::{PriceDocument, assemble},
        error::{PriceError, ValidationErrors},
        selector::{RawSelector, ValidatedQuery},
        window::QueryWindow,
    },
    prelude::*,
};

/// Selector in, price document out.
#[derive(Builder)]
pub struct PriceService<F> {
    fetcher: F,

    #[builder(default)]
    cache: Arc<ResponseCache>,
}

impl<F: Fetch> PriceService<F> {
    pub const fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Validate the raw selector and answer the query.
    pub async fn query(
        &self,
        selector: &RawSelector,
        now: DateTime<Tz>,
    ) -> Result<PriceDocument, PriceError> {
        let query = selector.validate(now.date_naive())?;
        self.get_prices(&query, now).await
    }

    /// Answer the validated query, `now` is in the reference zone.
    #[instrument(skip_all, fields(area = %query.area))]
    pub async fn get_prices(
        &self,
        query: &ValidatedQuery,
        now: DateTime<Tz>,
    ) -> Result<PriceDocument, PriceError> {
        let window = resolve(query, now)?;
        let body = self.fetch_cached(query, window, now).await?;
        assemble(&body, query.area, now.with_timezone(&Utc))
    }

    #[instrument(skip_all, fields(window = %window))]
    async fn fetch_cached(
        &self,
        query: &ValidatedQuery,
        window: QueryWindow,
        now: DateTime<Tz>,
    ) -> Result<Arc<str>, PriceError> {
        let key = CacheKey { area: query.area, window };
        let partition = Partition::of(&window, now.naive_local());
        if let Some(body) = self.cache.get(partition, &key) {
            debug!(%partition, "cache hit");
            return Ok(body);
        }
        let body: Arc<str> = self.fetcher.fetch(&query.credential, query.area, &window).await?.into();
        // Acknowledgements mean "not published yet" and must be re-fetched on the next query.
        if root_name(&body).is_ok_and(|root| root == PUBLICATION_ROOT) {
            self.cache.put(partition, key, Arc::clone(&body));
            debug!(%partition, "cached");
        } else {
            debug!(%partition, "not caching a document without prices");
        }
        Ok(body)
    }
}

/// Resolve the query window as of `now`.
pub fn resolve(query: &ValidatedQuery, now: DateTime<Tz>) -> Result<QueryWindow, PriceError> {
    query
        .selector
        .resolve(now.date_naive())
        .ok_or_else(|| ValidationErrors::single("selector", "The selected period does not exist.").into())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::core::{
        area::AreaCode,
        clock::REFERENCE_ZONE,
        error::{StatusClass, UpstreamError},
    };

    // language=xml
    const BODY: &str = r"
        <Publication_MarketDocument>
            <period.timeInterval>
                <start>2021-12-31T23:00Z</start>
                <end>2022-12-31T23:00Z</end>
            </period.timeInterval>
            <TimeSeries>
                <currency_Unit.name>EUR</currency_Unit.name>
                <price_Measure_Unit.name>MWH</price_Measure_Unit.name>
                <Period>
                    <timeInterval>
                        <start>2021-12-31T23:00Z</start>
                        <end>2022-01-01T23:00Z</end>
                    </timeInterval>
                    <resolution>PT60M</resolution>
                    <Point>
                        <position>1</position>
                        <price.amount>50.05</price.amount>
                    </Point>
                </Period>
            </TimeSeries>
        </Publication_MarketDocument>";

    // language=xml
    const ACKNOWLEDGEMENT: &str = r"
        <Acknowledgement_MarketDocument>
            <Reason>
                <code>999</code>
                <text>No matching data found</text>
            </Reason>
        </Acknowledgement_MarketDocument>";

    /// Counts the calls and remembers the requested windows.
    #[derive(Default)]
    struct CountingFetcher {
        n_calls: AtomicUsize,
        windows: Mutex<Vec<QueryWindow>>,
        fail: bool,

        /// Answer with an acknowledgement until this many calls have been made.
        n_unpublished: usize,
    }

    #[async_trait]
    impl Fetch for CountingFetcher {
        async fn fetch(
            &self,
            _credential: &str,
            _area: AreaCode,
            window: &QueryWindow,
        ) -> Result<String, PriceError> {
            let n_calls = self.n_calls.fetch_add(1, Ordering::SeqCst);
            self.windows.lock().unwrap().push(*window);
            if self.fail {
                Err(UpstreamError::EmptyBody.into())
            } else if n_calls < self.n_unpublished {
                Ok(ACKNOWLEDGEMENT.to_owned())
            } else {
                Ok(BODY.to_owned())
            }
        }
    }

    fn now() -> DateTime<Tz> {
        REFERENCE_ZONE.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
    }

    fn service(fail: bool) -> PriceService<CountingFetcher> {
        PriceService::builder().fetcher(CountingFetcher { fail, ..Default::default() }).build()
    }

    #[tokio::test]
    async fn test_equivalent_selectors_share_cache_entry() -> Result {
        let service = service(false);

        let by_year = RawSelector::builder().area("dk1").credential("first").year(2022).build();
        let by_range = RawSelector::builder()
            .area("DK1")
            .credential("second")
            .from("20211231")
            .to("20221231")
            .build();

        let first = service.query(&by_year, now()).await?;
        let second = service.query(&by_range, now()).await?;

        assert_eq!(service.fetcher.n_calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.periods[0].points, second.periods[0].points);
        assert_eq!(service.cache().stats().n_history, 1);
        assert_eq!(
            service.fetcher.windows.lock().unwrap()[0].to_string(),
            "202112312300..202212312300",
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_day_ahead_goes_to_day_ahead_partition() -> Result {
        let service = service(false);
        let selector = RawSelector::builder()
            .area("FR")
            .credential("token")
            .interval_unit(crate::core::selector::IntervalUnit::Day)
            .interval(-1)
            .build();
        service.query(&selector, now()).await?;
        let stats = service.cache().stats();
        assert_eq!(stats.n_day_ahead, 1);
        assert_eq!(stats.n_history, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_acknowledgement_is_not_cached() -> Result {
        let service = PriceService::builder()
            .fetcher(CountingFetcher { n_unpublished: 1, ..Default::default() })
            .build();
        let selector = RawSelector::builder()
            .area("DK1")
            .credential("token")
            .interval_unit(crate::core::selector::IntervalUnit::Day)
            .interval(-1)
            .build();

        let before_publication = REFERENCE_ZONE.with_ymd_and_hms(2026, 10, 16, 13, 6, 0).unwrap();
        let error = service.query(&selector, before_publication).await.unwrap_err();
        assert_eq!(error.status(), StatusClass::NoContent);
        assert_eq!(service.cache().stats().n_day_ahead, 0);

        let after_publication = REFERENCE_ZONE.with_ymd_and_hms(2026, 10, 16, 18, 0, 0).unwrap();
        let document = service.query(&selector, after_publication).await?;
        assert_eq!(document.n_points(), 1);
        assert_eq!(service.fetcher.n_calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.cache().stats().n_day_ahead, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_error_skips_fetch() {
        let service = service(false);
        let selector = RawSelector::builder().area("XX").credential("token").build();
        let error = service.query(&selector, now()).await.unwrap_err();
        assert_eq!(error.status(), StatusClass::BadRequest);
        assert_eq!(service.fetcher.n_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let service = service(true);
        let selector = RawSelector::builder().area("SE3").credential("token").year(2022).build();
        for _ in 0..2 {
            let error = service.query(&selector, now()).await.unwrap_err();
            assert_eq!(error.status(), StatusClass::Internal);
        }
        assert_eq!(service.fetcher.n_calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.cache().stats().n_history, 0);
    }
}
