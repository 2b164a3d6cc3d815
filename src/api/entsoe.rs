pub mod response;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::{
    api::client,
    core::{
        area::AreaCode,
        error::{PriceError, UpstreamError},
        window::QueryWindow,
    },
    prelude::*,
};

pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu/api";

/// Day-ahead prices.
const DOCUMENT_TYPE: &str = "A44";

const TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream price provider.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the raw day-ahead price document of the area for the window.
    async fn fetch(
        &self,
        credential: &str,
        area: AreaCode,
        window: &QueryWindow,
    ) -> Result<String, PriceError>;
}

pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    pub fn new(base_url: Url) -> Result<Self> {
        Ok(Self { client: client::try_new(TIMEOUT)?, base_url })
    }
}

#[async_trait]
impl Fetch for Api {
    #[instrument(skip_all, fields(area = %area, window = %window))]
    async fn fetch(
        &self,
        credential: &str,
        area: AreaCode,
        window: &QueryWindow,
    ) -> Result<String, PriceError> {
        info!("fetching…");
        let period_start = window.period_start();
        let period_end = window.period_end();
        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[
                ("documentType", DOCUMENT_TYPE),
                ("securityToken", credential),
                ("in_Domain", area.domain_code()),
                ("out_Domain", area.domain_code()),
                ("periodStart", period_start.as_str()),
                ("periodEnd", period_end.as_str()),
            ])
            .send()
            .await
            .map_err(UpstreamError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(UpstreamError::from)?;
        if !status.is_success() {
            warn!(%status, "the provider rejected the request");
            return Err(UpstreamError::Status { status, body }.into());
        }
        if body.trim().is_empty() {
            return Err(UpstreamError::EmptyBody.into());
        }
        debug!(n_bytes = body.len(), "fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use httpmock::prelude::*;

    use super::*;

    fn window() -> QueryWindow {
        QueryWindow::between(
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_fetch_ok() -> Result {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api")
                    .query_param("documentType", "A44")
                    .query_param("securityToken", "secret")
                    .query_param("in_Domain", "10YDK-1--------W")
                    .query_param("out_Domain", "10YDK-1--------W")
                    .query_param("periodStart", "202112312300")
                    .query_param("periodEnd", "202212312300");
                then.status(200)
                    .header("content-type", "text/xml")
                    .body("<Publication_MarketDocument/>");
            })
            .await;

        let api = Api::new(server.url("/api").parse()?)?;
        let body = api.fetch("secret", AreaCode::Dk1, &window()).await?;
        assert_eq!(body, "<Publication_MarketDocument/>");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_status_error() -> Result {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api");
                then.status(401).body("Unauthorized");
            })
            .await;

        let api = Api::new(server.url("/api").parse()?)?;
        let result = api.fetch("wrong", AreaCode::Fr, &window()).await;
        assert!(matches!(
            result,
            Err(PriceError::Upstream(UpstreamError::Status { status, .. })) if status.as_u16() == 401,
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_empty_body_error() -> Result {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api");
                then.status(200);
            })
            .await;

        let api = Api::new(server.url("/api").parse()?)?;
        let result = api.fetch("secret", AreaCode::Fr, &window()).await;
        assert!(matches!(result, Err(PriceError::Upstream(UpstreamError::EmptyBody))));
        Ok(())
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() -> Result {
        // Nothing listens on the discard port.
        let api = Api::new("http://127.0.0.1:9/api".parse()?)?;
        let error = api.fetch("secret", AreaCode::Fr, &window()).await.unwrap_err();
        assert!(matches!(error, PriceError::Upstream(UpstreamError::Transport(_))));
        assert!(!format!("{error:?}").contains("secret"));
        Ok(())
    }
}
