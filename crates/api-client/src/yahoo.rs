use crate::error::ApiError;
use crate::responses::ChartResponse;
use crate::{Observation, PriceProvider, PriceRequest};
use async_trait::async_trait;
use configuration::ProviderSettings;
use std::time::Duration;

const USER_AGENT: &str = concat!("exante/", env!("CARGO_PKG_VERSION"));

/// A concrete implementation of the `PriceProvider` backed by the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceProvider for YahooClient {
    async fn fetch_series(
        &self,
        ticker: &str,
        request: &PriceRequest,
    ) -> Result<Vec<Observation>, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let (period1, period2) = request.period();

        tracing::debug!(%ticker, %url, "Requesting chart data.");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", request.interval.to_string()),
                ("events", "div,splits".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let chart = match serde_json::from_str::<ChartResponse>(&text) {
            Ok(chart) => chart,
            Err(e) if status.is_success() => {
                return Err(ApiError::Deserialization(e.to_string()));
            }
            Err(_) => {
                return Err(ApiError::Http {
                    ticker: ticker.to_string(),
                    status: status.as_u16(),
                    body: text,
                });
            }
        };

        if let Some(error) = &chart.chart.error {
            tracing::warn!(%ticker, code = %error.code, description = %error.description, "No chart data for ticker.");
        }

        match chart.into_result() {
            Some(result) => result.observations(request.adjusted, !request.interval.is_intraday()),
            None => Ok(Vec::new()),
        }
    }
}
