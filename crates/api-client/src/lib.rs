//! # Exante Market Data Client
//!
//! Loads a dates x tickers price table from a remote market data source.
//! Tickers with no data at all are a hard failure; partially missing tickers
//! are kept, with their gaps counted and logged for the caller to clean.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::PriceMatrix;
use futures::future::join_all;

pub mod assemble;
pub mod error;
pub mod interval;
pub mod responses;
pub mod yahoo;

// --- Public API ---
pub use assemble::assemble_prices;
pub use error::ApiError;
pub use interval::Interval;
pub use yahoo::YahooClient;

/// One bar of a single ticker: timestamp and close (`None` when the source has a gap).
pub type Observation = (DateTime<Utc>, Option<f64>);

/// What to load: a universe, a date range (start inclusive, end exclusive),
/// a sampling interval, and whether closes are adjusted for dividends and splits.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
    pub adjusted: bool,
}

/// A loaded price table plus the number of cells still missing in it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPrices {
    pub prices: PriceMatrix,
    pub missing_cells: usize,
}

impl PriceRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.tickers.is_empty() {
            return Err(ApiError::InvalidRequest("no tickers requested".to_string()));
        }
        if self.tickers.iter().any(|t| t.trim().is_empty()) {
            return Err(ApiError::InvalidRequest("ticker symbols must not be blank".to_string()));
        }
        if self.start >= self.end {
            return Err(ApiError::InvalidRequest(format!(
                "start date {} must be before end date {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Requested tickers in order, without repeats.
    pub fn unique_tickers(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.tickers
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Start and end as Unix seconds at midnight UTC.
    pub fn period(&self) -> (i64, i64) {
        let to_unix = |d: NaiveDate| d.and_time(chrono::NaiveTime::default()).and_utc().timestamp();
        (to_unix(self.start), to_unix(self.end))
    }
}

/// The generic interface for a market data source.
///
/// Implementors only fetch one ticker's series; merging, the unresolved-ticker
/// failure and the missing-cell report are shared by `load_prices`.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches the close series of a single ticker. An unknown ticker yields an empty series.
    async fn fetch_series(
        &self,
        ticker: &str,
        request: &PriceRequest,
    ) -> Result<Vec<Observation>, ApiError>;

    /// Fetches every requested ticker concurrently and assembles the price table.
    async fn load_prices(&self, request: &PriceRequest) -> Result<LoadedPrices, ApiError> {
        request.validate()?;
        let tickers = request.unique_tickers();

        tracing::info!(
            tickers = tickers.len(),
            start = %request.start,
            end = %request.end,
            interval = %request.interval,
            adjusted = request.adjusted,
            "Loading prices."
        );

        let results = join_all(tickers.iter().map(|t| self.fetch_series(t, request))).await;

        let series = tickers
            .into_iter()
            .zip(results)
            .map(|(ticker, result)| result.map(|observations| (ticker, observations)))
            .collect::<Result<Vec<_>, ApiError>>()?;

        assemble_prices(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    /// Serves canned series from memory.
    struct MockProvider {
        series: HashMap<String, Vec<Observation>>,
    }

    #[async_trait]
    impl PriceProvider for MockProvider {
        async fn fetch_series(
            &self,
            ticker: &str,
            _request: &PriceRequest,
        ) -> Result<Vec<Observation>, ApiError> {
            Ok(self.series.get(ticker).cloned().unwrap_or_default())
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 0, 0, 0).unwrap()
    }

    fn request(tickers: &[&str]) -> PriceRequest {
        PriceRequest {
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            start: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            interval: Interval::Day1,
            adjusted: true,
        }
    }

    fn provider() -> MockProvider {
        let mut series = HashMap::new();
        series.insert(
            "SPY".to_string(),
            vec![(day(1), Some(520.0)), (day(2), Some(518.5)), (day(3), Some(519.2))],
        );
        series.insert("TLT".to_string(), vec![(day(1), Some(94.1)), (day(3), Some(93.4))]);
        MockProvider { series }
    }

    #[tokio::test]
    async fn loads_requested_tickers_in_order() {
        let loaded = provider().load_prices(&request(&["TLT", "SPY", "TLT"])).await.unwrap();

        assert_eq!(loaded.prices.columns(), &["TLT".to_string(), "SPY".to_string()]);
        assert_eq!(loaded.prices.n_rows(), 3);
        assert_eq!(loaded.missing_cells, 1);
        assert_eq!(loaded.prices.get(1, 0), None);
    }

    #[tokio::test]
    async fn unknown_tickers_fail_the_whole_load() {
        let err = provider()
            .load_prices(&request(&["SPY", "NOPE", "GONE"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnresolvedAssets(ref t) if t == &["NOPE", "GONE"]));
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected_before_fetching() {
        let mut req = request(&["SPY"]);
        req.end = req.start;
        assert!(matches!(
            provider().load_prices(&req).await,
            Err(ApiError::InvalidRequest(_))
        ));

        assert!(matches!(
            provider().load_prices(&request(&[])).await,
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn period_is_midnight_utc() {
        let (start, end) = request(&["SPY"]).period();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap().timestamp());
        assert_eq!(end - start, 29 * 86_400);
    }
}
