use crate::error::ApiError;
use crate::Observation;
use chrono::{DateTime, Utc};
use serde::Deserialize;

// Field names mirror the chart API's JSON; everything optional defaults to empty.

/// Body of `GET /v8/finance/chart/{ticker}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

/// Error object returned for unknown or delisted symbols.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: String,
    /// Exchange offset from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartResponse {
    /// The first result, if the symbol resolved at all.
    pub fn into_result(self) -> Option<ChartResult> {
        self.chart.result.and_then(|results| results.into_iter().next())
    }
}

impl ChartResult {
    /// Pairs each bar's timestamp with its close.
    ///
    /// With `adjusted`, the dividend/split adjusted close is used when the API
    /// provides one. With `by_date`, timestamps are moved to midnight UTC of the
    /// exchange-local trading date so that tickers from different exchanges
    /// share one index.
    pub fn observations(&self, adjusted: bool, by_date: bool) -> Result<Vec<Observation>, ApiError> {
        let adjusted_closes = self.indicators.adjclose.first().map(|a| &a.adjclose);
        let closes = match (adjusted, adjusted_closes) {
            (true, Some(adj)) => adj,
            (true, None) => {
                tracing::debug!(symbol = %self.meta.symbol, "No adjusted close available, using raw close.");
                self.raw_closes()?
            }
            (false, _) => self.raw_closes()?,
        };

        if closes.len() != self.timestamp.len() {
            return Err(ApiError::InvalidData(format!(
                "{}: {} timestamps but {} closes",
                self.meta.symbol,
                self.timestamp.len(),
                closes.len()
            )));
        }

        self.timestamp
            .iter()
            .zip(closes)
            .map(|(&ts, &close)| {
                let at = if by_date {
                    local_date_at_midnight(ts, self.meta.gmtoffset)
                } else {
                    DateTime::from_timestamp(ts, 0)
                };
                let at = at.ok_or_else(|| {
                    ApiError::InvalidData(format!("Invalid timestamp: {}", ts))
                })?;
                Ok((at, close))
            })
            .collect()
    }

    fn raw_closes(&self) -> Result<&Vec<Option<f64>>, ApiError> {
        self.indicators
            .quote
            .first()
            .map(|q| &q.close)
            .ok_or_else(|| {
                ApiError::InvalidData(format!("{}: response has no quote block", self.meta.symbol))
            })
    }
}

fn local_date_at_midnight(ts: i64, gmtoffset: i64) -> Option<DateTime<Utc>> {
    let local = DateTime::from_timestamp(ts.checked_add(gmtoffset)?, 0)?;
    Some(local.date_naive().and_hms_opt(0, 0, 0)?.and_utc())
}
