use crate::error::ConfigError;
use core_types::WeightPolicy;
use serde::Deserialize;
use std::path::PathBuf;

/// Numerical slack allowed when comparing a row's net exposure against 1.
pub const DEFAULT_EXPOSURE_TOLERANCE: f64 = 1e-6;

/// The root configuration structure for the entire application.
/// Every section is optional in `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSettings,
    pub provider: ProviderSettings,
    pub logging: LoggingSettings,
}

/// Contains parameters for the validation-and-execution engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Which constraint every weight row must satisfy.
    pub weight_policy: WeightPolicy,
    /// Tolerance applied to the row-sum comparison against 1.
    pub exposure_tolerance: f64,
}

/// Contains parameters for the remote market data source.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the chart API (e.g., "https://query1.finance.yahoo.com").
    pub base_url: String,
    /// Default sampling interval (e.g., "1d", "1wk").
    pub interval: String,
    /// If true, prices are adjusted for dividends and splits.
    pub adjusted: bool,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weight_policy: WeightPolicy::default(),
            exposure_tolerance: DEFAULT_EXPOSURE_TOLERANCE,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            interval: "1d".to_string(),
            adjusted: true,
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "exante.log".to_string(),
        }
    }
}

impl Config {
    /// Rejects values that deserialize fine but make no sense at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tol = self.engine.exposure_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "engine.exposure_tolerance must be a finite, non-negative number (got {})",
                tol
            )));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.base_url must not be empty".to_string(),
            ));
        }
        if self.provider.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
