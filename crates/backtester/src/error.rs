use chrono::{DateTime, Utc};
use core_types::{CoreError, MatrixKind};
use std::fmt;
use thiserror::Error;

/// Coarse grouping of [`BacktestError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input topology is wrong (ordering, duplicates, alignment).
    Shape,
    /// Input values violate a domain constraint.
    Content,
    /// A derived quantity was requested before its prerequisite ran.
    Sequencing,
}

/// Which part of the shared coordinate system differs between prices and weights.
#[derive(Debug, Clone, PartialEq)]
pub enum Misalignment {
    IndexLength {
        prices: usize,
        weights: usize,
    },
    IndexValue {
        row: usize,
        prices: DateTime<Utc>,
        weights: DateTime<Utc>,
    },
    Columns {
        prices: Vec<String>,
        weights: Vec<String>,
    },
}

impl fmt::Display for Misalignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Misalignment::IndexLength { prices, weights } => write!(
                f,
                "index lengths differ (prices: {}, weights: {})",
                prices, weights
            ),
            Misalignment::IndexValue {
                row,
                prices,
                weights,
            } => write!(
                f,
                "indices differ at row {} (prices: {}, weights: {})",
                row, prices, weights
            ),
            Misalignment::Columns { prices, weights } => write!(
                f,
                "columns differ (prices: [{}], weights: [{}])",
                prices.join(", "),
                weights.join(", ")
            ),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("{matrix} index must be strictly increasing: {current} at row {row} follows {previous}")]
    IndexOrder {
        matrix: MatrixKind,
        row: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("{matrix} index must be unique: {date} is repeated at row {row}")]
    IndexUniqueness {
        matrix: MatrixKind,
        row: usize,
        date: DateTime<Utc>,
    },

    #[error("Prices and weights are misaligned: {0}")]
    Alignment(Misalignment),

    #[error("{matrix} contain a missing value at {date} for asset '{asset}'")]
    MissingValue {
        matrix: MatrixKind,
        date: DateTime<Utc>,
        asset: String,
    },

    #[error("Price of '{asset}' at {date} must be strictly positive (got {value})")]
    InvalidPrice {
        date: DateTime<Utc>,
        asset: String,
        value: f64,
    },

    #[error("Weight of '{asset}' at {date} must be {requirement} (got {value})")]
    InvalidWeight {
        date: DateTime<Utc>,
        asset: String,
        value: f64,
        requirement: &'static str,
    },

    #[error("Net exposure {exposure} at {date} exceeds the limit of {limit} (no leverage allowed)")]
    ExposureLimit {
        date: DateTime<Utc>,
        exposure: f64,
        limit: f64,
    },

    #[error("Weights at {date} sum to {exposure}; a fully invested portfolio must sum to 1 within {tolerance}")]
    Normalization {
        date: DateTime<Utc>,
        exposure: f64,
        tolerance: f64,
    },

    #[error("Exposure tolerance must be finite and non-negative (got {0})")]
    InvalidTolerance(f64),

    #[error("Contributions not computed yet: call run() before reading portfolio returns")]
    EngineState,

    #[error("Frame construction error: {0}")]
    Frame(#[from] CoreError),
}

impl BacktestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BacktestError::IndexOrder { .. }
            | BacktestError::IndexUniqueness { .. }
            | BacktestError::Alignment(_)
            | BacktestError::Frame(_) => ErrorCategory::Shape,
            BacktestError::MissingValue { .. }
            | BacktestError::InvalidPrice { .. }
            | BacktestError::InvalidWeight { .. }
            | BacktestError::ExposureLimit { .. }
            | BacktestError::Normalization { .. }
            | BacktestError::InvalidTolerance(_) => ErrorCategory::Content,
            BacktestError::EngineState => ErrorCategory::Sequencing,
        }
    }
}
