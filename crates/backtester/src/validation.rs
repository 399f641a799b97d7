//! Invariant checks for price and weight matrices.
//!
//! Each check is pure and returns the first violation it finds, named and
//! located by matrix, row, date and asset. Checks never repair their input.

use crate::error::{BacktestError, Misalignment};
use core_types::{Frame, MatrixKind, PriceMatrix, WeightMatrix};

/// The index must never decrease, and must not repeat a timestamp.
///
/// Ordering is scanned first, so an index that is both out of order and
/// duplicated reports `IndexOrder`.
pub fn check_index_clean(frame: &Frame, matrix: MatrixKind) -> Result<(), BacktestError> {
    let index = frame.index();

    for (i, pair) in index.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(BacktestError::IndexOrder {
                matrix,
                row: i + 1,
                previous: pair[0],
                current: pair[1],
            });
        }
    }

    // Sorted at this point, so any duplicate sits next to its twin.
    for (i, pair) in index.windows(2).enumerate() {
        if pair[1] == pair[0] {
            return Err(BacktestError::IndexUniqueness {
                matrix,
                row: i + 1,
                date: pair[1],
            });
        }
    }

    Ok(())
}

/// Every cell must hold a number. NaN counts as missing.
pub fn check_no_missing(frame: &Frame, matrix: MatrixKind) -> Result<(), BacktestError> {
    match find_cell(frame, |cell| cell.is_none_or(f64::is_nan)) {
        Some((row, col, _)) => Err(BacktestError::MissingValue {
            matrix,
            date: frame.date(row),
            asset: frame.columns()[col].clone(),
        }),
        None => Ok(()),
    }
}

/// Prices must be finite and strictly positive; zero is invalid.
pub fn check_positive(prices: &PriceMatrix) -> Result<(), BacktestError> {
    match find_value(prices, |v| !(v.is_finite() && v > 0.0)) {
        Some((row, col, value)) => Err(BacktestError::InvalidPrice {
            date: prices.date(row),
            asset: prices.columns()[col].clone(),
            value,
        }),
        None => Ok(()),
    }
}

/// Weights may be zero (cash) but never negative.
pub fn check_nonnegative(weights: &WeightMatrix) -> Result<(), BacktestError> {
    match find_value(weights, |v| v < 0.0) {
        Some((row, col, value)) => Err(BacktestError::InvalidWeight {
            date: weights.date(row),
            asset: weights.columns()[col].clone(),
            value,
            requirement: "non-negative",
        }),
        None => Ok(()),
    }
}

/// Weights must be strictly positive. Used by the fully invested policy.
pub fn check_strictly_positive_weights(weights: &WeightMatrix) -> Result<(), BacktestError> {
    match find_value(weights, |v| v <= 0.0) {
        Some((row, col, value)) => Err(BacktestError::InvalidWeight {
            date: weights.date(row),
            asset: weights.columns()[col].clone(),
            value,
            requirement: "strictly positive",
        }),
        None => Ok(()),
    }
}

/// Net exposure on any date may not exceed `1 + tolerance`.
pub fn check_exposure(weights: &WeightMatrix, tolerance: f64) -> Result<(), BacktestError> {
    let limit = 1.0 + tolerance;
    for (row, exposure) in weights.row_sums().into_iter().enumerate() {
        if exposure > limit {
            return Err(BacktestError::ExposureLimit {
                date: weights.date(row),
                exposure,
                limit,
            });
        }
    }
    Ok(())
}

/// Net exposure on every date must equal 1 within `tolerance`.
pub fn check_fully_invested(weights: &WeightMatrix, tolerance: f64) -> Result<(), BacktestError> {
    for (row, exposure) in weights.row_sums().into_iter().enumerate() {
        if (exposure - 1.0).abs() > tolerance {
            return Err(BacktestError::Normalization {
                date: weights.date(row),
                exposure,
                tolerance,
            });
        }
    }
    Ok(())
}

/// Both matrices must share the same dates in the same order and the same
/// assets in the same order.
pub fn check_alignment(prices: &PriceMatrix, weights: &WeightMatrix) -> Result<(), BacktestError> {
    if prices.n_rows() != weights.n_rows() {
        return Err(BacktestError::Alignment(Misalignment::IndexLength {
            prices: prices.n_rows(),
            weights: weights.n_rows(),
        }));
    }

    if let Some(row) = prices
        .index()
        .iter()
        .zip(weights.index())
        .position(|(p, w)| p != w)
    {
        return Err(BacktestError::Alignment(Misalignment::IndexValue {
            row,
            prices: prices.date(row),
            weights: weights.date(row),
        }));
    }

    if prices.columns() != weights.columns() {
        return Err(BacktestError::Alignment(Misalignment::Columns {
            prices: prices.columns().to_vec(),
            weights: weights.columns().to_vec(),
        }));
    }

    Ok(())
}

/// First cell (row-major) matching `predicate`.
fn find_cell<F>(frame: &Frame, predicate: F) -> Option<(usize, usize, Option<f64>)>
where
    F: Fn(Option<f64>) -> bool,
{
    (0..frame.n_rows()).find_map(|row| {
        frame
            .row(row)
            .iter()
            .position(|cell| predicate(*cell))
            .map(|col| (row, col, frame.row(row)[col]))
    })
}

/// First present value (row-major) matching `predicate`. Missing cells are skipped.
fn find_value<F>(frame: &Frame, predicate: F) -> Option<(usize, usize, f64)>
where
    F: Fn(f64) -> bool,
{
    find_cell(frame, |cell| cell.is_some_and(&predicate))
        .and_then(|(row, col, cell)| cell.map(|v| (row, col, v)))
}
