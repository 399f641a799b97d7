use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Traded price of each asset on each date.
pub type PriceMatrix = Frame;
/// Fraction of capital allocated to each asset, decided as of each date.
pub type WeightMatrix = Frame;
/// Per-asset contribution to portfolio return. Always fully populated.
pub type ContributionMatrix = Frame;

/// A two-dimensional table of `f64` cells keyed by an ordered timestamp index
/// (rows) and an ordered list of asset identifiers (columns).
///
/// Cells are stored row-major. `None` marks a missing value. The constructor
/// only guarantees a rectangular shape; it does not sort the index, reject
/// duplicates or inspect values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SplitFrame", into = "SplitFrame")]
pub struct Frame {
    index: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    cells: Vec<Option<f64>>,
}

/// On-disk layout, matching the "split" orientation:
/// `{"index": [...], "columns": [...], "data": [[...], ...]}`.
#[derive(Serialize, Deserialize)]
struct SplitFrame {
    index: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    data: Vec<Vec<Option<f64>>>,
}

impl Frame {
    /// Builds a frame from one row of optional cells per index entry.
    pub fn new(
        index: Vec<DateTime<Utc>>,
        columns: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, CoreError> {
        if rows.len() != index.len() {
            return Err(CoreError::Shape(format!(
                "index has {} entries but {} rows were supplied",
                index.len(),
                rows.len()
            )));
        }

        let width = columns.len();
        let mut cells = Vec::with_capacity(index.len() * width);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(CoreError::Shape(format!(
                    "row {} has {} cells but there are {} columns",
                    i,
                    row.len(),
                    width
                )));
            }
            cells.extend(row);
        }

        Ok(Self {
            index,
            columns,
            cells,
        })
    }

    /// Builds a fully populated frame.
    pub fn from_values(
        index: Vec<DateTime<Utc>>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, CoreError> {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect();
        Self::new(index, columns, rows)
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Timestamp of the given row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn date(&self, row: usize) -> DateTime<Utc> {
        self.index[row]
    }

    /// Returns the cell at (`row`, `col`), or `None` when it is missing or out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.n_rows() || col >= self.n_cols() {
            return None;
        }
        self.cells[row * self.n_cols() + col]
    }

    /// The cells of one row, in column order.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn row(&self, row: usize) -> &[Option<f64>] {
        let width = self.n_cols();
        &self.cells[row * width..(row + 1) * width]
    }

    /// Iterates over `(timestamp, row)` pairs in index order.
    pub fn rows(&self) -> impl Iterator<Item = (DateTime<Utc>, &[Option<f64>])> + '_ {
        (0..self.n_rows()).map(move |i| (self.index[i], self.row(i)))
    }

    /// Number of missing cells across the whole table.
    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// Sum of each row, skipping missing cells.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_rows())
            .map(|i| self.row(i).iter().flatten().sum())
            .collect()
    }
}

impl TryFrom<SplitFrame> for Frame {
    type Error = CoreError;

    fn try_from(split: SplitFrame) -> Result<Self, Self::Error> {
        Frame::new(split.index, split.columns, split.data)
    }
}

impl From<Frame> for SplitFrame {
    fn from(frame: Frame) -> Self {
        let width = frame.columns.len();
        let data = if width == 0 {
            vec![Vec::new(); frame.index.len()]
        } else {
            frame.cells.chunks(width).map(|c| c.to_vec()).collect()
        };
        Self {
            index: frame.index,
            columns: frame.columns,
            data,
        }
    }
}
