use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One portfolio return per date, in index order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    index: Vec<DateTime<Utc>>,
    data: Vec<f64>,
}

impl ReturnSeries {
    pub fn new(index: Vec<DateTime<Utc>>, data: Vec<f64>) -> Result<Self, CoreError> {
        if index.len() != data.len() {
            return Err(CoreError::Shape(format!(
                "series index has {} entries but {} values were supplied",
                index.len(),
                data.len()
            )));
        }
        Ok(Self { index, data })
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.index.iter().copied().zip(self.data.iter().copied())
    }
}
