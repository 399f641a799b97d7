use crate::error::ApiError;
use crate::{LoadedPrices, Observation};
use chrono::{DateTime, Utc};
use core_types::Frame;
use std::collections::{BTreeMap, BTreeSet};

/// Merges per-ticker series into one dates x tickers table.
///
/// The index is the sorted union of every timestamp that carries a value for
/// at least one ticker. A ticker with no value at all is unresolved; every
/// unresolved ticker is listed in the error. Remaining gaps are kept as
/// missing cells and counted.
pub fn assemble_prices(series: Vec<(String, Vec<Observation>)>) -> Result<LoadedPrices, ApiError> {
    let mut unresolved = Vec::new();
    let mut by_ticker: Vec<(String, BTreeMap<DateTime<Utc>, f64>)> = Vec::with_capacity(series.len());

    for (ticker, observations) in series {
        // A repeated timestamp keeps its last value.
        let values: BTreeMap<_, _> = observations
            .into_iter()
            .filter_map(|(at, close)| close.map(|c| (at, c)))
            .collect();

        if values.is_empty() {
            unresolved.push(ticker);
        } else {
            by_ticker.push((ticker, values));
        }
    }

    if !unresolved.is_empty() {
        return Err(ApiError::UnresolvedAssets(unresolved));
    }

    let index: Vec<DateTime<Utc>> = by_ticker
        .iter()
        .flat_map(|(_, values)| values.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = index
        .iter()
        .map(|at| {
            by_ticker
                .iter()
                .map(|(_, values)| values.get(at).copied())
                .collect()
        })
        .collect();

    let columns = by_ticker.into_iter().map(|(ticker, _)| ticker).collect();
    let prices = Frame::new(index, columns, rows)?;
    let missing_cells = prices.missing_count();

    tracing::info!("{} value(s) missing", missing_cells);

    Ok(LoadedPrices {
        prices,
        missing_cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn merges_on_the_union_of_dates() {
        let loaded = assemble_prices(vec![
            ("AAA".to_string(), vec![(day(2), Some(10.0)), (day(1), Some(9.0))]),
            ("BBB".to_string(), vec![(day(1), Some(5.0)), (day(3), Some(6.0))]),
        ])
        .unwrap();

        let prices = loaded.prices;
        assert_eq!(prices.index(), &[day(1), day(2), day(3)]);
        assert_eq!(prices.columns(), &["AAA".to_string(), "BBB".to_string()]);
        assert_eq!(prices.row(0), &[Some(9.0), Some(5.0)]);
        assert_eq!(prices.row(1), &[Some(10.0), None]);
        assert_eq!(prices.row(2), &[None, Some(6.0)]);
        assert_eq!(loaded.missing_cells, 2);
    }

    #[test]
    fn null_closes_do_not_create_rows() {
        let loaded = assemble_prices(vec![(
            "AAA".to_string(),
            vec![(day(1), Some(1.0)), (day(2), None)],
        )])
        .unwrap();
        assert_eq!(loaded.prices.n_rows(), 1);
        assert_eq!(loaded.missing_cells, 0);
    }

    #[test]
    fn every_empty_ticker_is_listed() {
        let err = assemble_prices(vec![
            ("GOOD".to_string(), vec![(day(1), Some(1.0))]),
            ("NOPE".to_string(), Vec::new()),
            ("NULLS".to_string(), vec![(day(1), None)]),
        ])
        .unwrap_err();

        match err {
            ApiError::UnresolvedAssets(tickers) => assert_eq!(tickers, vec!["NOPE", "NULLS"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unresolved_message_lists_tickers() {
        let err = ApiError::UnresolvedAssets(vec!["XYZ".to_string()]);
        assert_eq!(err.to_string(), "[\"XYZ\"] were not found in the data source");
    }
}
