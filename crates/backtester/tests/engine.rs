use backtester::{BacktestEngine, BacktestError, ErrorCategory};
use configuration::load_config_from_str;
use core_types::Frame;

const PRICES: &str = r#"{
    "index": ["2024-01-02T00:00:00Z", "2024-01-03T00:00:00Z", "2024-01-04T00:00:00Z", "2024-01-05T00:00:00Z"],
    "columns": ["AAPL", "MSFT", "GLD"],
    "data": [
        [185.64, 370.87, 189.54],
        [184.25, 370.60, 188.98],
        [181.91, 367.94, 188.15],
        [181.18, 367.75, 187.61]
    ]
}"#;

const WEIGHTS: &str = r#"{
    "index": ["2024-01-02T00:00:00Z", "2024-01-03T00:00:00Z", "2024-01-04T00:00:00Z", "2024-01-05T00:00:00Z"],
    "columns": ["AAPL", "MSFT", "GLD"],
    "data": [
        [0.4, 0.4, 0.2],
        [0.3, 0.3, 0.2],
        [0.0, 0.5, 0.5],
        [0.3, 0.3, 0.4]
    ]
}"#;

fn load(raw: &str) -> Frame {
    serde_json::from_str(raw).unwrap()
}

#[test]
fn runs_end_to_end_from_split_json() {
    let prices = load(PRICES);
    let weights = load(WEIGHTS);
    let config = load_config_from_str("").unwrap();

    let mut engine = BacktestEngine::from_settings(&prices, &weights, &config.engine);
    engine.run().unwrap();
    let returns = engine.returns().unwrap();

    assert_eq!(returns.len(), prices.n_rows() - 1);
    assert_eq!(returns.index(), &prices.index()[1..]);

    let expected_day2 = (184.25 / 185.64 - 1.0) * 0.4
        + (370.60 / 370.87 - 1.0) * 0.4
        + (188.98 / 189.54 - 1.0) * 0.2;
    assert!((returns.values()[0] - expected_day2).abs() < 1e-12);

    // The 2024-01-05 return uses the 2024-01-04 weights, which hold no AAPL.
    let expected_day4 = (367.75 / 367.94 - 1.0) * 0.5 + (187.61 / 188.15 - 1.0) * 0.5;
    assert!((returns.values()[2] - expected_day4).abs() < 1e-12);
}

#[test]
fn configured_policy_changes_which_weights_are_accepted() {
    let prices = load(PRICES);
    let weights = load(WEIGHTS);
    let config = load_config_from_str("[engine]\nweight_policy = \"fully_invested\"\n").unwrap();

    let mut engine = BacktestEngine::from_settings(&prices, &weights, &config.engine);
    let err = engine.run().unwrap_err();

    assert!(matches!(err, BacktestError::InvalidWeight { .. }));
    assert_eq!(err.category(), ErrorCategory::Content);
}

#[test]
fn missing_price_cell_is_reported_not_imputed() {
    let raw = PRICES.replace("[184.25, 370.60, 188.98]", "[184.25, null, 188.98]");
    let prices = load(&raw);
    let weights = load(WEIGHTS);

    let mut engine = BacktestEngine::new(&prices, &weights);
    let err = engine.run().unwrap_err();

    assert_eq!(
        err.to_string(),
        "prices contain a missing value at 2024-01-03 00:00:00 UTC for asset 'MSFT'"
    );
    assert!(matches!(engine.returns(), Err(BacktestError::EngineState)));
}

#[test]
fn engines_on_separate_threads_do_not_interfere() {
    let prices = load(PRICES);
    let weights = load(WEIGHTS);
    let (prices, weights) = (&prices, &weights);

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || {
                    let mut engine = BacktestEngine::new(prices, weights);
                    engine.run().map(|_| engine.returns())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let first = results[0].clone().unwrap().unwrap();
    for result in results {
        assert_eq!(result.unwrap().unwrap(), first);
    }
}
