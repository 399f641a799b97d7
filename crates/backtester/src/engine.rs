use crate::error::BacktestError;
use crate::validation;
use configuration::{EngineSettings, DEFAULT_EXPOSURE_TOLERANCE};
use core_types::{
    ContributionMatrix, Frame, MatrixKind, PriceMatrix, ReturnSeries, WeightMatrix, WeightPolicy,
};

/// Result slot of one engine instance.
#[derive(Debug)]
enum RunState {
    NotRun,
    Completed(ContributionMatrix),
}

/// Execution-only backtest engine.
///
/// Bound to one borrowed (prices, weights) pair. `run` validates both inputs,
/// then pairs every period's return with the weight decided one period
/// earlier. The engine never generates or alters weights.
#[derive(Debug)]
pub struct BacktestEngine<'a> {
    prices: &'a PriceMatrix,
    weights: &'a WeightMatrix,
    policy: WeightPolicy,
    tolerance: f64,
    state: RunState,
}

impl<'a> BacktestEngine<'a> {
    /// Creates an engine with the default `NoLeverage` policy and a 1e-6 tolerance.
    pub fn new(prices: &'a PriceMatrix, weights: &'a WeightMatrix) -> Self {
        Self {
            prices,
            weights,
            policy: WeightPolicy::default(),
            tolerance: DEFAULT_EXPOSURE_TOLERANCE,
            state: RunState::NotRun,
        }
    }

    pub fn from_settings(
        prices: &'a PriceMatrix,
        weights: &'a WeightMatrix,
        settings: &EngineSettings,
    ) -> Self {
        Self::new(prices, weights)
            .with_policy(settings.weight_policy)
            .with_tolerance(settings.exposure_tolerance)
    }

    pub fn with_policy(mut self, policy: WeightPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn prices(&self) -> &'a PriceMatrix {
        self.prices
    }

    pub fn weights(&self) -> &'a WeightMatrix {
        self.weights
    }

    pub fn policy(&self) -> WeightPolicy {
        self.policy
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn validate_prices(&self) -> Result<(), BacktestError> {
        validation::check_no_missing(self.prices, MatrixKind::Prices)?;
        validation::check_index_clean(self.prices, MatrixKind::Prices)?;
        validation::check_positive(self.prices)
    }

    pub fn validate_weights(&self) -> Result<(), BacktestError> {
        validation::check_no_missing(self.weights, MatrixKind::Weights)?;
        validation::check_index_clean(self.weights, MatrixKind::Weights)?;
        match self.policy {
            WeightPolicy::NoLeverage => {
                validation::check_nonnegative(self.weights)?;
                validation::check_exposure(self.weights, self.tolerance)
            }
            WeightPolicy::FullyInvested => {
                validation::check_strictly_positive_weights(self.weights)?;
                validation::check_fully_invested(self.weights, self.tolerance)
            }
        }
    }

    pub fn validate_alignment(&self) -> Result<(), BacktestError> {
        validation::check_alignment(self.prices, self.weights)
    }

    /// Validates the inputs and computes the contribution matrix.
    ///
    /// Fails on the first violated invariant and leaves the engine un-run.
    /// Once contributions exist they are never recomputed; calling `run`
    /// again is a no-op.
    #[tracing::instrument(name = "backtest_run", skip_all)]
    pub fn run(&mut self) -> Result<(), BacktestError> {
        if self.is_complete() {
            tracing::debug!("Contributions already computed, skipping run.");
            return Ok(());
        }

        tracing::debug!(
            dates = self.prices.n_rows(),
            assets = self.prices.n_cols(),
            policy = %self.policy,
            "Validating backtest inputs."
        );
        if let Err(e) = self.validate_all() {
            tracing::warn!(error = %e, "Backtest input rejected.");
            return Err(e);
        }

        let contributions = compute_contributions(self.prices, self.weights)?;
        tracing::info!(
            periods = contributions.n_rows(),
            assets = contributions.n_cols(),
            "Backtest complete."
        );
        self.state = RunState::Completed(contributions);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, RunState::Completed(_))
    }

    /// Per-asset return contributions, one row per date after the first.
    pub fn contributions(&self) -> Result<&ContributionMatrix, BacktestError> {
        match &self.state {
            RunState::Completed(contributions) => Ok(contributions),
            RunState::NotRun => Err(BacktestError::EngineState),
        }
    }

    /// Portfolio return per period: the row sum of the contribution matrix.
    pub fn returns(&self) -> Result<ReturnSeries, BacktestError> {
        let contributions = self.contributions()?;
        let series = ReturnSeries::new(contributions.index().to_vec(), contributions.row_sums())?;
        Ok(series)
    }

    fn validate_all(&self) -> Result<(), BacktestError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(BacktestError::InvalidTolerance(self.tolerance));
        }
        self.validate_prices()?;
        self.validate_weights()?;
        self.validate_alignment()
    }
}

/// `contribution[t, a] = (price[t, a] / price[t-1, a] - 1) * weight[t-1, a]`.
///
/// The first date has neither a return nor a prior weight and is dropped, as
/// is any later row with an undefined (NaN) cell, e.g. an overflowing return
/// held at zero weight.
fn compute_contributions(
    prices: &PriceMatrix,
    weights: &WeightMatrix,
) -> Result<ContributionMatrix, BacktestError> {
    let n_cols = prices.n_cols();
    let mut index = Vec::with_capacity(prices.n_rows().saturating_sub(1));
    let mut rows = Vec::with_capacity(prices.n_rows().saturating_sub(1));

    for t in 1..prices.n_rows() {
        let row: Option<Vec<f64>> = (0..n_cols)
            .map(|a| {
                let asset_return = prices.get(t, a)? / prices.get(t - 1, a)? - 1.0;
                let prior_weight = weights.get(t - 1, a)?;
                Some(asset_return * prior_weight).filter(|c| !c.is_nan())
            })
            .collect();

        match row {
            Some(row) => {
                index.push(prices.date(t));
                rows.push(row);
            }
            None => {
                tracing::debug!(date = %prices.date(t), "Dropping row with an undefined contribution.")
            }
        }
    }

    let contributions = Frame::from_values(index, prices.columns().to_vec(), rows)?;
    Ok(contributions)
}
