//! # Exante Backtester
//!
//! The validation-and-execution core. Given a price matrix and a weight matrix
//! that share one date axis and one asset axis, it rejects malformed input with
//! a named error and computes per-asset return contributions without look-ahead.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** no I/O, no async, no shared state between engine instances.
//! - **Fail Fast:** every check stops the run on the first violation; nothing is
//!   imputed or dropped to make the input pass.
//! - **Borrowed Inputs:** the engine reads the caller's matrices and owns only the
//!   contribution matrix it produces.
//!
//! ## Public API
//!
//! - `BacktestEngine`: validates, runs, and exposes `contributions()` / `returns()`.
//! - `validation`: the individual invariant checks.
//! - `BacktestError`: the error taxonomy, grouped by `ErrorCategory`.

pub mod engine;
pub mod error;
pub mod validation;

pub use engine::BacktestEngine;
pub use error::{BacktestError, ErrorCategory, Misalignment};
