//! # Exante Core Types
//!
//! Layer 0 of the workspace. Defines the labeled table every other crate speaks:
//! an ordered timestamp index, an ordered list of asset identifiers, and a dense
//! grid of optional values. Content invariants (ordering, positivity, exposure)
//! are enforced by the `backtester` crate, not here.

pub mod enums;
pub mod error;
pub mod frame;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use enums::{MatrixKind, WeightPolicy};
pub use error::CoreError;
pub use frame::{ContributionMatrix, Frame, PriceMatrix, WeightMatrix};
pub use series::ReturnSeries;
