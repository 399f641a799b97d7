use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which of the two engine inputs a check or an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    Prices,
    Weights,
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixKind::Prices => write!(f, "prices"),
            MatrixKind::Weights => write!(f, "weights"),
        }
    }
}

/// The constraint applied to every row of a weight matrix.
///
/// - `NoLeverage`: weights are non-negative (zero means cash) and a row may sum
///   to at most one.
/// - `FullyInvested`: weights are strictly positive and every row sums to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    #[default]
    NoLeverage,
    FullyInvested,
}

impl WeightPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightPolicy::NoLeverage => "no_leverage",
            WeightPolicy::FullyInvested => "fully_invested",
        }
    }
}

impl fmt::Display for WeightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "no_leverage" => Ok(WeightPolicy::NoLeverage),
            "fully_invested" => Ok(WeightPolicy::FullyInvested),
            _ => Err(CoreError::UnknownVariant {
                kind: "weight policy",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_policy_parses_both_spellings() {
        assert_eq!("no_leverage".parse::<WeightPolicy>().unwrap(), WeightPolicy::NoLeverage);
        assert_eq!("Fully-Invested".parse::<WeightPolicy>().unwrap(), WeightPolicy::FullyInvested);
        assert!("levered".parse::<WeightPolicy>().is_err());
    }

    #[test]
    fn default_policy_is_no_leverage() {
        assert_eq!(WeightPolicy::default(), WeightPolicy::NoLeverage);
    }
}
