use crate::error::ApiError;
use std::fmt;
use std::str::FromStr;

/// Sampling frequency accepted by the chart API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Minute1,
    Minute2,
    Minute5,
    Minute15,
    Minute30,
    Minute60,
    Minute90,
    Hour1,
    Day1,
    Day5,
    Week1,
    Month1,
    Month3,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute2 => "2m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Minute60 => "60m",
            Interval::Minute90 => "90m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Day5 => "5d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
            Interval::Month3 => "3mo",
        }
    }

    /// Bars shorter than a day keep their exact timestamp; longer bars are keyed by date.
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::Minute1
                | Interval::Minute2
                | Interval::Minute5
                | Interval::Minute15
                | Interval::Minute30
                | Interval::Minute60
                | Interval::Minute90
                | Interval::Hour1
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let interval = match s.trim() {
            "1m" => Interval::Minute1,
            "2m" => Interval::Minute2,
            "5m" => Interval::Minute5,
            "15m" => Interval::Minute15,
            "30m" => Interval::Minute30,
            "60m" => Interval::Minute60,
            "90m" => Interval::Minute90,
            "1h" => Interval::Hour1,
            "1d" => Interval::Day1,
            "5d" => Interval::Day5,
            "1wk" => Interval::Week1,
            "1mo" => Interval::Month1,
            "3mo" => Interval::Month3,
            other => return Err(ApiError::InvalidInterval(other.to_string())),
        };
        Ok(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_intervals() {
        assert_eq!("1d".parse::<Interval>().unwrap(), Interval::Day1);
        assert_eq!("1wk".parse::<Interval>().unwrap().to_string(), "1wk");
        assert!("1h".parse::<Interval>().unwrap().is_intraday());
        assert!(!"1mo".parse::<Interval>().unwrap().is_intraday());
    }

    #[test]
    fn rejects_unknown_interval() {
        assert!(matches!(
            "2d".parse::<Interval>(),
            Err(ApiError::InvalidInterval(s)) if s == "2d"
        ));
    }
}
