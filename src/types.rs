// =============================================================================
// Shared types used across the streaming indicator engine
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{check_input, Result};

/// A single OHLCV bar as delivered by a live feed.
///
/// `timestamp` is optional; indicators never read it, the registry only
/// carries it through for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp: None,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The high/low/close subset consumed by range-based indicators.
    pub fn hlc(&self) -> Hlc {
        Hlc {
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }
}

/// `(open, high, low, close)`
impl From<(f64, f64, f64, f64)> for Bar {
    fn from((open, high, low, close): (f64, f64, f64, f64)) -> Self {
        Self::new(open, high, low, close, 0.0)
    }
}

/// `(open, high, low, close, volume)`
impl From<(f64, f64, f64, f64, f64)> for Bar {
    fn from((open, high, low, close, volume): (f64, f64, f64, f64, f64)) -> Self {
        Self::new(open, high, low, close, volume)
    }
}

/// `(timestamp, open, high, low, close)`
impl From<(i64, f64, f64, f64, f64)> for Bar {
    fn from((ts, open, high, low, close): (i64, f64, f64, f64, f64)) -> Self {
        Self::new(open, high, low, close, 0.0).with_timestamp(ts)
    }
}

/// `(timestamp, open, high, low, close, volume)`
impl From<(i64, f64, f64, f64, f64, f64)> for Bar {
    fn from((ts, open, high, low, close, volume): (i64, f64, f64, f64, f64, f64)) -> Self {
        Self::new(open, high, low, close, volume).with_timestamp(ts)
    }
}

/// High / low / close triple for range-based indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hlc {
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Hlc {
    pub fn new(high: f64, low: f64, close: f64) -> Self {
        Self { high, low, close }
    }

    /// Check all three fields before any state is mutated.
    pub(crate) fn validate(&self) -> Result<()> {
        check_input("high", self.high)?;
        check_input("low", self.low)?;
        check_input("close", self.close)?;
        Ok(())
    }

    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

impl From<(f64, f64, f64)> for Hlc {
    fn from((high, low, close): (f64, f64, f64)) -> Self {
        Self { high, low, close }
    }
}

/// Trend direction reported by band-flip indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `+1.0` for `Up`, `-1.0` for `Down`.
    pub fn signum(self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// Which part of a bar an indicator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputArity {
    /// Close price only.
    Close,
    /// High, low and close.
    HighLowClose,
}

/// Introspection snapshot of an indicator instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorStatus {
    /// Human-readable label, e.g. `RSI(14)`.
    pub label: String,
    /// Number of accepted updates since construction or the last reset.
    pub count: usize,
    pub ready: bool,
    /// Named current outputs; empty while warming up.
    pub outputs: BTreeMap<String, f64>,
}

impl IndicatorStatus {
    pub(crate) fn new(label: String, count: usize, ready: bool) -> Self {
        Self {
            label,
            count,
            ready,
            outputs: BTreeMap::new(),
        }
    }

    pub(crate) fn with(mut self, name: &str, value: f64) -> Self {
        self.outputs.insert(name.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_from_tuples() {
        let b: Bar = (1.0, 2.0, 0.5, 1.5).into();
        assert_eq!(b.timestamp, None);
        assert_eq!(b.volume, 0.0);

        let b: Bar = (1.0, 2.0, 0.5, 1.5, 300.0).into();
        assert_eq!(b.volume, 300.0);

        let b: Bar = (1_700_000_000_000_i64, 1.0, 2.0, 0.5, 1.5).into();
        assert_eq!(b.timestamp, Some(1_700_000_000_000));
        assert_eq!(b.close, 1.5);

        let b: Bar = (42_i64, 1.0, 2.0, 0.5, 1.5, 10.0).into();
        assert_eq!(b.timestamp, Some(42));
        assert_eq!(b.hlc(), Hlc::new(2.0, 0.5, 1.5));
    }

    #[test]
    fn hlc_validation_catches_each_field() {
        assert!(Hlc::new(f64::NAN, 1.0, 1.0).validate().is_err());
        assert!(Hlc::new(1.0, f64::INFINITY, 1.0).validate().is_err());
        assert!(Hlc::new(1.0, 1.0, f64::NAN).validate().is_err());
        assert!(Hlc::new(2.0, 1.0, 1.5).validate().is_ok());
    }

    #[test]
    fn direction_signum() {
        assert_eq!(Direction::Up.signum(), 1.0);
        assert_eq!(Direction::Down.signum(), -1.0);
        assert_eq!(Direction::Down.to_string(), "DOWN");
    }
}
