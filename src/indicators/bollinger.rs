// =============================================================================
// Bollinger Bands — streaming
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ). The Band Width (BBW) is the normalised
// distance: BBW = (upper - lower) / middle * 100.
//
// σ is the population standard deviation over the window, taken from the
// window's running sum and sum-of-squares:
//   var = max(0, sumSq / n - mean²)
// While a value whose square overflows f64 is inside the window the bands
// are unavailable and the update reports `None`.

use serde::Serialize;
use tracing::debug;

use super::window::RollingWindow;
use super::Indicator;
use crate::error::{check_finite_param, check_input, check_period, Result};
use crate::types::IndicatorStatus;

/// Result of a Bollinger Band update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// (upper - lower) / middle * 100; 0 when the middle band is 0.
    pub width: f64,
    /// Position of the close inside the bands; 0.5 when they collapse.
    pub percent_b: f64,
}

#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    num_std: f64,
    window: RollingWindow,
    count: usize,
    last: Option<BollingerOutput>,
}

impl BollingerBands {
    pub fn new(period: usize, num_std: f64) -> Result<Self> {
        let period = check_period("period", period)?;
        let num_std = check_finite_param("std_dev", num_std)?;
        Ok(Self {
            period,
            num_std,
            window: RollingWindow::new(period)?,
            count: 0,
            last: None,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn num_std(&self) -> f64 {
        self.num_std
    }

    fn compute(&self, close: f64) -> Option<BollingerOutput> {
        let middle = self.window.mean()?;
        let std_dev = self.window.std_dev()?;
        let upper = middle + self.num_std * std_dev;
        let lower = middle - self.num_std * std_dev;

        let width = if middle == 0.0 {
            0.0
        } else {
            (upper - lower) / middle * 100.0
        };
        let span = upper - lower;
        let percent_b = if span > 0.0 { (close - lower) / span } else { 0.5 };

        Some(BollingerOutput {
            upper,
            middle,
            lower,
            width,
            percent_b,
        })
    }
}

impl Indicator for BollingerBands {
    type Input = f64;
    type Output = BollingerOutput;

    fn update(&mut self, close: f64) -> Result<Option<BollingerOutput>> {
        let close = check_input("close", close)?;
        self.window.push(close);
        self.count += 1;
        let warming = self.last.is_none();
        self.last = self.compute(close);
        if warming && self.last.is_some() {
            debug!(period = self.period, count = self.count, "bollinger bands ready");
        }
        Ok(self.last)
    }

    fn current(&self) -> Option<BollingerOutput> {
        self.last
    }

    fn reset(&mut self) {
        self.window.clear();
        self.count = 0;
        self.last = None;
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn label(&self) -> String {
        format!("BB({},{})", self.period, self.num_std)
    }

    fn status(&self) -> IndicatorStatus {
        let status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        match self.last {
            Some(b) => status
                .with("upper", b.upper)
                .with("middle", b.middle)
                .with("lower", b.lower)
                .with("width", b.width)
                .with("percent_b", b.percent_b),
            None => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndicatorError;
    use crate::reference;

    #[test]
    fn bollinger_basic() {
        let mut bb = BollingerBands::new(20, 2.0).unwrap();
        let mut last = None;
        for x in 1..=20 {
            last = bb.update(x as f64).unwrap();
        }
        let b = last.unwrap();
        assert!(b.upper > b.middle);
        assert!(b.lower < b.middle);
        assert!(b.width > 0.0);
        assert!((b.middle - 10.5).abs() < 1e-9);
    }

    #[test]
    fn bollinger_insufficient_data() {
        let mut bb = BollingerBands::new(20, 2.0).unwrap();
        for x in [1.0, 2.0, 3.0] {
            assert!(bb.update(x).unwrap().is_none());
        }
    }

    #[test]
    fn bollinger_flat() {
        let mut bb = BollingerBands::new(20, 2.0).unwrap();
        let mut last = None;
        for _ in 0..40 {
            last = bb.update(100.0).unwrap();
        }
        let b = last.unwrap();
        assert!(b.width.abs() < 1e-6);
        assert_eq!(b.upper, b.lower);
        assert_eq!(b.percent_b, 0.5);
    }

    #[test]
    fn bollinger_matches_batch_reference() {
        let closes = reference::random_walk(200, 100.0);
        let means = reference::sma(&closes, 20);
        let stds = reference::rolling_std(&closes, 20);
        let mut bb = BollingerBands::new(20, 2.5).unwrap();
        for (i, &c) in closes.iter().enumerate() {
            let got = bb.update(c).unwrap();
            match (got, means[i], stds[i]) {
                (None, None, None) => {}
                (Some(b), Some(m), Some(s)) => {
                    assert!((b.middle - m).abs() < 1e-9);
                    assert!((b.upper - (m + 2.5 * s)).abs() < 1e-6);
                    assert!((b.lower - (m - 2.5 * s)).abs() < 1e-6);
                }
                other => panic!("readiness mismatch at {i}: {other:?}"),
            }
        }
    }

    #[test]
    fn bollinger_reset_replays_identically() {
        let closes = reference::random_walk(90, 50.0);
        let mut bb = BollingerBands::new(10, 1.5).unwrap();
        let a: Vec<_> = closes.iter().map(|&c| bb.update(c).unwrap()).collect();
        bb.reset();
        assert!(!bb.is_ready());
        assert_eq!(bb.count(), 0);
        let b: Vec<_> = closes.iter().map(|&c| bb.update(c).unwrap()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn bollinger_nan_rejected_without_mutation() {
        let closes = reference::random_walk(30, 50.0);
        let mut bb = BollingerBands::new(10, 2.0).unwrap();
        let mut twin = BollingerBands::new(10, 2.0).unwrap();
        for &c in &closes {
            bb.update(c).unwrap();
            twin.update(c).unwrap();
        }
        let before = bb.status();

        let err = bb.update(f64::NAN).unwrap_err();
        assert!(matches!(err, IndicatorError::NonFiniteInput { field: "close", .. }));
        assert!(bb.update(f64::NEG_INFINITY).is_err());
        assert_eq!(bb.status(), before);
        assert_eq!(bb.update(51.0).unwrap(), twin.update(51.0).unwrap());
    }

    #[test]
    fn bollinger_recovers_after_huge_values_leave() {
        let mut bb = BollingerBands::new(2, 2.0).unwrap();
        let mut last = None;
        for x in [1e200, 1e200, 1.0, 2.0, 3.0, 4.0] {
            last = bb.update(x).unwrap();
        }
        let b = last.unwrap();
        assert!((b.middle - 3.5).abs() < 1e-12);
        assert!((b.upper - 4.5).abs() < 1e-12);
        assert!((b.lower - 2.5).abs() < 1e-12);
    }

    #[test]
    fn bollinger_rejects_bad_params() {
        let bb = BollingerBands::new(20, 2.5).unwrap();
        assert_eq!((bb.period(), bb.num_std()), (20, 2.5));
        assert!(BollingerBands::new(0, 2.0).is_err());
        assert!(BollingerBands::new(20, f64::NAN).is_err());
        assert!(BollingerBands::new(20, f64::INFINITY).is_err());
    }
}
