// =============================================================================
// Simple Moving Average (SMA) — windowed mean
// =============================================================================
//
//   SMA_t = (x_t + x_{t-1} + ... + x_{t-period+1}) / period
//
// The window's running sum is adjusted by one insertion and at most one
// eviction per update.  Output is `None` for the first `period - 1` updates.
// =============================================================================

use tracing::debug;

use super::window::RollingWindow;
use super::Indicator;
use crate::error::{check_input, check_period, Result};
use crate::types::IndicatorStatus;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: RollingWindow,
    count: usize,
    last: Option<f64>,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self> {
        let period = check_period("period", period)?;
        Ok(Self {
            period,
            window: RollingWindow::new(period)?,
            count: 0,
            last: None,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Feed a value that has already been validated by an owning composite.
    pub(crate) fn push(&mut self, value: f64) -> Option<f64> {
        let was_ready = self.last.is_some();
        self.window.push(value);
        self.count += 1;
        self.last = self.window.mean();
        if !was_ready && self.last.is_some() {
            debug!(period = self.period, count = self.count, "SMA warmed up");
        }
        self.last
    }
}

impl Indicator for Sma {
    type Input = f64;
    type Output = f64;

    fn update(&mut self, value: f64) -> Result<Option<f64>> {
        let value = check_input("close", value)?;
        Ok(self.push(value))
    }

    fn current(&self) -> Option<f64> {
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
        format!("SMA({})", self.period)
    }

    fn status(&self) -> IndicatorStatus {
        let status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        match self.last {
            Some(v) => status.with("sma", v),
            None => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference;

    #[test]
    fn sma_known_sequence() {
        let mut sma = Sma::new(3).unwrap();
        let out: Vec<Option<f64>> = [100.0, 101.0, 102.0, 101.5, 103.0]
            .iter()
            .map(|&x| sma.update(x).unwrap())
            .collect();
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 101.0).abs() < 1e-9);
        assert!((out[3].unwrap() - 101.5).abs() < 1e-9);
        assert!((out[4].unwrap() - 102.166_666_666_666_67).abs() < 1e-9);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let mut sma = Sma::new(1).unwrap();
        for x in [1.0, 2.0, 3.0] {
            assert_eq!(sma.update(x).unwrap(), Some(x));
        }
    }

    #[test]
    fn sma_period_zero_rejected() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_matches_batch_reference() {
        let closes = reference::random_walk(300, 100.0);
        let expected = reference::sma(&closes, 20);
        let mut sma = Sma::new(20).unwrap();
        for (i, &c) in closes.iter().enumerate() {
            let got = sma.update(c).unwrap();
            match (got, expected[i]) {
                (None, None) => {}
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9, "index {i}: {a} vs {b}"),
                other => panic!("readiness mismatch at {i}: {other:?}"),
            }
        }
    }

    #[test]
    fn sma_rejects_nan_without_mutation() {
        let mut sma = Sma::new(3).unwrap();
        sma.update(1.0).unwrap();
        sma.update(2.0).unwrap();
        assert!(sma.update(f64::NAN).is_err());
        assert_eq!(sma.count(), 2);
        assert!(!sma.is_ready());
        assert!((sma.update(3.0).unwrap().unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn sma_reset_replays_identically() {
        let closes = reference::random_walk(50, 50.0);
        let mut sma = Sma::new(7).unwrap();
        let first: Vec<_> = closes.iter().map(|&c| sma.update(c).unwrap()).collect();
        sma.reset();
        assert_eq!(sma.count(), 0);
        let second: Vec<_> = closes.iter().map(|&c| sma.update(c).unwrap()).collect();
        assert_eq!(first, second);
    }
}
