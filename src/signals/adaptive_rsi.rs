// =============================================================================
// Adaptive RSI — volatility-driven look-back
// =============================================================================
//
// Volatility proxy: population std-dev of the last `volatility_window` simple
// returns.  Normalised against the highest proxy seen so far and mapped
// linearly onto the period range (more volatility => shorter period):
//
//   norm   = vol / max_vol                       (0 when max_vol == 0)
//   period = round(max_period - norm * (max_period - min_period))
//
// Until the return window fills the period sits at the midpoint of the range.
// The owned RSI is reconfigured in place each bar, never rebuilt, so its
// Wilder averages carry across period changes.

use serde::Serialize;

use crate::error::{check_input, check_period, IndicatorError, Result};
use crate::indicators::{Indicator, Rsi, RollingWindow};
use crate::types::IndicatorStatus;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdaptiveRsiOutput {
    pub value: f64,
    /// Look-back used for this update.
    pub period: usize,
}

#[derive(Debug, Clone)]
pub struct AdaptiveRsi {
    min_period: usize,
    max_period: usize,
    returns: RollingWindow,
    prev_close: Option<f64>,
    max_volatility: f64,
    volatility: Option<f64>,
    effective_period: usize,
    rsi: Rsi,
    count: usize,
    last: Option<AdaptiveRsiOutput>,
}

impl AdaptiveRsi {
    pub fn new(min_period: usize, max_period: usize, volatility_window: usize) -> Result<Self> {
        let min_period = check_period("min_period", min_period)?;
        let max_period = check_period("max_period", max_period)?;
        let volatility_window = check_period("volatility_window", volatility_window)?;
        if min_period > max_period {
            return Err(IndicatorError::parameter(
                "min_period",
                format!("must not exceed max_period ({min_period} > {max_period})"),
            ));
        }
        let start = midpoint(min_period, max_period);
        Ok(Self {
            min_period,
            max_period,
            returns: RollingWindow::new(volatility_window)?,
            prev_close: None,
            max_volatility: 0.0,
            volatility: None,
            effective_period: start,
            rsi: Rsi::new(start)?,
            count: 0,
            last: None,
        })
    }

    pub fn effective_period(&self) -> usize {
        self.effective_period
    }

    /// Latest volatility proxy, once the return window is full.
    pub fn volatility(&self) -> Option<f64> {
        self.volatility
    }

    fn period_for(&self, volatility: f64) -> usize {
        let norm = if self.max_volatility > 0.0 {
            (volatility / self.max_volatility).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let span = (self.max_period - self.min_period) as f64;
        let period = (self.max_period as f64 - norm * span).round() as usize;
        period.clamp(self.min_period, self.max_period)
    }
}

fn midpoint(min_period: usize, max_period: usize) -> usize {
    min_period + (max_period - min_period) / 2
}

impl Indicator for AdaptiveRsi {
    type Input = f64;
    type Output = AdaptiveRsiOutput;

    fn update(&mut self, close: f64) -> Result<Option<AdaptiveRsiOutput>> {
        let close = check_input("close", close)?;
        self.count += 1;

        if let Some(prev) = self.prev_close.replace(close) {
            let ret = if prev != 0.0 { (close - prev) / prev } else { 0.0 };
            self.returns.push(ret);
        }

        self.volatility = self.returns.std_dev();
        if let Some(vol) = self.volatility {
            self.max_volatility = self.max_volatility.max(vol);
            self.effective_period = self.period_for(vol);
            self.rsi.set_period(self.effective_period)?;
        }

        self.last = self.rsi.push(close).map(|value| AdaptiveRsiOutput {
            value,
            period: self.effective_period,
        });
        Ok(self.last)
    }

    fn current(&self) -> Option<AdaptiveRsiOutput> {
        self.last
    }

    fn reset(&mut self) {
        self.returns.clear();
        self.prev_close = None;
        self.max_volatility = 0.0;
        self.volatility = None;
        self.effective_period = midpoint(self.min_period, self.max_period);
        self.rsi.reset();
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
        format!(
            "ARSI({}..{},{})",
            self.min_period,
            self.max_period,
            self.returns.capacity()
        )
    }

    fn status(&self) -> IndicatorStatus {
        let mut status = IndicatorStatus::new(self.label(), self.count, self.is_ready())
            .with("period", self.effective_period as f64);
        if let Some(o) = self.last {
            status = status.with("rsi", o.value);
        }
        if let Some(v) = self.volatility {
            status = status.with("volatility", v);
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference;

    #[test]
    fn rejects_bad_ranges() {
        assert!(AdaptiveRsi::new(0, 28, 20).is_err());
        assert!(AdaptiveRsi::new(7, 0, 20).is_err());
        assert!(AdaptiveRsi::new(7, 28, 0).is_err());
        assert!(matches!(
            AdaptiveRsi::new(30, 10, 20),
            Err(IndicatorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn starts_at_midpoint() {
        let a = AdaptiveRsi::new(7, 28, 20).unwrap();
        assert_eq!(a.effective_period(), 17);
        assert_eq!(a.rsi.period(), 17);
    }

    #[test]
    fn period_stays_in_range_and_output_bounded() {
        let mut a = AdaptiveRsi::new(5, 30, 10).unwrap();
        for c in reference::random_walk(500, 100.0) {
            if let Some(o) = a.update(c).unwrap() {
                assert!((5..=30).contains(&o.period));
                assert!((0.0..=100.0).contains(&o.value));
            }
            assert_eq!(a.rsi.period(), a.effective_period());
        }
    }

    #[test]
    fn volatility_spike_shortens_period() {
        let mut a = AdaptiveRsi::new(5, 30, 5).unwrap();
        assert!(a.volatility().is_none());
        // Calm phase with a tiny, steady oscillation.
        for i in 0..40 {
            a.update(100.0 + if i % 2 == 0 { 0.01 } else { -0.01 }).unwrap();
        }
        let calm = a.volatility().unwrap();
        assert!(calm < 1e-3);
        // Violent swings push the proxy to a new maximum.
        for i in 0..10 {
            a.update(100.0 + if i % 2 == 0 { 8.0 } else { -8.0 }).unwrap();
        }
        assert!(a.volatility().unwrap() > 100.0 * calm);
        assert_eq!(a.effective_period(), 5);
        // Back to calm: the proxy falls far below its running maximum.
        for i in 0..20 {
            a.update(100.0 + if i % 2 == 0 { 0.01 } else { -0.01 }).unwrap();
        }
        assert!(a.effective_period() >= 29);
    }

    #[test]
    fn reset_replays_identically() {
        let closes = reference::random_walk(150, 20.0);
        let mut a = AdaptiveRsi::new(7, 28, 20).unwrap();
        let first: Vec<_> = closes.iter().map(|&c| a.update(c).unwrap()).collect();
        a.reset();
        assert_eq!(a.effective_period(), 17);
        assert!(a.volatility().is_none());
        let second: Vec<_> = closes.iter().map(|&c| a.update(c).unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn nan_rejected() {
        let mut a = AdaptiveRsi::new(7, 28, 20).unwrap();
        a.update(10.0).unwrap();
        assert!(a.update(f64::NAN).is_err());
        assert_eq!(a.count(), 1);
    }
}
