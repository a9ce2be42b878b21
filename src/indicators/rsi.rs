// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing, streaming
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Update 1       — remember the close; no delta yet.
// Updates 2..=p+1 — accumulate gains and (positive) losses.
// Update p+1     — seed average gain / loss with the mean of those `p` deltas.
// Afterwards     — Wilder's recurrence:
//                    avg = (avg * (period - 1) + current) / period
//
//   RS  = avg_gain / avg_loss
//   RSI = 100 - 100 / (1 + RS)
//
// The recurrence is irreversible: only replaying every update or `reset`
// reconstructs it.
// =============================================================================

use tracing::debug;

use super::Indicator;
use crate::error::{check_input, check_period, Result};
use crate::types::IndicatorStatus;

#[derive(Debug, Clone)]
pub struct Rsi {
    /// Period given at construction; `reset` restores it.
    initial_period: usize,
    period: usize,
    prev: Option<f64>,
    deltas: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    count: usize,
    last: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self> {
        let period = check_period("period", period)?;
        Ok(Self {
            initial_period: period,
            period,
            prev: None,
            deltas: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            count: 0,
            last: None,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Change the smoothing period in place, keeping the averages.
    ///
    /// During warm-up the new period also moves the seeding point: the
    /// averages are seeded as soon as at least `period` deltas exist.
    pub fn set_period(&mut self, period: usize) -> Result<()> {
        self.period = check_period("period", period)?;
        Ok(())
    }

    pub(crate) fn push(&mut self, close: f64) -> Option<f64> {
        self.count += 1;
        let Some(prev) = self.prev.replace(close) else {
            return None;
        };

        let delta = close - prev;
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        if self.last.is_some() {
            let p = self.period as f64;
            self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
            self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
        } else {
            self.deltas += 1;
            self.gain_sum += gain;
            self.loss_sum += loss;
            if self.deltas < self.period {
                return None;
            }
            let n = self.deltas as f64;
            self.avg_gain = self.gain_sum / n;
            self.avg_loss = self.loss_sum / n;
            debug!(period = self.period, count = self.count, "RSI seeded");
        }

        self.last = Some(rsi_from_averages(self.avg_gain, self.avg_loss));
        self.last
    }
}

impl Indicator for Rsi {
    type Input = f64;
    type Output = f64;

    fn update(&mut self, close: f64) -> Result<Option<f64>> {
        let close = check_input("close", close)?;
        Ok(self.push(close))
    }

    fn current(&self) -> Option<f64> {
        self.last
    }

    fn reset(&mut self) {
        self.period = self.initial_period;
        self.prev = None;
        self.deltas = 0;
        self.gain_sum = 0.0;
        self.loss_sum = 0.0;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
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
        format!("RSI({})", self.period)
    }

    fn status(&self) -> IndicatorStatus {
        let status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        match self.last {
            Some(v) => status
                .with("rsi", v)
                .with("avg_gain", self.avg_gain)
                .with("avg_loss", self.avg_loss),
            None => status,
        }
    }
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - If both averages are zero, RSI is 50.0 (no movement).
/// - If average loss is zero (only gains), RSI is 100.0.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
    }
}
