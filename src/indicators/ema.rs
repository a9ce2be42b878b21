// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first `period` values only accumulate a warm-up sum; on the `period`-th
// update the recurrence is seeded with their plain mean.
// =============================================================================

use tracing::debug;

use super::Indicator;
use crate::error::{check_input, check_period, Result};
use crate::types::IndicatorStatus;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    warmup_sum: f64,
    count: usize,
    last: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self> {
        let period = check_period("period", period)?;
        Ok(Self {
            period,
            multiplier: 2.0 / (period + 1) as f64,
            warmup_sum: 0.0,
            count: 0,
            last: None,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub(crate) fn push(&mut self, value: f64) -> Option<f64> {
        self.count += 1;
        self.last = match self.last {
            Some(prev) => Some(value * self.multiplier + prev * (1.0 - self.multiplier)),
            None => {
                self.warmup_sum += value;
                if self.count == self.period {
                    debug!(period = self.period, "EMA seeded");
                    Some(self.warmup_sum / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.last
    }
}

impl Indicator for Ema {
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
        self.warmup_sum = 0.0;
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
        format!("EMA({})", self.period)
    }

    fn status(&self) -> IndicatorStatus {
        let status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        match self.last {
            Some(v) => status.with("ema", v),
            None => status,
        }
    }
}
