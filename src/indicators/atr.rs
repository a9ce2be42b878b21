// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing, streaming
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
// The very first bar has no previous close and uses H - L.
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_0   = mean of the first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
// =============================================================================

use tracing::debug;

use super::Indicator;
use crate::error::{check_period, Result};
use crate::types::{Hlc, IndicatorStatus};

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    tr_sum: f64,
    count: usize,
    last_tr: Option<f64>,
    last: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self> {
        let period = check_period("period", period)?;
        Ok(Self {
            period,
            prev_close: None,
            tr_sum: 0.0,
            count: 0,
            last_tr: None,
            last: None,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// True range of the most recent bar.
    pub fn true_range(&self) -> Option<f64> {
        self.last_tr
    }

    pub(crate) fn push(&mut self, bar: Hlc) -> Option<f64> {
        let tr = true_range(bar, self.prev_close);
        self.prev_close = Some(bar.close);
        self.last_tr = Some(tr);
        self.count += 1;

        let p = self.period as f64;
        self.last = match self.last {
            Some(prev) => Some((prev * (p - 1.0) + tr) / p),
            None => {
                self.tr_sum += tr;
                if self.count == self.period {
                    debug!(period = self.period, "ATR seeded");
                    Some(self.tr_sum / p)
                } else {
                    None
                }
            }
        };
        self.last
    }
}

impl Indicator for Atr {
    type Input = Hlc;
    type Output = f64;

    fn update(&mut self, bar: Hlc) -> Result<Option<f64>> {
        bar.validate()?;
        Ok(self.push(bar))
    }

    fn current(&self) -> Option<f64> {
        self.last
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.tr_sum = 0.0;
        self.count = 0;
        self.last_tr = None;
        self.last = None;
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn label(&self) -> String {
        format!("ATR({})", self.period)
    }

    fn status(&self) -> IndicatorStatus {
        let mut status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        if let Some(v) = self.last {
            status = status.with("atr", v);
        }
        if let Some(tr) = self.last_tr {
            status = status.with("true_range", tr);
        }
        status
    }
}

fn true_range(bar: Hlc, prev_close: Option<f64>) -> f64 {
    let hl = bar.high - bar.low;
    match prev_close {
        Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
        None => hl,
    }
}
