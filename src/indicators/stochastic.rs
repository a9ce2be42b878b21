// =============================================================================
// Stochastic Oscillator — rolling-extremum oscillator
// =============================================================================
//
//   %K = 100 * (close - LL_k) / (HH_k - LL_k)      clamped to [0, 100]
//   %D = SMA_d(%K)
//
// HH_k / LL_k are the highest high and lowest low of the last `k_period`
// bars, tracked with monotonic deques.  A collapsed range (HH == LL) yields
// %K = 0 instead of a division by zero.

use serde::Serialize;
use tracing::debug;

use super::sma::Sma;
use super::window::{Extremum, RollingExtremum};
use super::Indicator;
use crate::error::{check_period, Result};
use crate::types::{Hlc, IndicatorStatus};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticOutput {
    /// Fast %K.
    pub k: f64,
    /// Smoothed %D; `None` until `d_period` %K values exist.  Registry
    /// dispatch reports such outputs as pending.
    pub d: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    highs: RollingExtremum,
    lows: RollingExtremum,
    smooth: Sma,
    count: usize,
    last: Option<StochasticOutput>,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Result<Self> {
        let k_period = check_period("k_period", k_period)?;
        let d_period = check_period("d_period", d_period)?;
        Ok(Self {
            k_period,
            highs: RollingExtremum::new(Extremum::Max, k_period)?,
            lows: RollingExtremum::new(Extremum::Min, k_period)?,
            smooth: Sma::new(d_period)?,
            count: 0,
            last: None,
        })
    }

    pub fn k_period(&self) -> usize {
        self.k_period
    }

    pub fn d_period(&self) -> usize {
        self.smooth.period()
    }

    pub(crate) fn push(&mut self, bar: Hlc) -> Option<StochasticOutput> {
        self.count += 1;
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        if !self.highs.is_full() {
            return None;
        }

        let hh = self.highs.value()?;
        let ll = self.lows.value()?;
        let range = hh - ll;
        let k = if range > 0.0 {
            (100.0 * (bar.close - ll) / range).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let d = self.smooth.push(k);
        if d.is_some() && self.last.map_or(true, |o| o.d.is_none()) {
            debug!(
                k_period = self.k_period,
                d_period = self.smooth.period(),
                count = self.count,
                "stochastic ready"
            );
        }

        self.last = Some(StochasticOutput { k, d });
        self.last
    }
}

impl Indicator for Stochastic {
    type Input = Hlc;
    type Output = StochasticOutput;

    fn update(&mut self, bar: Hlc) -> Result<Option<StochasticOutput>> {
        bar.validate()?;
        Ok(self.push(bar))
    }

    fn current(&self) -> Option<StochasticOutput> {
        self.last
    }

    fn reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.smooth.reset();
        self.count = 0;
        self.last = None;
    }

    /// Ready once %D exists.
    fn is_ready(&self) -> bool {
        self.smooth.is_ready()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn label(&self) -> String {
        format!("STOCH({},{})", self.k_period, self.smooth.period())
    }

    fn status(&self) -> IndicatorStatus {
        let mut status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        if let Some(o) = self.last {
            status = status.with("k", o.k);
            if let Some(d) = o.d {
                status = status.with("d", d);
            }
        }
        status
    }
}
