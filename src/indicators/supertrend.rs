// =============================================================================
// Supertrend — ATR band-flip trend indicator
// =============================================================================
//
// Candidate bands around the bar midpoint:
//   basic_upper = (H + L) / 2 + multiplier * ATR
//   basic_lower = (H + L) / 2 - multiplier * ATR
//
// Final bands only tighten:
//   final_upper = basic_upper  if basic_upper < prev_upper or prev_close > prev_upper
//                 prev_upper   otherwise
//   final_lower = basic_lower  if basic_lower > prev_lower or prev_close < prev_lower
//                 prev_lower   otherwise
//
// Direction flips only when the close crosses the band opposite to the
// current direction (compared against the previous bar's final band):
//   Down -> Up   when close > prev_upper
//   Up   -> Down when close < prev_lower
//
// The first ready bar starts Up when close >= midpoint, Down otherwise.
// Trend value is the lower band in an uptrend, the upper band in a downtrend.

use serde::Serialize;
use tracing::debug;

use super::atr::Atr;
use super::Indicator;
use crate::error::{check_finite_param, check_period, Result};
use crate::types::{Direction, Hlc, IndicatorStatus};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupertrendOutput {
    pub value: f64,
    pub direction: Direction,
    pub upper: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    multiplier: f64,
    atr: Atr,
    prev_close: Option<f64>,
    count: usize,
    last: Option<SupertrendOutput>,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64) -> Result<Self> {
        let period = check_period("period", period)?;
        let multiplier = check_finite_param("multiplier", multiplier)?;
        Ok(Self {
            multiplier,
            atr: Atr::new(period)?,
            prev_close: None,
            count: 0,
            last: None,
        })
    }

    pub fn period(&self) -> usize {
        self.atr.period()
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Current ATR reading of the owned range recurrence.
    pub fn atr(&self) -> Option<f64> {
        self.atr.current()
    }

    pub(crate) fn push(&mut self, bar: Hlc) -> Option<SupertrendOutput> {
        self.count += 1;
        let prev_close = self.prev_close.replace(bar.close);
        let atr = self.atr.push(bar)?;

        let mid = bar.midpoint();
        let basic_upper = mid + self.multiplier * atr;
        let basic_lower = mid - self.multiplier * atr;

        let out = match (self.last, prev_close) {
            (Some(prev), Some(pc)) => {
                let upper = if basic_upper < prev.upper || pc > prev.upper {
                    basic_upper
                } else {
                    prev.upper
                };
                let lower = if basic_lower > prev.lower || pc < prev.lower {
                    basic_lower
                } else {
                    prev.lower
                };
                let direction = match prev.direction {
                    Direction::Down if bar.close > prev.upper => Direction::Up,
                    Direction::Up if bar.close < prev.lower => Direction::Down,
                    d => d,
                };
                if direction != prev.direction {
                    debug!(%direction, close = bar.close, "supertrend flipped");
                }
                SupertrendOutput {
                    value: band_for(direction, upper, lower),
                    direction,
                    upper,
                    lower,
                }
            }
            _ => {
                let direction = if bar.close >= mid {
                    Direction::Up
                } else {
                    Direction::Down
                };
                debug!(%direction, "supertrend ready");
                SupertrendOutput {
                    value: band_for(direction, basic_upper, basic_lower),
                    direction,
                    upper: basic_upper,
                    lower: basic_lower,
                }
            }
        };

        self.last = Some(out);
        self.last
    }
}

fn band_for(direction: Direction, upper: f64, lower: f64) -> f64 {
    match direction {
        Direction::Up => lower,
        Direction::Down => upper,
    }
}

impl Indicator for Supertrend {
    type Input = Hlc;
    type Output = SupertrendOutput;

    fn update(&mut self, bar: Hlc) -> Result<Option<SupertrendOutput>> {
        bar.validate()?;
        Ok(self.push(bar))
    }

    fn current(&self) -> Option<SupertrendOutput> {
        self.last
    }

    fn reset(&mut self) {
        self.atr.reset();
        self.prev_close = None;
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
        format!("SUPERTREND({},{})", self.atr.period(), self.multiplier)
    }

    fn status(&self) -> IndicatorStatus {
        let status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        match self.last {
            Some(o) => status
                .with("value", o.value)
                .with("direction", o.direction.signum())
                .with("upper", o.upper)
                .with("lower", o.lower),
            None => status,
        }
    }
}
