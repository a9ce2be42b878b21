// =============================================================================
// Confirmed Supertrend — whipsaw filter with a volatility confidence score
// =============================================================================
//
// The raw Supertrend direction is pushed into a window of the last
// `confirmation_bars` readings.  The confirmed direction changes only when
// that window is full and every entry agrees, so a single-bar flip never
// reaches the output.
//
// Confidence (0 when nothing is confirmed yet):
//   volatility filter on : clamp(1 - 5 * ATR / close, 0, 1)   (0 when close <= 0)
//   volatility filter off: 1

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use crate::error::{check_finite_param, check_period, Result};
use crate::indicators::{Atr, Indicator, Supertrend};
use crate::types::{Direction, Hlc, IndicatorStatus};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfirmedTrendOutput {
    /// Supertrend line value.
    pub value: f64,
    /// Unfiltered Supertrend direction of this bar.
    pub raw_direction: Direction,
    pub confirmed: Option<Direction>,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct ConfirmedSupertrend {
    supertrend: Supertrend,
    atr: Atr,
    confirmation_bars: usize,
    recent: VecDeque<Direction>,
    volatility_filter: bool,
    confirmed: Option<Direction>,
    count: usize,
    last: Option<ConfirmedTrendOutput>,
}

impl ConfirmedSupertrend {
    pub fn new(
        period: usize,
        multiplier: f64,
        confirmation_bars: usize,
        volatility_filter: bool,
    ) -> Result<Self> {
        let period = check_period("period", period)?;
        let multiplier = check_finite_param("multiplier", multiplier)?;
        let confirmation_bars = check_period("confirmation_bars", confirmation_bars)?;
        Ok(Self {
            supertrend: Supertrend::new(period, multiplier)?,
            atr: Atr::new(period)?,
            confirmation_bars,
            recent: VecDeque::with_capacity(confirmation_bars + 1),
            volatility_filter,
            confirmed: None,
            count: 0,
            last: None,
        })
    }

    pub fn confirmed_direction(&self) -> Option<Direction> {
        self.confirmed
    }

    fn confidence(&self, close: f64) -> f64 {
        if self.confirmed.is_none() {
            return 0.0;
        }
        if !self.volatility_filter {
            return 1.0;
        }
        match self.atr.current() {
            Some(atr) if close > 0.0 => (1.0 - 5.0 * (atr / close)).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

impl Indicator for ConfirmedSupertrend {
    type Input = Hlc;
    type Output = ConfirmedTrendOutput;

    fn update(&mut self, bar: Hlc) -> Result<Option<ConfirmedTrendOutput>> {
        bar.validate()?;
        self.count += 1;
        self.atr.push(bar);

        let Some(trend) = self.supertrend.push(bar) else {
            return Ok(None);
        };

        self.recent.push_back(trend.direction);
        if self.recent.len() > self.confirmation_bars {
            self.recent.pop_front();
        }
        if self.recent.len() == self.confirmation_bars
            && self.recent.iter().all(|d| *d == trend.direction)
            && self.confirmed != Some(trend.direction)
        {
            debug!(
                direction = %trend.direction,
                bars = self.confirmation_bars,
                "trend direction confirmed"
            );
            self.confirmed = Some(trend.direction);
        }

        self.last = Some(ConfirmedTrendOutput {
            value: trend.value,
            raw_direction: trend.direction,
            confirmed: self.confirmed,
            confidence: self.confidence(bar.close),
        });
        Ok(self.last)
    }

    fn current(&self) -> Option<ConfirmedTrendOutput> {
        self.last
    }

    fn reset(&mut self) {
        self.supertrend.reset();
        self.atr.reset();
        self.recent.clear();
        self.confirmed = None;
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
            "CONFIRMED_SUPERTREND({},{},{})",
            self.supertrend.period(),
            self.supertrend.multiplier(),
            self.confirmation_bars
        )
    }

    fn status(&self) -> IndicatorStatus {
        let mut status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        if let Some(o) = self.last {
            status = status
                .with("value", o.value)
                .with("raw_direction", o.raw_direction.signum())
                .with("confidence", o.confidence);
            if let Some(d) = o.confirmed {
                status = status.with("confirmed_direction", d.signum());
            }
        }
        status
    }
}
