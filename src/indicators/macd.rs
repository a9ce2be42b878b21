// =============================================================================
// MACD — Moving Average Convergence / Divergence
// =============================================================================
//
//   macd      = EMA_fast(close) - EMA_slow(close)
//   signal    = EMA_signal(macd)
//   histogram = macd - signal
//
// The signal EMA has its own warm-up, counted from the first bar on which the
// macd line itself exists, not from the first close.  The indicator reports
// ready only once all three EMAs are ready.

use serde::Serialize;
use tracing::debug;

use super::ema::Ema;
use super::Indicator;
use crate::error::{check_input, IndicatorError, Result};
use crate::types::IndicatorStatus;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    count: usize,
    line: Option<f64>,
    last: Option<MacdOutput>,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Result<Self> {
        let fast = Ema::new(fast_period).map_err(|_| IndicatorError::InvalidPeriod {
            name: "fast_period",
            value: fast_period as i64,
        })?;
        let slow = Ema::new(slow_period).map_err(|_| IndicatorError::InvalidPeriod {
            name: "slow_period",
            value: slow_period as i64,
        })?;
        let signal = Ema::new(signal_period).map_err(|_| IndicatorError::InvalidPeriod {
            name: "signal_period",
            value: signal_period as i64,
        })?;
        Ok(Self {
            fast,
            slow,
            signal,
            count: 0,
            line: None,
            last: None,
        })
    }

    /// The macd line alone, available before the signal line warms up.
    pub fn line(&self) -> Option<f64> {
        self.line
    }

    pub(crate) fn push(&mut self, close: f64) -> Option<MacdOutput> {
        self.count += 1;
        let fast = self.fast.push(close);
        let slow = self.slow.push(close);

        let (Some(fast), Some(slow)) = (fast, slow) else {
            return None;
        };
        let line = fast - slow;
        self.line = Some(line);

        let warming = self.last.is_none();
        self.last = self.signal.push(line).map(|signal| MacdOutput {
            macd: line,
            signal,
            histogram: line - signal,
        });
        if warming && self.last.is_some() {
            debug!(count = self.count, label = %self.label(), "macd signal ready");
        }
        self.last
    }
}

impl Indicator for Macd {
    type Input = f64;
    type Output = MacdOutput;

    fn update(&mut self, close: f64) -> Result<Option<MacdOutput>> {
        let close = check_input("close", close)?;
        Ok(self.push(close))
    }

    fn current(&self) -> Option<MacdOutput> {
        self.last
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.count = 0;
        self.line = None;
        self.last = None;
    }

    fn is_ready(&self) -> bool {
        self.fast.is_ready() && self.slow.is_ready() && self.signal.is_ready()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn label(&self) -> String {
        format!(
            "MACD({},{},{})",
            self.fast.period(),
            self.slow.period(),
            self.signal.period()
        )
    }

    fn status(&self) -> IndicatorStatus {
        let status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        match self.last {
            Some(o) => status
                .with("macd", o.macd)
                .with("signal", o.signal)
                .with("histogram", o.histogram),
            None => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference;

    #[test]
    fn macd_rejects_zero_periods() {
        assert!(matches!(
            Macd::new(0, 26, 9),
            Err(IndicatorError::InvalidPeriod { name: "fast_period", .. })
        ));
        assert!(matches!(
            Macd::new(12, 0, 9),
            Err(IndicatorError::InvalidPeriod { name: "slow_period", .. })
        ));
        assert!(matches!(
            Macd::new(12, 26, 0),
            Err(IndicatorError::InvalidPeriod { name: "signal_period", .. })
        ));
    }

    #[test]
    fn signal_warmup_starts_when_line_exists() {
        let mut macd = Macd::new(3, 5, 4).unwrap();
        let closes: Vec<f64> = (1..=20).map(|x| x as f64 * 1.5).collect();
        let mut first_line = None;
        let mut first_ready = None;
        for (i, &c) in closes.iter().enumerate() {
            let out = macd.update(c).unwrap();
            if first_line.is_none() && macd.line().is_some() {
                first_line = Some(i);
            }
            if first_ready.is_none() && out.is_some() {
                first_ready = Some(i);
            }
        }
        // slow EMA seeds on bar 5 (index 4); signal needs 4 line values.
        assert_eq!(first_line, Some(4));
        assert_eq!(first_ready, Some(7));
        assert!(macd.is_ready());
    }

    #[test]
    fn macd_matches_batch_composition() {
        let closes = reference::random_walk(200, 100.0);
        let fast = reference::ema(&closes, 12);
        let slow = reference::ema(&closes, 26);
        let line: Vec<f64> = fast
            .iter()
            .zip(&slow)
            .filter_map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = reference::ema(&line, 9);
        let offset = closes.len() - line.len();

        let mut macd = Macd::new(12, 26, 9).unwrap();
        for (i, &c) in closes.iter().enumerate() {
            let out = macd.update(c).unwrap();
            let expected = i
                .checked_sub(offset)
                .and_then(|j| signal[j].map(|s| (line[j], s)));
            match (out, expected) {
                (None, None) => {}
                (Some(o), Some((l, s))) => {
                    assert!((o.macd - l).abs() < 1e-9);
                    assert!((o.signal - s).abs() < 1e-9);
                    assert!((o.histogram - (l - s)).abs() < 1e-9);
                }
                other => panic!("readiness mismatch at {i}: {other:?}"),
            }
        }
    }

    #[test]
    fn constant_input_gives_zero_macd() {
        let mut macd = Macd::new(12, 26, 9).unwrap();
        let mut last = None;
        for _ in 0..60 {
            last = macd.update(250.0).unwrap();
        }
        let o = last.unwrap();
        assert!(o.macd.abs() < 1e-9);
        assert!(o.histogram.abs() < 1e-9);
    }

    #[test]
    fn reset_replays_identically() {
        let closes = reference::random_walk(80, 30.0);
        let mut macd = Macd::new(5, 10, 3).unwrap();
        let a: Vec<_> = closes.iter().map(|&c| macd.update(c).unwrap()).collect();
        macd.reset();
        assert!(macd.line().is_none());
        let b: Vec<_> = closes.iter().map(|&c| macd.update(c).unwrap()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn nan_rejected_without_mutation() {
        let closes = reference::random_walk(40, 30.0);
        let mut macd = Macd::new(5, 10, 3).unwrap();
        let mut twin = Macd::new(5, 10, 3).unwrap();
        for &c in &closes {
            macd.update(c).unwrap();
            twin.update(c).unwrap();
        }
        let before = (macd.status(), macd.line(), macd.current());

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = macd.update(bad).unwrap_err();
            assert!(matches!(err, IndicatorError::NonFiniteInput { field: "close", .. }));
        }
        assert_eq!((macd.status(), macd.line(), macd.current()), before);
        assert_eq!(macd.update(31.5).unwrap(), twin.update(31.5).unwrap());
    }
}
