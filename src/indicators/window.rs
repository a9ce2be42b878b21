// =============================================================================
// Rolling Windows — bounded FIFO buffers with co-maintained aggregates
// =============================================================================
//
// `RollingWindow` keeps the last `capacity` values together with a running
// sum and sum-of-squares.  Each value is added to the aggregates exactly once
// on insertion and removed exactly once on eviction, so the hot path never
// re-sums the window.
//
// Non-finite entries are counted instead of summed.  While any such entry is
// inside the window the aggregate outputs are unavailable; once it is evicted
// the sums are intact because it never entered them.
//
// Finite but huge entries (|x| beyond ~1e154) overflow the sum of squares,
// and any entry far larger than the rest of the window leaves cancellation
// residue behind when it is subtracted out.  An eviction that overflows the
// aggregates, or removes a square more than `RESYNC_RATIO` times what is
// left, rebuilds both sums from the stored values.  While an overflowing
// entry is still inside the window the variance is reported as unavailable.
//
// `RollingExtremum` tracks the rolling max or min with a monotonic deque of
// (sequence, value) pairs: O(1) amortised per push.

use std::collections::VecDeque;

use crate::error::{check_period, Result};

const RESYNC_RATIO: f64 = 1e8;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
    non_finite: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = check_period("period", capacity)?;
        Ok(Self {
            capacity,
            values: VecDeque::with_capacity(capacity + 1),
            sum: 0.0,
            sum_sq: 0.0,
            non_finite: 0,
        })
    }

    /// Append `value`, evicting (and returning) the oldest entry once the
    /// window is full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if value.is_finite() {
            self.sum += value;
            self.sum_sq += value * value;
        } else {
            self.non_finite += 1;
        }
        self.values.push_back(value);

        if self.values.len() <= self.capacity {
            return None;
        }

        let evicted = self.values.pop_front()?;
        if evicted.is_finite() {
            self.sum -= evicted;
            self.sum_sq -= evicted * evicted;
            if !self.sum.is_finite()
                || !self.sum_sq.is_finite()
                || evicted * evicted > RESYNC_RATIO * self.sum_sq.abs()
            {
                self.resync();
            }
        } else {
            self.non_finite -= 1;
        }
        Some(evicted)
    }

    fn resync(&mut self) {
        let (sum, sum_sq) = self
            .values
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0.0), |(s, sq), &v| (s + v, sq + v * v));
        self.sum = sum;
        self.sum_sq = sum_sq;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Number of NaN / infinite entries currently inside the window.
    pub fn non_finite_count(&self) -> usize {
        self.non_finite
    }

    /// Full and free of non-finite entries.
    pub fn is_valid(&self) -> bool {
        self.is_full() && self.non_finite == 0
    }

    pub fn sum(&self) -> Option<f64> {
        (self.is_valid() && self.sum.is_finite()).then_some(self.sum)
    }

    pub fn mean(&self) -> Option<f64> {
        self.sum().map(|s| s / self.capacity as f64)
    }

    /// Population variance, floored at zero against round-off.  `None` while
    /// the sum of squares has overflowed.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        let n = self.capacity as f64;
        let var = self.sum_sq / n - mean * mean;
        var.is_finite().then(|| var.max(0.0))
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.sum = 0.0;
        self.sum_sq = 0.0;
        self.non_finite = 0;
    }
}

/// Which extremum a [`RollingExtremum`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

#[derive(Debug, Clone)]
pub struct RollingExtremum {
    kind: Extremum,
    period: usize,
    seq: usize,
    deque: VecDeque<(usize, f64)>,
}

impl RollingExtremum {
    pub fn new(kind: Extremum, period: usize) -> Result<Self> {
        let period = check_period("period", period)?;
        Ok(Self {
            kind,
            period,
            seq: 0,
            deque: VecDeque::with_capacity(period),
        })
    }

    pub fn push(&mut self, value: f64) {
        let kind = self.kind;
        let dominated = |back: f64| match kind {
            Extremum::Max => back <= value,
            Extremum::Min => back >= value,
        };
        while matches!(self.deque.back(), Some(&(_, back)) if dominated(back)) {
            self.deque.pop_back();
        }
        self.deque.push_back((self.seq, value));
        self.seq += 1;

        // Drop the front once it slides out of the window.
        while matches!(self.deque.front(), Some(&(idx, _)) if idx + self.period < self.seq) {
            self.deque.pop_front();
        }
    }

    /// True once `period` values have been pushed.
    pub fn is_full(&self) -> bool {
        self.seq >= self.period
    }

    pub fn value(&self) -> Option<f64> {
        self.deque.front().map(|&(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.seq = 0;
        self.deque.clear();
    }
}
