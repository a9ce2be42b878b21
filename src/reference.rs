// =============================================================================
// Batch Reference Implementations (test-only)
// =============================================================================
//
// Full-history recomputations used to cross-check the streaming recurrences.
// Each function returns one entry per input, `None` during the look-back.
// Nothing in the engine calls these.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::Hlc;

pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            Some(window.iter().sum::<f64>() / period as f64)
        })
        .collect()
}

pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let var = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
            Some(var.sqrt())
        })
        .collect()
}

/// EMA seeded with the SMA of the first `period` values.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let multiplier = 2.0 / (period + 1) as f64;
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(prev);
    for (i, &v) in values.iter().enumerate().skip(period) {
        prev = v * multiplier + prev * (1.0 - multiplier);
        out[i] = Some(prev);
    }
    out
}

/// Wilder RSI; the first value lands on index `period`.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (sum_gain, sum_loss) = deltas[..period].iter().fold((0.0, 0.0), |(g, l), &d| {
        if d > 0.0 {
            (g + d, l)
        } else {
            (g, l - d)
        }
    });
    let p = period as f64;
    let mut avg_gain = sum_gain / p;
    let mut avg_loss = sum_loss / p;
    out[period] = Some(from_averages(avg_gain, avg_loss));
    for (i, &d) in deltas.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (p - 1.0) + d.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-d).max(0.0)) / p;
        out[i + 1] = Some(from_averages(avg_gain, avg_loss));
    }
    out
}

fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Wilder ATR where the first bar's true range is `high - low`.
pub fn atr(bars: &[Hlc], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }
    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let hl = b.high - b.low;
            if i == 0 {
                return hl;
            }
            let prev_close = bars[i - 1].close;
            hl.max((b.high - prev_close).abs()).max((b.low - prev_close).abs())
        })
        .collect();
    let p = period as f64;
    let mut avg = tr[..period].iter().sum::<f64>() / p;
    out[period - 1] = Some(avg);
    for (i, &t) in tr.iter().enumerate().skip(period) {
        avg = (avg * (p - 1.0) + t) / p;
        out[i] = Some(avg);
    }
    out
}

/// Seed shared by every generated series so runs are reproducible.
const SEED: u64 = 0xA0_2026_57AE;

/// Seeded random walk with unit-bounded steps, floored at 1.0.
pub fn random_walk(n: usize, start: f64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut price = start;
    (0..n)
        .map(|_| {
            price = (price + rng.gen_range(-1.0..=1.0)).max(1.0);
            price
        })
        .collect()
}

/// Bars built around a close series with a fixed half-spread.
pub fn bars_from_closes(closes: &[f64], half_spread: f64) -> Vec<Hlc> {
    closes
        .iter()
        .map(|&c| Hlc::new(c + half_spread, c - half_spread, c))
        .collect()
}

/// Arbitrary close series in a realistic price range.
pub fn arb_closes(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, min_len..=max_len)
}

/// Arbitrary bars with `low <= close <= high`.
pub fn arb_bars(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<Hlc>> {
    prop::collection::vec(
        (1.0..1000.0_f64, 0.0..0.1_f64, 0.0..0.1_f64),
        min_len..=max_len,
    )
    .prop_map(|data| {
        data.into_iter()
            .map(|(base, up, down)| Hlc::new(base * (1.0 + up), base * (1.0 - down), base))
            .collect()
    })
}
