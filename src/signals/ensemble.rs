// =============================================================================
// Ensemble Signal — weighted aggregation of normalised indicators
// =============================================================================
//
// Owns one RSI, one MACD, one Stochastic and one Supertrend.  Each reading is
// mapped onto [-1, 1] by a fixed rule:
//
//   rsi        : clamp((rsi - 50) / 50)
//   macd       : tanh(100 * histogram / close)       (0 when close == 0)
//   stochastic : clamp((%D - 50) / 50)
//   supertrend : +1 in an uptrend, -1 in a downtrend
//
// score = Σ w_i * n_i / Σ w_i.  Without explicit weights every component
// weighs the same.  The ensemble is ready only when all four components are.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IndicatorError, Result};
use crate::indicators::{Indicator, Macd, Rsi, Stochastic, Supertrend};
use crate::types::{Hlc, IndicatorStatus};

/// Component names, in the order they are scored.
pub const COMPONENTS: [&str; 4] = ["rsi", "macd", "stochastic", "supertrend"];

/// Parameters of the owned components plus optional weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub supertrend_period: usize,
    pub supertrend_multiplier: f64,
    /// Component name -> weight.  `None` means equal weights; components
    /// missing from a supplied map weigh zero.
    pub weights: Option<HashMap<String, f64>>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stoch_k_period: 14,
            stoch_d_period: 3,
            supertrend_period: 10,
            supertrend_multiplier: 3.0,
            weights: None,
        }
    }
}

/// The contribution of a single component to the final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentScore {
    pub name: &'static str,
    /// Normalised weight (all weights sum to 1).
    pub weight: f64,
    /// Component reading mapped onto [-1, 1].
    pub normalized: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleOutput {
    /// Weighted score in [-1, 1].
    pub score: f64,
    pub components: Vec<ComponentScore>,
}

impl EnsembleOutput {
    pub fn component(&self, name: &str) -> Option<&ComponentScore> {
        self.components.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct EnsembleSignal {
    rsi: Rsi,
    macd: Macd,
    stochastic: Stochastic,
    supertrend: Supertrend,
    /// Normalised, in `COMPONENTS` order.
    weights: [f64; 4],
    count: usize,
    last: Option<EnsembleOutput>,
}

impl EnsembleSignal {
    pub fn new(config: &EnsembleConfig) -> Result<Self> {
        let weights = resolve_weights(config.weights.as_ref())?;
        Ok(Self {
            rsi: Rsi::new(config.rsi_period)?,
            macd: Macd::new(config.macd_fast, config.macd_slow, config.macd_signal)?,
            stochastic: Stochastic::new(config.stoch_k_period, config.stoch_d_period)?,
            supertrend: Supertrend::new(config.supertrend_period, config.supertrend_multiplier)?,
            weights,
            count: 0,
            last: None,
        })
    }

    /// Normalised weight of a component, if the name is known.
    pub fn weight(&self, name: &str) -> Option<f64> {
        COMPONENTS
            .iter()
            .position(|c| *c == name)
            .map(|i| self.weights[i])
    }

    fn all_ready(&self) -> bool {
        self.rsi.is_ready()
            && self.macd.is_ready()
            && self.stochastic.is_ready()
            && self.supertrend.is_ready()
    }

    fn score(&self, close: f64) -> Option<EnsembleOutput> {
        let rsi = self.rsi.current()?;
        let macd = self.macd.current()?;
        let stoch = self.stochastic.current()?.d?;
        let trend = self.supertrend.current()?;

        let macd_norm = if close == 0.0 {
            0.0
        } else {
            (100.0 * macd.histogram / close).tanh()
        };
        let normalized = [
            ((rsi - 50.0) / 50.0).clamp(-1.0, 1.0),
            macd_norm,
            ((stoch - 50.0) / 50.0).clamp(-1.0, 1.0),
            trend.direction.signum(),
        ];

        let components: Vec<ComponentScore> = COMPONENTS
            .iter()
            .zip(normalized)
            .zip(self.weights)
            .map(|((&name, normalized), weight)| ComponentScore {
                name,
                weight,
                normalized,
                contribution: weight * normalized,
            })
            .collect();
        let score = components
            .iter()
            .map(|c| c.contribution)
            .sum::<f64>()
            .clamp(-1.0, 1.0);

        Some(EnsembleOutput { score, components })
    }
}

/// Validate and normalise the weight map into `COMPONENTS` order.
fn resolve_weights(weights: Option<&HashMap<String, f64>>) -> Result<[f64; 4]> {
    let Some(map) = weights else {
        return Ok([0.25; 4]);
    };

    if let Some(unknown) = map.keys().find(|k| !COMPONENTS.contains(&k.as_str())) {
        return Err(IndicatorError::InvalidWeights(format!(
            "unknown component `{unknown}` (expected one of {COMPONENTS:?})"
        )));
    }

    let mut resolved = [0.0; 4];
    for (slot, name) in resolved.iter_mut().zip(COMPONENTS) {
        let w = map.get(name).copied().unwrap_or(0.0);
        if !w.is_finite() {
            return Err(IndicatorError::InvalidWeights(format!(
                "weight for `{name}` is not finite"
            )));
        }
        if w < 0.0 {
            return Err(IndicatorError::InvalidWeights(format!(
                "weight for `{name}` is negative ({w})"
            )));
        }
        *slot = w;
    }

    let total: f64 = resolved.iter().sum();
    if total <= 0.0 {
        return Err(IndicatorError::InvalidWeights("weights sum to zero".into()));
    }
    for w in &mut resolved {
        *w /= total;
    }
    Ok(resolved)
}

impl Indicator for EnsembleSignal {
    type Input = Hlc;
    type Output = EnsembleOutput;

    fn update(&mut self, bar: Hlc) -> Result<Option<EnsembleOutput>> {
        bar.validate()?;
        let was_ready = self.last.is_some();

        self.count += 1;
        self.rsi.push(bar.close);
        self.macd.push(bar.close);
        self.stochastic.push(bar);
        self.supertrend.push(bar);

        self.last = if self.all_ready() {
            self.score(bar.close)
        } else {
            None
        };
        if !was_ready && self.last.is_some() {
            debug!(count = self.count, "ensemble warmed up");
        }
        Ok(self.last.clone())
    }

    fn current(&self) -> Option<EnsembleOutput> {
        self.last.clone()
    }

    fn reset(&mut self) {
        self.rsi.reset();
        self.macd.reset();
        self.stochastic.reset();
        self.supertrend.reset();
        self.count = 0;
        self.last = None;
    }

    fn is_ready(&self) -> bool {
        self.all_ready()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn label(&self) -> String {
        format!(
            "ENSEMBLE[{} {} {} {}]",
            self.rsi.label(),
            self.macd.label(),
            self.stochastic.label(),
            self.supertrend.label()
        )
    }

    fn status(&self) -> IndicatorStatus {
        let mut status = IndicatorStatus::new(self.label(), self.count, self.is_ready());
        if let Some(out) = &self.last {
            status = status.with("score", out.score);
            for c in &out.components {
                status = status.with(c.name, c.normalized);
            }
        }
        status
    }
}
