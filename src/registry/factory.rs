// =============================================================================
// Indicator factory — closed sum type + name/keyword construction
// =============================================================================
//
// `AnyIndicator` is the closed set of indicators the registry can host.  Each
// variant declares its input arity so the registry can hand it either the
// close alone or the full high/low/close triple.
//
// `create_indicator` resolves a symbolic name (aliases accepted, case and
// separators ignored) and builds the instance from a JSON keyword object.
// Omitted keywords fall back to the `default_*` helpers below; keywords the
// kind does not understand are rejected instead of silently ignored.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{check_finite_param, IndicatorError, Result};
use crate::indicators::{
    Atr, BollingerBands, BollingerOutput, Ema, Indicator, Macd, MacdOutput, Rsi, Sma, Stochastic,
    StochasticOutput, Supertrend, SupertrendOutput,
};
use crate::signals::{
    AdaptiveRsi, AdaptiveRsiOutput, ConfirmedSupertrend, ConfirmedTrendOutput, EnsembleConfig,
    EnsembleOutput, EnsembleSignal,
};
use crate::types::{Bar, IndicatorStatus, InputArity};

/// Keyword arguments for [`create_indicator`].
pub type Params = Map<String, Value>;

// =============================================================================
// Default-value helpers
// =============================================================================

pub(crate) fn default_ma_period() -> usize {
    20
}

pub(crate) fn default_rsi_period() -> usize {
    14
}

pub(crate) fn default_atr_period() -> usize {
    14
}

pub(crate) fn default_macd_fast() -> usize {
    12
}

pub(crate) fn default_macd_slow() -> usize {
    26
}

pub(crate) fn default_macd_signal() -> usize {
    9
}

pub(crate) fn default_bollinger_period() -> usize {
    20
}

pub(crate) fn default_bollinger_std_dev() -> f64 {
    2.0
}

pub(crate) fn default_stoch_k_period() -> usize {
    14
}

pub(crate) fn default_stoch_d_period() -> usize {
    3
}

pub(crate) fn default_supertrend_period() -> usize {
    10
}

pub(crate) fn default_supertrend_multiplier() -> f64 {
    3.0
}

pub(crate) fn default_arsi_min_period() -> usize {
    7
}

pub(crate) fn default_arsi_max_period() -> usize {
    28
}

pub(crate) fn default_volatility_window() -> usize {
    20
}

pub(crate) fn default_confirmation_bars() -> usize {
    3
}

pub(crate) fn default_true() -> bool {
    true
}

// =============================================================================
// IndicatorKind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
    Atr,
    Macd,
    Bollinger,
    Stochastic,
    Supertrend,
    Ensemble,
    AdaptiveRsi,
    ConfirmedSupertrend,
}

/// Lower-case, trim, and fold `-` / spaces into `_`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 11] = [
        Self::Sma,
        Self::Ema,
        Self::Rsi,
        Self::Atr,
        Self::Macd,
        Self::Bollinger,
        Self::Stochastic,
        Self::Supertrend,
        Self::Ensemble,
        Self::AdaptiveRsi,
        Self::ConfirmedSupertrend,
    ];

    /// Resolve a canonical name or alias.
    pub fn from_name(name: &str) -> Result<Self> {
        let kind = match normalize_name(name).as_str() {
            "sma" | "ma" | "simple_moving_average" => Self::Sma,
            "ema" | "exponential_moving_average" => Self::Ema,
            "rsi" | "relative_strength_index" => Self::Rsi,
            "atr" | "average_true_range" => Self::Atr,
            "macd" | "moving_average_convergence_divergence" => Self::Macd,
            "bollinger" | "bbands" | "bollinger_bands" => Self::Bollinger,
            "stochastic" | "stoch" | "stochastic_oscillator" => Self::Stochastic,
            "supertrend" | "super_trend" => Self::Supertrend,
            "ensemble" | "ensemble_signal" | "composite_signal" => Self::Ensemble,
            "adaptive_rsi" | "arsi" => Self::AdaptiveRsi,
            "confirmed_supertrend" | "filtered_supertrend" | "supertrend_confirmed" => {
                Self::ConfirmedSupertrend
            }
            _ => return Err(IndicatorError::UnknownIndicator(name.to_string())),
        };
        Ok(kind)
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Sma => "sma",
            Self::Ema => "ema",
            Self::Rsi => "rsi",
            Self::Atr => "atr",
            Self::Macd => "macd",
            Self::Bollinger => "bollinger",
            Self::Stochastic => "stochastic",
            Self::Supertrend => "supertrend",
            Self::Ensemble => "ensemble",
            Self::AdaptiveRsi => "adaptive_rsi",
            Self::ConfirmedSupertrend => "confirmed_supertrend",
        }
    }

    pub fn arity(self) -> InputArity {
        match self {
            Self::Sma | Self::Ema | Self::Rsi | Self::Macd | Self::Bollinger | Self::AdaptiveRsi => {
                InputArity::Close
            }
            Self::Atr
            | Self::Stochastic
            | Self::Supertrend
            | Self::Ensemble
            | Self::ConfirmedSupertrend => InputArity::HighLowClose,
        }
    }

    /// Keywords understood by this kind.
    pub fn accepted_params(self) -> &'static [&'static str] {
        match self {
            Self::Sma | Self::Ema | Self::Rsi | Self::Atr => &["period"],
            Self::Macd => &["fast_period", "slow_period", "signal_period"],
            Self::Bollinger => &["period", "std_dev"],
            Self::Stochastic => &["k_period", "d_period"],
            Self::Supertrend => &["period", "multiplier"],
            Self::Ensemble => &[
                "rsi_period",
                "macd_fast",
                "macd_slow",
                "macd_signal",
                "stoch_k_period",
                "stoch_d_period",
                "supertrend_period",
                "supertrend_multiplier",
                "weights",
            ],
            Self::AdaptiveRsi => &["min_period", "max_period", "volatility_window"],
            Self::ConfirmedSupertrend => &[
                "period",
                "multiplier",
                "confirmation_bars",
                "volatility_filter",
            ],
        }
    }

    /// Build an instance of this kind from keyword arguments.
    pub fn build(self, params: &Params) -> Result<AnyIndicator> {
        let accepted = self.accepted_params();
        if let Some(key) = params.keys().find(|k| !accepted.contains(&k.as_str())) {
            return Err(IndicatorError::parameter(
                key.as_str(),
                format!("not accepted by `{}` (expected one of {accepted:?})", self),
            ));
        }

        let p = ParamReader { params };
        let indicator = match self {
            Self::Sma => Sma::new(p.period("period", default_ma_period())?)?.into(),
            Self::Ema => Ema::new(p.period("period", default_ma_period())?)?.into(),
            Self::Rsi => Rsi::new(p.period("period", default_rsi_period())?)?.into(),
            Self::Atr => Atr::new(p.period("period", default_atr_period())?)?.into(),
            Self::Macd => Macd::new(
                p.period("fast_period", default_macd_fast())?,
                p.period("slow_period", default_macd_slow())?,
                p.period("signal_period", default_macd_signal())?,
            )?
            .into(),
            Self::Bollinger => BollingerBands::new(
                p.period("period", default_bollinger_period())?,
                p.float("std_dev", default_bollinger_std_dev())?,
            )?
            .into(),
            Self::Stochastic => Stochastic::new(
                p.period("k_period", default_stoch_k_period())?,
                p.period("d_period", default_stoch_d_period())?,
            )?
            .into(),
            Self::Supertrend => Supertrend::new(
                p.period("period", default_supertrend_period())?,
                p.float("multiplier", default_supertrend_multiplier())?,
            )?
            .into(),
            Self::Ensemble => {
                let d = EnsembleConfig::default();
                let config = EnsembleConfig {
                    rsi_period: p.period("rsi_period", d.rsi_period)?,
                    macd_fast: p.period("macd_fast", d.macd_fast)?,
                    macd_slow: p.period("macd_slow", d.macd_slow)?,
                    macd_signal: p.period("macd_signal", d.macd_signal)?,
                    stoch_k_period: p.period("stoch_k_period", d.stoch_k_period)?,
                    stoch_d_period: p.period("stoch_d_period", d.stoch_d_period)?,
                    supertrend_period: p.period("supertrend_period", d.supertrend_period)?,
                    supertrend_multiplier: p
                        .float("supertrend_multiplier", d.supertrend_multiplier)?,
                    weights: p.weights("weights")?,
                };
                EnsembleSignal::new(&config)?.into()
            }
            Self::AdaptiveRsi => AdaptiveRsi::new(
                p.period("min_period", default_arsi_min_period())?,
                p.period("max_period", default_arsi_max_period())?,
                p.period("volatility_window", default_volatility_window())?,
            )?
            .into(),
            Self::ConfirmedSupertrend => ConfirmedSupertrend::new(
                p.period("period", default_supertrend_period())?,
                p.float("multiplier", default_supertrend_multiplier())?,
                p.period("confirmation_bars", default_confirmation_bars())?,
                p.flag("volatility_filter", default_true())?,
            )?
            .into(),
        };
        Ok(indicator)
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl FromStr for IndicatorKind {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Build an indicator from a symbolic name and keyword arguments.
///
/// ```
/// use aurora_stream_ta::registry::create_indicator;
///
/// let params = serde_json::json!({ "period": 21 });
/// let rsi = create_indicator("Relative-Strength-Index", params.as_object().unwrap()).unwrap();
/// assert_eq!(rsi.label(), "RSI(21)");
/// ```
pub fn create_indicator(name: &str, params: &Params) -> Result<AnyIndicator> {
    let kind = IndicatorKind::from_name(name)?;
    let indicator = kind.build(params)?;
    debug!(name, %kind, label = %indicator.label(), "indicator created");
    Ok(indicator)
}

// =============================================================================
// Keyword readers
// =============================================================================

struct ParamReader<'a> {
    params: &'a Params,
}

impl ParamReader<'_> {
    fn period(&self, key: &'static str, default: usize) -> Result<usize> {
        let Some(value) = self.params.get(key) else {
            return Ok(default);
        };
        let Value::Number(n) = value else {
            return Err(IndicatorError::parameter(
                key,
                format!("expected a positive integer, got {value}"),
            ));
        };
        if let Some(i) = n.as_i64() {
            if i <= 0 {
                return Err(IndicatorError::InvalidPeriod { name: key, value: i });
            }
        }
        n.as_u64()
            .and_then(|u| usize::try_from(u).ok())
            .ok_or_else(|| {
                IndicatorError::parameter(key, format!("expected a positive integer, got {n}"))
            })
    }

    fn float(&self, key: &'static str, default: f64) -> Result<f64> {
        match self.params.get(key) {
            None => Ok(default),
            Some(value) => {
                let v = value.as_f64().ok_or_else(|| {
                    IndicatorError::parameter(key, format!("expected a number, got {value}"))
                })?;
                check_finite_param(key, v)
            }
        }
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool> {
        match self.params.get(key) {
            None => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| {
                IndicatorError::parameter(key, format!("expected a boolean, got {value}"))
            }),
        }
    }

    fn weights(&self, key: &'static str) -> Result<Option<HashMap<String, f64>>> {
        let value = match self.params.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };
        let Value::Object(map) = value else {
            return Err(IndicatorError::InvalidWeights(format!(
                "expected an object of component weights, got {value}"
            )));
        };
        map.iter()
            .map(|(name, w)| {
                w.as_f64().map(|w| (name.clone(), w)).ok_or_else(|| {
                    IndicatorError::InvalidWeights(format!("weight `{name}` is not a number: {w}"))
                })
            })
            .collect::<Result<HashMap<_, _>>>()
            .map(Some)
    }
}

// =============================================================================
// IndicatorOutput
// =============================================================================

/// One indicator's result for a dispatched bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IndicatorOutput {
    /// Still warming up.  A stochastic stays here until %D exists.
    Pending,
    Value(f64),
    Macd(MacdOutput),
    Bollinger(BollingerOutput),
    Stochastic(StochasticOutput),
    Supertrend(SupertrendOutput),
    Ensemble(EnsembleOutput),
    AdaptiveRsi(AdaptiveRsiOutput),
    ConfirmedTrend(ConfirmedTrendOutput),
}

impl IndicatorOutput {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Headline scalar of the output (MACD line, middle band, %K, trend
    /// line, ensemble score ...).
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Pending => None,
            Self::Value(v) => Some(*v),
            Self::Macd(o) => Some(o.macd),
            Self::Bollinger(o) => Some(o.middle),
            Self::Stochastic(o) => Some(o.k),
            Self::Supertrend(o) => Some(o.value),
            Self::Ensemble(o) => Some(o.score),
            Self::AdaptiveRsi(o) => Some(o.value),
            Self::ConfirmedTrend(o) => Some(o.value),
        }
    }
}

fn output<T>(value: Option<T>, wrap: impl FnOnce(T) -> IndicatorOutput) -> IndicatorOutput {
    value.map_or(IndicatorOutput::Pending, wrap)
}

// Through the registry a %K-only stochastic is still warming up, so that
// `Pending` always agrees with `is_ready`.
fn full_stochastic(value: Option<StochasticOutput>) -> Option<StochasticOutput> {
    value.filter(|o| o.d.is_some())
}

// =============================================================================
// AnyIndicator
// =============================================================================

#[derive(Debug, Clone)]
pub enum AnyIndicator {
    Sma(Sma),
    Ema(Ema),
    Rsi(Rsi),
    Atr(Atr),
    Macd(Macd),
    Bollinger(BollingerBands),
    Stochastic(Stochastic),
    Supertrend(Supertrend),
    Ensemble(EnsembleSignal),
    AdaptiveRsi(AdaptiveRsi),
    ConfirmedSupertrend(ConfirmedSupertrend),
}

macro_rules! each_variant {
    ($value:expr, $ind:ident => $body:expr) => {
        match $value {
            AnyIndicator::Sma($ind) => $body,
            AnyIndicator::Ema($ind) => $body,
            AnyIndicator::Rsi($ind) => $body,
            AnyIndicator::Atr($ind) => $body,
            AnyIndicator::Macd($ind) => $body,
            AnyIndicator::Bollinger($ind) => $body,
            AnyIndicator::Stochastic($ind) => $body,
            AnyIndicator::Supertrend($ind) => $body,
            AnyIndicator::Ensemble($ind) => $body,
            AnyIndicator::AdaptiveRsi($ind) => $body,
            AnyIndicator::ConfirmedSupertrend($ind) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for AnyIndicator {
                fn from(indicator: $ty) -> Self {
                    AnyIndicator::$variant(indicator)
                }
            }
        )*
    };
}

impl_from!(
    Sma(Sma),
    Ema(Ema),
    Rsi(Rsi),
    Atr(Atr),
    Macd(Macd),
    Bollinger(BollingerBands),
    Stochastic(Stochastic),
    Supertrend(Supertrend),
    Ensemble(EnsembleSignal),
    AdaptiveRsi(AdaptiveRsi),
    ConfirmedSupertrend(ConfirmedSupertrend),
);

impl AnyIndicator {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Self::Sma(_) => IndicatorKind::Sma,
            Self::Ema(_) => IndicatorKind::Ema,
            Self::Rsi(_) => IndicatorKind::Rsi,
            Self::Atr(_) => IndicatorKind::Atr,
            Self::Macd(_) => IndicatorKind::Macd,
            Self::Bollinger(_) => IndicatorKind::Bollinger,
            Self::Stochastic(_) => IndicatorKind::Stochastic,
            Self::Supertrend(_) => IndicatorKind::Supertrend,
            Self::Ensemble(_) => IndicatorKind::Ensemble,
            Self::AdaptiveRsi(_) => IndicatorKind::AdaptiveRsi,
            Self::ConfirmedSupertrend(_) => IndicatorKind::ConfirmedSupertrend,
        }
    }

    pub fn arity(&self) -> InputArity {
        self.kind().arity()
    }

    /// Feed the part of `bar` this indicator consumes.
    pub fn update_bar(&mut self, bar: &Bar) -> Result<IndicatorOutput> {
        let close = bar.close;
        let hlc = bar.hlc();
        let out = match self {
            Self::Sma(i) => output(i.update(close)?, IndicatorOutput::Value),
            Self::Ema(i) => output(i.update(close)?, IndicatorOutput::Value),
            Self::Rsi(i) => output(i.update(close)?, IndicatorOutput::Value),
            Self::Atr(i) => output(i.update(hlc)?, IndicatorOutput::Value),
            Self::Macd(i) => output(i.update(close)?, IndicatorOutput::Macd),
            Self::Bollinger(i) => output(i.update(close)?, IndicatorOutput::Bollinger),
            Self::Stochastic(i) => {
                output(full_stochastic(i.update(hlc)?), IndicatorOutput::Stochastic)
            }
            Self::Supertrend(i) => output(i.update(hlc)?, IndicatorOutput::Supertrend),
            Self::Ensemble(i) => output(i.update(hlc)?, IndicatorOutput::Ensemble),
            Self::AdaptiveRsi(i) => output(i.update(close)?, IndicatorOutput::AdaptiveRsi),
            Self::ConfirmedSupertrend(i) => {
                output(i.update(hlc)?, IndicatorOutput::ConfirmedTrend)
            }
        };
        Ok(out)
    }

    /// Last output without updating.
    pub fn current_output(&self) -> IndicatorOutput {
        match self {
            Self::Sma(i) => output(i.current(), IndicatorOutput::Value),
            Self::Ema(i) => output(i.current(), IndicatorOutput::Value),
            Self::Rsi(i) => output(i.current(), IndicatorOutput::Value),
            Self::Atr(i) => output(i.current(), IndicatorOutput::Value),
            Self::Macd(i) => output(i.current(), IndicatorOutput::Macd),
            Self::Bollinger(i) => output(i.current(), IndicatorOutput::Bollinger),
            Self::Stochastic(i) => {
                output(full_stochastic(i.current()), IndicatorOutput::Stochastic)
            }
            Self::Supertrend(i) => output(i.current(), IndicatorOutput::Supertrend),
            Self::Ensemble(i) => output(i.current(), IndicatorOutput::Ensemble),
            Self::AdaptiveRsi(i) => output(i.current(), IndicatorOutput::AdaptiveRsi),
            Self::ConfirmedSupertrend(i) => output(i.current(), IndicatorOutput::ConfirmedTrend),
        }
    }

    pub fn reset(&mut self) {
        each_variant!(self, i => i.reset())
    }

    pub fn is_ready(&self) -> bool {
        each_variant!(self, i => i.is_ready())
    }

    pub fn count(&self) -> usize {
        each_variant!(self, i => i.count())
    }

    pub fn label(&self) -> String {
        each_variant!(self, i => i.label())
    }

    pub fn status(&self) -> IndicatorStatus {
        each_variant!(self, i => i.status())
    }
}

/// Lets a registry entry be wrapped in [`SharedIndicator`](super::SharedIndicator)
/// like any concrete indicator.  The input is a full bar.
impl Indicator for AnyIndicator {
    type Input = Bar;
    type Output = IndicatorOutput;

    fn update(&mut self, bar: Bar) -> Result<Option<IndicatorOutput>> {
        let out = self.update_bar(&bar)?;
        Ok((!out.is_pending()).then_some(out))
    }

    fn current(&self) -> Option<IndicatorOutput> {
        let out = self.current_output();
        (!out.is_pending()).then_some(out)
    }

    fn reset(&mut self) {
        AnyIndicator::reset(self)
    }

    fn is_ready(&self) -> bool {
        AnyIndicator::is_ready(self)
    }

    fn count(&self) -> usize {
        AnyIndicator::count(self)
    }

    fn label(&self) -> String {
        AnyIndicator::label(self)
    }

    fn status(&self) -> IndicatorStatus {
        AnyIndicator::status(self)
    }
}
