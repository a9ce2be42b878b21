// =============================================================================
// Signals Module
// =============================================================================
//
// Indicators composed from the streaming primitives:
// - Weighted ensemble of normalised RSI / MACD / Stochastic / Supertrend
// - RSI whose look-back adapts to realised volatility
// - Supertrend with a confirmation filter and a confidence score

pub mod adaptive_rsi;
pub mod confirmed_trend;
pub mod ensemble;

pub use adaptive_rsi::{AdaptiveRsi, AdaptiveRsiOutput};
pub use confirmed_trend::{ConfirmedSupertrend, ConfirmedTrendOutput};
pub use ensemble::{ComponentScore, EnsembleConfig, EnsembleOutput, EnsembleSignal, COMPONENTS};
