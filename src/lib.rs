// =============================================================================
// Aurora Stream TA — streaming technical indicators
// =============================================================================
//
// Incremental indicators that consume one bar at a time and keep only the
// state needed for the next value:
//
//   indicators/  scalar and composite primitives (SMA, EMA, RSI, ATR, MACD,
//                Bollinger, Stochastic, Supertrend) on rolling windows
//   signals/     ensemble score, adaptive-period RSI, confirmed Supertrend
//   registry/    factory, per-instance locking, and bar dispatch by name
//   config       JSON description of a registry
// =============================================================================

pub mod config;
pub mod error;
pub mod indicators;
pub mod registry;
pub mod signals;
pub mod types;

#[cfg(test)]
mod reference;

pub use config::{IndicatorSpec, RegistryConfig};
pub use error::{IndicatorError, Result};
pub use indicators::Indicator;
pub use registry::{
    create_indicator, AnyIndicator, IndicatorKind, IndicatorOutput, IndicatorRegistry,
    SharedIndicator,
};
pub use types::{Bar, Direction, Hlc, IndicatorStatus, InputArity};

/// Route `tracing` output to the test harness.  Filter with `RUST_LOG`.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
