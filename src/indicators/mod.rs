// =============================================================================
// Streaming Technical Indicators
// =============================================================================
//
// Single-pass implementations of the classic indicators.  Each instance holds
// just enough running state to produce the next value in O(1) amortised time
// when a new bar arrives; history is never replayed.
//
// Every update validates its input first and returns an error without
// touching state when a field is NaN / infinite.  While warming up an
// indicator returns `Ok(None)`.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod supertrend;
pub mod window;

pub use atr::Atr;
pub use bollinger::{BollingerBands, BollingerOutput};
pub use ema::Ema;
pub use macd::{Macd, MacdOutput};
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticOutput};
pub use supertrend::{Supertrend, SupertrendOutput};
pub use window::{Extremum, RollingExtremum, RollingWindow};

use crate::error::Result;
use crate::types::IndicatorStatus;

/// Common surface of every streaming indicator.
pub trait Indicator {
    /// `f64` for close-based indicators, [`Hlc`](crate::types::Hlc) for
    /// range-based ones.
    type Input: Copy;
    type Output: Clone;

    /// Feed one new observation.  Returns `Ok(None)` while warming up.
    fn update(&mut self, input: Self::Input) -> Result<Option<Self::Output>>;

    /// Last computed output, if ready.
    fn current(&self) -> Option<Self::Output>;

    /// Return to the exact post-construction state.
    fn reset(&mut self);

    fn is_ready(&self) -> bool;

    /// Accepted updates since construction or the last reset.
    fn count(&self) -> usize;

    fn label(&self) -> String;

    fn status(&self) -> IndicatorStatus;
}
