// =============================================================================
// Indicator Errors
// =============================================================================
//
// Two failure classes reach the caller:
//   - construction errors (bad period, bad multiplier/weights, unknown name),
//     always raised synchronously by the constructor or factory;
//   - input-validity errors (a NaN / infinite field on an update), raised
//     before any state is touched so the instance stays exactly as it was.
//
// Insufficient history is NOT an error: it is reported through `is_ready()`
// and a `None` output.

use thiserror::Error;

/// Errors raised by indicator construction, the factory, and updates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    /// A look-back period was zero or negative.
    #[error("invalid period `{name}` = {value}: must be a positive integer")]
    InvalidPeriod { name: &'static str, value: i64 },

    /// A non-period parameter was rejected (non-finite multiplier, wrong
    /// type, unknown keyword, duplicate registration, ...).
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// An update carried a NaN or infinite value.
    #[error("non-finite input `{field}` = {value}")]
    NonFiniteInput { field: &'static str, value: f64 },

    /// Ensemble weights were non-finite, negative, or summed to zero.
    #[error("invalid ensemble weights: {0}")]
    InvalidWeights(String),

    /// The factory did not recognise the indicator name.
    #[error("unknown indicator `{0}`")]
    UnknownIndicator(String),
}

pub type Result<T> = std::result::Result<T, IndicatorError>;

impl IndicatorError {
    pub(crate) fn parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Reject a zero period.
pub(crate) fn check_period(name: &'static str, period: usize) -> Result<usize> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { name, value: 0 });
    }
    Ok(period)
}

/// Reject a non-finite multiplier or threshold.
pub(crate) fn check_finite_param(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(IndicatorError::parameter(
            name,
            format!("must be finite, got {value}"),
        ));
    }
    Ok(value)
}

/// Reject a non-finite input value.
pub(crate) fn check_input(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        tracing::warn!(field, value, "rejected non-finite indicator input");
        return Err(IndicatorError::NonFiniteInput { field, value });
    }
    Ok(value)
}
