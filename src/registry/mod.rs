// =============================================================================
// Registry — factory, per-instance locking, and bar dispatch
// =============================================================================

pub mod dispatch;
pub mod factory;
pub mod shared;

pub use dispatch::IndicatorRegistry;
pub use factory::{
    create_indicator, normalize_name, AnyIndicator, IndicatorKind, IndicatorOutput, Params,
};
pub use shared::SharedIndicator;
