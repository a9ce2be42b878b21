// =============================================================================
// SharedIndicator — one lock per indicator instance
// =============================================================================
//
// Wraps a single indicator in its own `parking_lot::Mutex`.  Updates and
// reads of the same instance are serialised; different instances never
// contend because there is no shared lock.  Composites delegate to the
// primitives they own while holding only their own lock.

use parking_lot::Mutex;

use crate::error::Result;
use crate::indicators::Indicator;
use crate::types::IndicatorStatus;

#[derive(Debug)]
pub struct SharedIndicator<I> {
    inner: Mutex<I>,
}

impl<I: Indicator> SharedIndicator<I> {
    pub fn new(indicator: I) -> Self {
        Self {
            inner: Mutex::new(indicator),
        }
    }

    pub fn update(&self, input: I::Input) -> Result<Option<I::Output>> {
        self.inner.lock().update(input)
    }

    pub fn current(&self) -> Option<I::Output> {
        self.inner.lock().current()
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lock().is_ready()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().count()
    }

    pub fn label(&self) -> String {
        self.inner.lock().label()
    }

    pub fn status(&self) -> IndicatorStatus {
        self.inner.lock().status()
    }

    /// Run `f` with exclusive access to the wrapped indicator.
    pub fn with<R>(&self, f: impl FnOnce(&mut I) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn into_inner(self) -> I {
        self.inner.into_inner()
    }
}
