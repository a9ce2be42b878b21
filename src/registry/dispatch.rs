// =============================================================================
// IndicatorRegistry — named indicators fed from a single bar stream
// =============================================================================
//
// Each entry is held in its own `SharedIndicator`, so dispatch only needs
// `&self` and concurrent callers contend per indicator, never on the map.
// Registration and removal take `&mut self`.
//
// A bar is validated once before any indicator sees it: the close always,
// high and low whenever at least one range-based indicator is registered.
// A rejected bar therefore never leaves the registry half-updated.

use std::collections::BTreeMap;

use tracing::{info, trace};

use super::factory::{create_indicator, AnyIndicator, IndicatorOutput, Params};
use super::shared::SharedIndicator;
use crate::error::{check_input, IndicatorError, Result};
use crate::types::{Bar, IndicatorStatus, InputArity};

#[derive(Debug)]
struct Entry {
    arity: InputArity,
    indicator: SharedIndicator<AnyIndicator>,
}

#[derive(Debug, Default)]
pub struct IndicatorRegistry {
    entries: BTreeMap<String, Entry>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `indicator` under `name`.  Names are unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        indicator: impl Into<AnyIndicator>,
    ) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(IndicatorError::parameter(
                "name",
                format!("indicator `{name}` is already registered"),
            ));
        }
        let indicator = indicator.into();
        info!(
            name = %name,
            label = %indicator.label(),
            arity = ?indicator.arity(),
            "indicator registered"
        );
        self.entries.insert(
            name,
            Entry {
                arity: indicator.arity(),
                indicator: SharedIndicator::new(indicator),
            },
        );
        Ok(())
    }

    /// Build through the factory and register in one step.
    pub fn register_kind(
        &mut self,
        name: impl Into<String>,
        kind: &str,
        params: &Params,
    ) -> Result<()> {
        let indicator = create_indicator(kind, params)?;
        self.register(name, indicator)
    }

    pub fn remove(&mut self, name: &str) -> Option<AnyIndicator> {
        let entry = self.entries.remove(name)?;
        info!(name, "indicator removed");
        Some(entry.indicator.into_inner())
    }

    /// Shared handle for direct access through the instance lock.
    pub fn get(&self, name: &str) -> Option<&SharedIndicator<AnyIndicator>> {
        self.entries.get(name).map(|e| &e.indicator)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Feed one bar to every registered indicator.
    ///
    /// Accepts a [`Bar`] or any OHLC(V) tuple with or without a leading
    /// timestamp.  Indicators still warming up report
    /// [`IndicatorOutput::Pending`].
    pub fn update(&self, bar: impl Into<Bar>) -> Result<BTreeMap<String, IndicatorOutput>> {
        let bar = bar.into();
        self.validate(&bar)?;
        trace!(
            timestamp = ?bar.timestamp,
            close = bar.close,
            indicators = self.entries.len(),
            "dispatching bar"
        );

        self.entries
            .iter()
            .map(|(name, entry)| {
                let out = entry.indicator.with(|i| i.update_bar(&bar))?;
                Ok((name.clone(), out))
            })
            .collect()
    }

    /// Latest output of every indicator without updating.
    pub fn current(&self) -> BTreeMap<String, IndicatorOutput> {
        self.entries
            .iter()
            .map(|(name, e)| (name.clone(), e.indicator.with(|i| i.current_output())))
            .collect()
    }

    pub fn reset_all(&self) {
        for entry in self.entries.values() {
            entry.indicator.reset();
        }
        info!(indicators = self.entries.len(), "all indicators reset");
    }

    pub fn statuses(&self) -> BTreeMap<String, IndicatorStatus> {
        self.entries
            .iter()
            .map(|(name, e)| (name.clone(), e.indicator.status()))
            .collect()
    }

    fn validate(&self, bar: &Bar) -> Result<()> {
        check_input("close", bar.close)?;
        if self
            .entries
            .values()
            .any(|e| e.arity == InputArity::HighLowClose)
        {
            bar.hlc().validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use serde_json::json;

    use super::*;
    use crate::indicators::{Ema, Indicator, Rsi, Sma};
    use crate::reference;
    use crate::signals::{EnsembleConfig, EnsembleSignal};

    fn params(value: serde_json::Value) -> Params {
        value.as_object().cloned().unwrap_or_default()
    }

    fn sample_registry() -> IndicatorRegistry {
        let mut reg = IndicatorRegistry::new();
        reg.register("sma_3", Sma::new(3).unwrap()).unwrap();
        reg.register_kind("rsi_2", "rsi", &params(json!({"period": 2})))
            .unwrap();
        reg.register_kind("atr_2", "average_true_range", &params(json!({"period": 2})))
            .unwrap();
        reg
    }

    #[test]
    fn registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IndicatorRegistry>();
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = sample_registry();
        let err = reg.register("sma_3", Ema::new(3).unwrap()).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParameter { .. }));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn unknown_kind_not_registered() {
        let mut reg = IndicatorRegistry::new();
        let err = reg.register_kind("x", "zigzag", &Params::new()).unwrap_err();
        assert_eq!(err, IndicatorError::UnknownIndicator("zigzag".into()));
        assert!(reg.is_empty());
    }

    #[test]
    fn dispatch_accepts_tuples() {
        let reg = sample_registry();
        let out = reg.update((10.0, 12.0, 8.0, 11.0)).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.values().all(IndicatorOutput::is_pending));

        let out = reg
            .update((1_700_000_060_000_i64, 11.0, 13.0, 10.0, 12.0, 500.0))
            .unwrap();
        assert_eq!(out["atr_2"], IndicatorOutput::Value(3.5));
        assert_eq!(out["rsi_2"], IndicatorOutput::Pending);

        let out = reg.update((12.0, 14.0, 11.0, 13.0, 0.0)).unwrap();
        assert_eq!(out["sma_3"], IndicatorOutput::Value(12.0));
        assert_eq!(out["rsi_2"], IndicatorOutput::Value(100.0));
    }

    #[test]
    fn matches_direct_updates() {
        let closes = reference::random_walk(120, 100.0);
        let bars = reference::bars_from_closes(&closes, 0.7);

        let mut reg = IndicatorRegistry::new();
        reg.register("ens", EnsembleSignal::new(&EnsembleConfig::default()).unwrap())
            .unwrap();
        reg.register_kind("ema", "ema", &params(json!({"period": 10})))
            .unwrap();

        let mut ens = EnsembleSignal::new(&EnsembleConfig::default()).unwrap();
        let mut ema = Ema::new(10).unwrap();
        for b in &bars {
            let out = reg
                .update(Bar::new(b.close, b.high, b.low, b.close, 0.0))
                .unwrap();
            let direct_ens = ens.update(*b).unwrap();
            let direct_ema = ema.update(b.close).unwrap();
            assert_eq!(out["ema"].value(), direct_ema);
            match (&out["ens"], direct_ens) {
                (IndicatorOutput::Ensemble(a), Some(b)) => assert_eq!(*a, b),
                (IndicatorOutput::Pending, None) => {}
                other => panic!("mismatch: {other:?}"),
            }
        }
    }

    #[test]
    fn bad_bar_rejected_before_dispatch() {
        let reg = sample_registry();
        reg.update((10.0, 12.0, 8.0, 11.0)).unwrap();

        // ATR needs the high, so the whole bar is refused.
        let err = reg.update((10.0, f64::NAN, 8.0, 11.0)).unwrap_err();
        assert!(matches!(err, IndicatorError::NonFiniteInput { field: "high", .. }));
        assert!(reg.statuses().values().all(|s| s.count == 1));
    }

    #[test]
    fn close_only_registry_ignores_range_fields() {
        let mut reg = IndicatorRegistry::new();
        reg.register("rsi", Rsi::new(2).unwrap()).unwrap();
        reg.update((f64::NAN, f64::NAN, f64::NAN, 10.0)).unwrap();
        assert!(reg.update((1.0, 1.0, 1.0, f64::INFINITY)).is_err());
        assert_eq!(reg.get("rsi").unwrap().count(), 1);
    }

    #[test]
    fn reset_all_and_remove() {
        let mut reg = sample_registry();
        for i in 0..5 {
            let c = 10.0 + i as f64;
            reg.update((c, c + 1.0, c - 1.0, c)).unwrap();
        }
        assert!(reg.statuses().values().all(|s| s.ready));

        reg.reset_all();
        assert!(reg.statuses().values().all(|s| !s.ready && s.count == 0));
        assert!(reg.current().values().all(IndicatorOutput::is_pending));

        let removed = reg.remove("atr_2").unwrap();
        assert_eq!(removed.label(), "ATR(2)");
        assert!(!reg.contains("atr_2"));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["rsi_2", "sma_3"]);
        assert!(reg.remove("atr_2").is_none());
    }

    #[test]
    fn concurrent_dispatch_counts_every_bar() {
        let reg = Arc::new(sample_registry());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for i in 0..50 {
                        let c = 100.0 + (t * 50 + i) as f64 * 0.1;
                        reg.update((c, c + 0.5, c - 0.5, c)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(reg.statuses().values().all(|s| s.count == 200));
    }

    #[test]
    fn direct_handle_updates_through_lock() {
        let reg = sample_registry();
        let handle = reg.get("sma_3").unwrap();
        for c in [1.0, 2.0, 3.0] {
            handle
                .update(Bar::new(c, c, c, c, 0.0))
                .unwrap();
        }
        assert_eq!(handle.current().and_then(|o| o.value()), Some(2.0));
        assert_eq!(reg.get("atr_2").unwrap().count(), 0);
    }
}
