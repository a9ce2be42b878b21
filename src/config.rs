// =============================================================================
// Registry Configuration — JSON description of a named indicator set
// =============================================================================
//
// A config file lists indicators by registry name, factory kind (aliases
// accepted) and keyword parameters:
//
//   {
//     "indicators": [
//       { "name": "rsi_fast", "kind": "rsi", "params": { "period": 7 } },
//       { "name": "trend",    "kind": "confirmed_supertrend" }
//     ]
//   }
//
// Omitted `params` fall back to the factory defaults.
//
// =============================================================================

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::registry::{IndicatorKind, IndicatorRegistry, Params};

/// One entry of a [`RegistryConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    /// Unique registry name.
    pub name: String,
    /// Factory name or alias, e.g. `"bbands"`.
    pub kind: String,
    #[serde(default)]
    pub params: Params,
}

impl IndicatorSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            params: Params::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub indicators: Vec<IndicatorSpec>,
}

impl RegistryConfig {
    /// One instance of every kind with default parameters, named after the
    /// kind's canonical name.
    pub fn standard() -> Self {
        Self {
            indicators: IndicatorKind::ALL
                .iter()
                .map(|k| IndicatorSpec::new(k.canonical_name(), k.canonical_name()))
                .collect(),
        }
    }

    /// Registry names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indicators.iter().map(|s| s.name.as_str())
    }

    /// Read and parse a config file.  Entries are only checked against the
    /// factory by [`build`](Self::build).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)
            .with_context(|| format!("failed to read registry config from {}", path.display()))?;
        let config: Self = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse registry config from {}", path.display()))?;

        debug!(
            path = %path.display(),
            bytes = raw.len(),
            names = ?config.names().collect::<Vec<_>>(),
            "registry config read"
        );
        Ok(config)
    }

    /// Stage the JSON in `<path>.partial` and move it over `path`.  Readers
    /// see either the previous file or the new one, never a prefix.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let staged = staging_path(path);

        let mut json =
            serde_json::to_vec_pretty(self).context("failed to encode registry config")?;
        json.push(b'\n');

        fs::write(&staged, &json)
            .with_context(|| format!("failed to stage registry config at {}", staged.display()))?;
        if let Err(err) = fs::rename(&staged, path) {
            let _ = fs::remove_file(&staged);
            return Err(err)
                .with_context(|| format!("failed to replace registry config {}", path.display()));
        }

        info!(
            path = %path.display(),
            bytes = json.len(),
            indicators = self.indicators.len(),
            "registry config written"
        );
        Ok(())
    }

    /// Construct every listed indicator and register it.  Stops at the first
    /// entry that fails to build.
    pub fn build(&self) -> Result<IndicatorRegistry> {
        let mut registry = IndicatorRegistry::new();
        for spec in &self.indicators {
            registry
                .register_kind(spec.name.clone(), &spec.kind, &spec.params)
                .with_context(|| {
                    format!("failed to build indicator `{}` ({})", spec.name, spec.kind)
                })?;
        }
        info!(indicators = registry.len(), "indicator registry built");
        Ok(registry)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
