//! Engine configuration
//!
//! Defaults enforce strictly increasing column indices and place no limit on
//! live objects. [`EngineConfig::from_env`] overlays:
//!
//! - `CSRSLICE_COLUMN_ORDER`: `strict` (default) or `any`
//! - `CSRSLICE_MAX_STORES`: maximum live store handles
//! - `CSRSLICE_MAX_DENSE`: maximum live dense handles
//!
//! A limit of `unlimited` (or an empty value) clears it.

use crate::error::ConfigError;
use crate::registry::RegistryConfig;
use csrslice_sparse::{ColumnOrder, LoadOptions};

pub const ENV_COLUMN_ORDER: &str = "CSRSLICE_COLUMN_ORDER";
pub const ENV_MAX_STORES: &str = "CSRSLICE_MAX_STORES";
pub const ENV_MAX_DENSE: &str = "CSRSLICE_MAX_DENSE";

/// Configuration for an [`Engine`](crate::Engine)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Column-order check applied when loading stores
    pub column_order: ColumnOrder,
    /// Maximum live store handles (`None` for no limit)
    pub max_live_stores: Option<usize>,
    /// Maximum live dense handles (`None` for no limit)
    pub max_live_dense: Option<usize>,
}

impl EngineConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_COLUMN_ORDER) {
            config.column_order = ColumnOrder::parse(&value).ok_or_else(|| ConfigError {
                key: ENV_COLUMN_ORDER,
                value: value.clone(),
                reason: "expected `strict` or `any`".to_string(),
            })?;
        }
        if let Some(value) = lookup(ENV_MAX_STORES) {
            config.max_live_stores = parse_limit(ENV_MAX_STORES, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_DENSE) {
            config.max_live_dense = parse_limit(ENV_MAX_DENSE, &value)?;
        }

        Ok(config)
    }

    pub fn with_column_order(mut self, order: ColumnOrder) -> Self {
        self.column_order = order;
        self
    }

    pub fn with_max_live_stores(mut self, limit: usize) -> Self {
        self.max_live_stores = Some(limit);
        self
    }

    pub fn with_max_live_dense(mut self, limit: usize) -> Self {
        self.max_live_dense = Some(limit);
        self
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            column_order: self.column_order,
        }
    }

    pub(crate) fn store_registry(&self) -> RegistryConfig {
        RegistryConfig {
            capacity: self.max_live_stores,
        }
    }

    pub(crate) fn dense_registry(&self) -> RegistryConfig {
        RegistryConfig {
            capacity: self.max_live_dense,
        }
    }
}

fn parse_limit(key: &'static str, value: &str) -> Result<Option<usize>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unlimited") {
        return Ok(None);
    }
    match trimmed.parse::<usize>() {
        Ok(0) => Err(ConfigError {
            key,
            value: value.to_string(),
            reason: "limit must be at least 1".to_string(),
        }),
        Ok(limit) => Ok(Some(limit)),
        Err(e) => Err(ConfigError {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.column_order, ColumnOrder::StrictlyIncreasing);
        assert_eq!(config.max_live_stores, None);
    }

    #[test]
    fn test_overlay() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_COLUMN_ORDER, "any"),
            (ENV_MAX_STORES, "8"),
            (ENV_MAX_DENSE, "unlimited"),
        ]))
        .unwrap();
        assert_eq!(config.column_order, ColumnOrder::Any);
        assert_eq!(config.max_live_stores, Some(8));
        assert_eq!(config.max_live_dense, None);
        assert_eq!(config.load_options().column_order, ColumnOrder::Any);
    }

    #[test]
    fn test_invalid_values() {
        let err = EngineConfig::from_lookup(lookup(&[(ENV_COLUMN_ORDER, "sorted-ish")]))
            .unwrap_err();
        assert_eq!(err.key, ENV_COLUMN_ORDER);

        let err = EngineConfig::from_lookup(lookup(&[(ENV_MAX_DENSE, "0")])).unwrap_err();
        assert_eq!(err.key, ENV_MAX_DENSE);

        assert!(EngineConfig::from_lookup(lookup(&[(ENV_MAX_STORES, "-3")])).is_err());
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_column_order(ColumnOrder::Any)
            .with_max_live_stores(1)
            .with_max_live_dense(4);
        assert_eq!(config.store_registry().capacity, Some(1));
        assert_eq!(config.dense_registry().capacity, Some(4));
    }
}
