//! POS runtime configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use kasir_core::{LedgerPolicy, PaymentMethod, StockingPolicy};

use crate::pool::DbConfig;

/// Settings that shape the database handle and the checkout rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// How long a writer waits for the SQLite write lock, in milliseconds
    pub busy_timeout_ms: u64,

    /// Missing inventory rows: skip (lenient) or fail (strict)
    pub stocking_policy: StockingPolicy,

    /// Whether sales may drive stock below zero
    pub allow_negative_stock: bool,

    /// Payment methods a checkout accepts
    pub payment_methods: Vec<PaymentMethod>,
}

impl Default for PosConfig {
    fn default() -> Self {
        PosConfig {
            database_path: PathBuf::from("./kasir.db"),
            max_connections: 5,
            busy_timeout_ms: 5000,
            stocking_policy: StockingPolicy::Lenient,
            allow_negative_stock: true,
            payment_methods: vec![PaymentMethod::Cash, PaymentMethod::Qris],
        }
    }
}

impl PosConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PosConfig::default();

        let config = PosConfig {
            database_path: lookup("KASIR_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "KASIR_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            busy_timeout_ms: parse_or(&lookup, "KASIR_DB_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,

            stocking_policy: match lookup("KASIR_STOCKING_POLICY") {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("KASIR_STOCKING_POLICY".to_string()))?,
                None => defaults.stocking_policy,
            },

            allow_negative_stock: parse_or(
                &lookup,
                "KASIR_ALLOW_NEGATIVE_STOCK",
                defaults.allow_negative_stock,
            )?,

            payment_methods: match lookup("KASIR_PAYMENT_METHODS") {
                Some(raw) => parse_methods(&raw)?,
                None => defaults.payment_methods,
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("KASIR_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy {
            stocking: self.stocking_policy,
            allow_negative_stock: self.allow_negative_stock,
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn parse_methods(raw: &str) -> Result<Vec<PaymentMethod>, ConfigError> {
    let mut methods = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let method: PaymentMethod = label
            .parse()
            .map_err(|_| ConfigError::InvalidValue("KASIR_PAYMENT_METHODS".to_string()))?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }

    if methods.is_empty() {
        return Err(ConfigError::MissingRequired("KASIR_PAYMENT_METHODS".to_string()));
    }
    Ok(methods)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PosConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.database_path, PathBuf::from("./kasir.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.ledger_policy(), LedgerPolicy::default());
        assert_eq!(
            config.payment_methods,
            vec![PaymentMethod::Cash, PaymentMethod::Qris]
        );
    }

    #[test]
    fn test_overrides() {
        let config = PosConfig::from_lookup(lookup(&[
            ("KASIR_DB_PATH", "/var/lib/kasir/pos.db"),
            ("KASIR_STOCKING_POLICY", "strict"),
            ("KASIR_ALLOW_NEGATIVE_STOCK", "false"),
            ("KASIR_PAYMENT_METHODS", "cash, card,cash"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/kasir/pos.db"));
        assert_eq!(config.stocking_policy, StockingPolicy::Strict);
        assert!(!config.allow_negative_stock);
        assert_eq!(
            config.payment_methods,
            vec![PaymentMethod::Cash, PaymentMethod::Card]
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = PosConfig::from_lookup(lookup(&[("KASIR_DB_BUSY_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "KASIR_DB_BUSY_TIMEOUT_MS"));

        let err = PosConfig::from_lookup(lookup(&[("KASIR_PAYMENT_METHODS", "cash,bitcoin")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = PosConfig::from_lookup(lookup(&[("KASIR_PAYMENT_METHODS", " , ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }
}
