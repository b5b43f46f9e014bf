//! Driver configuration, loadable from TOML

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnifeConfig {
    /// Maximum number of packages rendered at the same time
    pub workers: usize,
    /// List only exported entities in the package view handed to renderers
    pub exported_only: bool,
    pub log: LogConfig,
    /// Free-form data served by the `data` template function
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for KnifeConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            exported_only: false,
            log: LogConfig::default(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl KnifeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Worker count, never zero
    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KnifeError;

    #[test]
    fn test_parse_full_config() {
        let config = KnifeConfig::from_toml_str(
            r#"
            workers = 3
            exported_only = true

            [log]
            level = "knife=debug"
            json = true

            [extra]
            owner = "tools"
            limits = [1, 2]
            "#,
        )
        .unwrap();

        assert_eq!(config.workers(), 3);
        assert!(config.exported_only);
        assert_eq!(config.log.level, "knife=debug");
        assert!(config.log.json);
        assert_eq!(config.extra["owner"], serde_json::json!("tools"));
        assert_eq!(config.extra["limits"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = KnifeConfig::from_toml_str("workers = 0").unwrap();
        assert_eq!(config.workers(), 1);
        assert!(!config.exported_only);
        assert_eq!(config.log, LogConfig::default());
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let err = KnifeConfig::from_toml_str("workers = \"many\"").unwrap_err();
        assert!(matches!(err, KnifeError::Config(_)));
    }
}
