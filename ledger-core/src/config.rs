//! Configuration for the ledger

use crate::policy::{ChainMode, Policy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `tx.json` and `keys.json`
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// HTTP listen address
    pub listen_addr: String,

    /// Integrity policy
    pub policy: Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            service_name: "ledger-gateway".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            listen_addr: "0.0.0.0:5000".to_string(),
            policy: Policy::default(),
        }
    }
}

impl Config {
    /// Transfer log file
    pub fn transactions_path(&self) -> PathBuf {
        self.data_dir.join("tx.json")
    }

    /// Public key registry file
    pub fn keys_path(&self) -> PathBuf {
        self.data_dir.join("keys.json")
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Config::default().with_env_overrides()
    }

    /// Apply `LEDGER_*` environment variables on top of `self`
    pub fn with_env_overrides(mut self) -> crate::Result<Self> {
        if let Ok(data_dir) = std::env::var("LEDGER_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(addr) = std::env::var("LEDGER_LISTEN_ADDR") {
            self.listen_addr = addr;
        }

        if let Ok(mode) = std::env::var("LEDGER_CHAIN_MODE") {
            self.policy.chaining = mode.parse::<ChainMode>()?;
        }

        if let Ok(required) = std::env::var("LEDGER_SIGNATURE_REQUIRED") {
            self.policy.signature_required = parse_bool(&required).ok_or_else(|| {
                crate::Error::Config(format!("LEDGER_SIGNATURE_REQUIRED: not a boolean: {}", required))
            })?;
        }

        Ok(self)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
        assert_eq!(config.policy, Policy::chained());
        assert_eq!(config.transactions_path(), PathBuf::from("./data/tx.json"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/var/lib/ledger"
listen_addr = "127.0.0.1:8080"

[policy]
chaining = "independent"
signature_required = true
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.keys_path(), PathBuf::from("/var/lib/ledger/keys.json"));
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.policy.chaining, ChainMode::Independent);
        assert!(config.policy.signature_required);
        assert_eq!(config.service_name, "ledger-gateway");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
