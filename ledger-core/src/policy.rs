//! Integrity policy
//!
//! One core serves every generation of the ledger: independent per-entry
//! hashes or a chained hash, with or without mandatory sender signatures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an entry's hash relates to its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainMode {
    /// Every entry hashed against the sentinel; detects modification only
    Independent,
    /// Each entry hashed against its predecessor's hash
    #[default]
    Chained,
}

impl ChainMode {
    /// Config/env name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainMode::Independent => "independent",
            ChainMode::Chained => "chained",
        }
    }
}

impl fmt::Display for ChainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChainMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "independent" | "off" => Ok(ChainMode::Independent),
            "chained" | "on" => Ok(ChainMode::Chained),
            other => Err(crate::Error::Config(format!("unknown chain mode: {}", other))),
        }
    }
}

/// Checks enforced at admission and reported by verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Hash linkage
    #[serde(default)]
    pub chaining: ChainMode,

    /// Reject unsigned transfers and report unsigned stored entries
    #[serde(default)]
    pub signature_required: bool,
}

impl Policy {
    /// Chained hashes, signatures optional
    pub fn chained() -> Self {
        Self::default()
    }

    /// Chained hashes, signatures mandatory
    pub fn signed() -> Self {
        Self {
            chaining: ChainMode::Chained,
            signature_required: true,
        }
    }

    /// Independent hashes, signatures optional
    pub fn independent() -> Self {
        Self {
            chaining: ChainMode::Independent,
            signature_required: false,
        }
    }

    /// Previous hash to link after an entry whose (expected) hash is `hash`
    pub(crate) fn link_after<'a>(&self, hash: &'a str) -> &'a str {
        match self.chaining {
            ChainMode::Chained => hash,
            ChainMode::Independent => crate::types::SENTINEL_HASH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_mode_parse() {
        assert_eq!("chained".parse::<ChainMode>().unwrap(), ChainMode::Chained);
        assert_eq!("OFF".parse::<ChainMode>().unwrap(), ChainMode::Independent);
        assert!("sideways".parse::<ChainMode>().is_err());
    }

    #[test]
    fn test_link_after() {
        assert_eq!(Policy::chained().link_after("abc"), "abc");
        assert_eq!(Policy::independent().link_after("abc"), "0");
    }

    #[test]
    fn test_policy_from_toml_defaults() {
        let p: Policy = toml::from_str("signature_required = true").unwrap();
        assert_eq!(p, Policy::signed());
    }
}
