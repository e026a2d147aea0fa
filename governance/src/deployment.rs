//! Deployment record
//!
//! Written by the contract deployment task, one entry per chain id:
//!
//! ```json
//! {
//!   "5": {
//!     "governor": "0x...",
//!     "token": "0x...",
//!     "timelock": "0x...",
//!     "gas_limit": 1500000,
//!     "proposal_value": "1500000000",
//!     "execute_value": "1500000000000"
//!   }
//! }
//! ```
//!
//! The gas and value fields are the constants the contracts were deployed
//! and exercised with; they are not estimated by the client.

use lair_core::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::ConfigError;

pub const DEFAULT_GAS_LIMIT: u64 = 1_500_000;
pub const DEFAULT_PROPOSAL_VALUE: u64 = 1_500_000_000;
pub const DEFAULT_EXECUTE_VALUE: u64 = 1_500_000_000_000;

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_proposal_value() -> U256 {
    U256::from(DEFAULT_PROPOSAL_VALUE)
}

fn default_execute_value() -> U256 {
    U256::from(DEFAULT_EXECUTE_VALUE)
}

/// Addresses and transaction parameters for one network
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deployment {
    pub governor: Address,
    pub token: Address,
    #[serde(default)]
    pub timelock: Option<Address>,

    /// Gas attached to every governance transaction
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    /// Per-action value recorded in `propose`
    #[serde(default = "default_proposal_value", with = "decimal")]
    pub proposal_value: U256,

    /// Value attached to `execute`
    #[serde(default = "default_execute_value", with = "decimal")]
    pub execute_value: U256,
}

impl Deployment {
    pub fn new(governor: Address, token: Address) -> Self {
        Self {
            governor,
            token,
            timelock: None,
            gas_limit: DEFAULT_GAS_LIMIT,
            proposal_value: default_proposal_value(),
            execute_value: default_execute_value(),
        }
    }
}

/// All known deployments, keyed by chain id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DeploymentBook {
    networks: BTreeMap<u64, Deployment>,
}

impl DeploymentBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; an absent file is an empty book, so every chain
    /// resolves to `ContractsNotDeployed`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::warn!("⚠️ No deployment record at {}", path.display());
            return Ok(DeploymentBook::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let book: DeploymentBook = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        log::info!(
            "📒 Loaded deployments for {} network(s) from {}",
            book.networks.len(),
            path.display()
        );
        Ok(book)
    }

    pub fn insert(&mut self, chain_id: u64, deployment: Deployment) {
        self.networks.insert(chain_id, deployment);
    }

    pub fn get(&self, chain_id: u64) -> Option<&Deployment> {
        self.networks.get(&chain_id)
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.networks.keys().copied()
    }
}

/// uint256 values as decimal strings (JSON numbers lose precision)
pub(crate) mod decimal {
    use lair_core::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(U256::from(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GOVERNOR: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
    const TOKEN: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";

    #[test]
    fn test_defaults_applied() {
        let json = format!(r#"{{ "5": {{ "governor": "{}", "token": "{}" }} }}"#, GOVERNOR, TOKEN);
        let book: DeploymentBook = serde_json::from_str(&json).unwrap();

        let deployment = book.get(5).unwrap();
        assert_eq!(deployment.governor, GOVERNOR.parse().unwrap());
        assert_eq!(deployment.gas_limit, 1_500_000);
        assert_eq!(deployment.proposal_value, U256::from(1_500_000_000u64));
        assert_eq!(deployment.execute_value, U256::from(1_500_000_000_000u64));
        assert!(book.get(1).is_none());
    }

    #[test]
    fn test_values_as_strings_or_numbers() {
        let json = format!(
            r#"{{ "31337": {{ "governor": "{}", "token": "{}", "timelock": "{}",
                 "gas_limit": 900000, "proposal_value": "0", "execute_value": 7 }} }}"#,
            GOVERNOR, TOKEN, TOKEN
        );
        let book: DeploymentBook = serde_json::from_str(&json).unwrap();
        let deployment = book.get(31337).unwrap();
        assert_eq!(deployment.gas_limit, 900_000);
        assert_eq!(deployment.proposal_value, U256::from(0u8));
        assert_eq!(deployment.execute_value, U256::from(7u8));
        assert!(deployment.timelock.is_some());
    }

    #[test]
    fn test_load_from_file() {
        let mut book = DeploymentBook::new();
        book.insert(5, Deployment::new(GOVERNOR.parse().unwrap(), TOKEN.parse().unwrap()));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&book).unwrap()).unwrap();

        let loaded = DeploymentBook::load(file.path()).unwrap();
        assert_eq!(loaded, book);
        assert_eq!(loaded.chain_ids().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let book = DeploymentBook::load(Path::new("/nonexistent/deployments.json")).unwrap();
        assert_eq!(book, DeploymentBook::new());
        assert!(book.get(5).is_none());
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            DeploymentBook::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
