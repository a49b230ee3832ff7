//! Configuration for the transaction processor

use serde::{Deserialize, Serialize};

use crate::address::{AddressKeyPolicy, CardIdentityKey, Namespace, TransactionTypeKey};

/// Registered transaction family name
pub const FAMILY_NAME: &str = "gcxb";

/// Registered transaction family version
pub const FAMILY_VERSION: &str = "1.0.0";

/// How exchange records are keyed into addresses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKeyMode {
    /// One address per transaction type
    #[default]
    TransactionType,
    /// One address per buyer, seller and card
    CardIdentity,
}

impl AddressKeyMode {
    /// Build the matching key policy
    pub fn policy(&self) -> Box<dyn AddressKeyPolicy> {
        match self {
            AddressKeyMode::TransactionType => Box::new(TransactionTypeKey),
            AddressKeyMode::CardIdentity => Box::new(CardIdentityKey),
        }
    }
}

impl std::str::FromStr for AddressKeyMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "transaction_type" => Ok(AddressKeyMode::TransactionType),
            "card_identity" => Ok(AddressKeyMode::CardIdentity),
            _ => Err(crate::Error::Config(format!("Unknown address key mode: {}", s))),
        }
    }
}

/// Processor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transaction family name, hashed into the namespace
    pub family_name: String,

    /// Transaction family version
    pub family_version: String,

    /// Address key policy
    pub address_key: AddressKeyMode,

    /// Default tracing filter for the binary
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            family_name: FAMILY_NAME.to_string(),
            family_version: FAMILY_VERSION.to_string(),
            address_key: AddressKeyMode::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(name) = std::env::var("GCXB_FAMILY_NAME") {
            config.family_name = name;
        }

        if let Ok(version) = std::env::var("GCXB_FAMILY_VERSION") {
            config.family_version = version;
        }

        if let Ok(mode) = std::env::var("GCXB_ADDRESS_KEY") {
            config.address_key = mode.parse()?;
        }

        if let Ok(level) = std::env::var("GCXB_LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check required values are present
    pub fn validate(&self) -> crate::Result<()> {
        if self.family_name.is_empty() {
            return Err(crate::Error::Config("family_name must not be empty".to_string()));
        }
        if self.family_version.is_empty() {
            return Err(crate::Error::Config("family_version must not be empty".to_string()));
        }
        Ok(())
    }

    /// Namespace owned by the configured family
    pub fn namespace(&self) -> Namespace {
        Namespace::from_family_name(&self.family_name)
    }
}
