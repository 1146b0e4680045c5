//! Configuration types and validation for the notary client

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::abi::Address;
use crate::error::ConfigError;
use crate::gateway::ConfirmationPolicy;
use crate::utils::LogLevel;

pub const DEFAULT_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x8B631b8F6BB2A96fBA3C0561C4Bd31A9b077BCA9";

/// Client configuration: endpoints, contract, and timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Read-only JSON-RPC endpoint
    pub rpc_url: String,
    /// Wallet JSON-RPC endpoint; `None` runs verification-only
    pub wallet_url: Option<String>,
    pub contract_address: String,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// No deadline when unset
    pub confirmation_timeout_secs: Option<u64>,
    pub log_level: LogLevel,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallet_url: None,
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            request_timeout_secs: 30,
            poll_interval_ms: 2000,
            confirmation_timeout_secs: None,
            log_level: LogLevel::Info,
        }
    }
}

impl ClientConfig {
    /// Loads a JSON or YAML file; JSON is tried first.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("rpc_url must not be empty".into()));
        }
        if matches!(&self.wallet_url, Some(url) if url.trim().is_empty()) {
            return Err(ConfigError::Invalid("wallet_url must not be empty when set".into()));
        }
        self.contract()?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be at least 1".into()));
        }
        if self.confirmation_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "confirmation_timeout_secs must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn contract(&self) -> Result<Address, ConfigError> {
        Address::parse(&self.contract_address)
            .map_err(|e| ConfigError::Invalid(format!("contract_address: {}", e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: self.poll_interval(),
            timeout: self.confirmation_timeout_secs.map(Duration::from_secs),
        }
    }
}
