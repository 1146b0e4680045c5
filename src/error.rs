//! Error types and handling for the document notary client

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// JSON-RPC code a wallet returns when the user refuses a request (EIP-1193).
pub const USER_REJECTED_CODE: i64 = 4001;

/// Custom result type for notary operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for notary operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Hash error: {0}")]
    Hash(#[from] HashError),

    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True when the failure traces back to the user refusing a wallet prompt.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            Error::Rpc(e) => e.is_user_rejection(),
            Error::Gateway(e) => e.is_user_rejection(),
            Error::Wallet(e) => e.is_user_rejection(),
            _ => false,
        }
    }
}

// -------------------- Sub-Error Categories --------------------

/// Client-side document checks. Messages are shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("No file provided.")]
    NoFile,

    #[error("Only PDF files are allowed.")]
    NotPdf { content_type: String },

    #[error("PDF parser not available in this build.")]
    ParserUnavailable,

    #[error("Failed to load PDF document.")]
    Unparseable { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HashError {
    #[error("Malformed document hash: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AbiError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    #[error("Unexpected return data length {0}, expected 32")]
    ReturnLength(usize),

    #[error("Return word is not a boolean: {0}")]
    NotBool(String),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RpcError {
    #[error("invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("transport error: HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC returned an empty response")]
    EmptyResponse,

    #[error("RPC error [{code}]: {message}")]
    Remote { code: i64, message: String },
}

impl RpcError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RpcError::Remote { code, .. } if *code == USER_REJECTED_CODE)
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("No signer available for a state-changing call")]
    NoSigner,

    #[error("Transaction canceled by user")]
    UserRejected,

    #[error("Transaction {0} reverted")]
    Reverted(String),

    #[error("Transaction {0} was not confirmed in time")]
    ConfirmationTimeout(String),

    #[error("Contract call failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("Contract returned malformed data: {0}")]
    Abi(#[from] AbiError),
}

impl GatewayError {
    pub fn is_user_rejection(&self) -> bool {
        match self {
            GatewayError::UserRejected => true,
            GatewayError::Rpc(e) => e.is_user_rejection(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WalletError {
    #[error("Wallet exposed no accounts")]
    NoAccounts,

    #[error("Wallet request refused by user")]
    Refused,

    #[error("Wallet returned an invalid account: {0}")]
    InvalidAccount(#[from] AbiError),

    #[error("Wallet RPC failed: {0}")]
    Rpc(#[from] RpcError),
}

impl WalletError {
    pub fn is_user_rejection(&self) -> bool {
        match self {
            WalletError::Refused => true,
            WalletError::Rpc(e) => e.is_user_rejection(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[source] io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_detected_through_layers() {
        let rpc = RpcError::Remote {
            code: USER_REJECTED_CODE,
            message: "User denied transaction signature.".into(),
        };
        let err: Error = GatewayError::Rpc(rpc).into();
        assert!(err.is_user_rejection());
    }

    #[test]
    fn test_other_rpc_codes_are_not_rejections() {
        let rpc = RpcError::Remote {
            code: -32000,
            message: "insufficient funds".into(),
        };
        assert!(!rpc.is_user_rejection());
        assert!(!Error::from(GatewayError::Rpc(rpc)).is_user_rejection());
    }

    #[test]
    fn test_validation_messages_are_user_facing() {
        let err = Error::from(ValidationError::NotPdf {
            content_type: "text/plain".into(),
        });
        assert_eq!(err.to_string(), "Only PDF files are allowed.");
    }

    #[test]
    fn test_wallet_error_classification() {
        assert!(WalletError::Refused.is_user_rejection());
        assert!(!WalletError::NoAccounts.is_user_rejection());
        let invalid = WalletError::from(AbiError::InvalidAddress("0x12".into()));
        assert!(!invalid.is_user_rejection());
        assert!(invalid.to_string().contains("0x12"));
    }
}
