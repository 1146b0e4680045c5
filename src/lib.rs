//! Document notary client
//! Hashes PDF documents and registers or verifies the hashes on a notary
//! contract, through a read-only JSON-RPC endpoint and a signing wallet.

// Configuration and shared types
pub mod config;
pub mod error;
pub mod types;
pub mod utils;

// Document handling
pub mod hash_utils;
pub mod pdf_document;

// Chain access
pub mod abi;
pub mod gateway;
pub mod rpc;
pub mod wallet;

// Session and presentation
pub mod controller;
pub mod presenter;
pub mod session;

// Re-exports for crate consumers
pub use abi::Address;
pub use config::ClientConfig;
pub use controller::{AdminOutcome, Controller, SubmitOutcome};
pub use error::{Error, Result};
pub use gateway::{ContractGateway, PendingTx, RpcContractGateway, TxReceipt};
pub use hash_utils::{hash_bytes, hash_document, hash_file, DocumentHash};
pub use pdf_document::{validate_pdf, PdfAcceptance};
pub use presenter::{Channel, MemoryPresenter, Severity, StatusPresenter, TerminalPresenter};
pub use session::{Session, SessionMode, ViewModel};
pub use types::DocumentFile;
pub use wallet::{AccountWatcher, RpcWallet, WalletEvent, WalletProvider};
