//! Contract gateway
//! Read-only lookups against the fixed read endpoint, and signed writes that
//! go through the wallet and wait for confirmation.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U64;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};

use crate::abi::{self, Address, Call};
use crate::error::{GatewayError, RpcError};
use crate::hash_utils::DocumentHash;
use crate::rpc::JsonRpcClient;
use crate::wallet::{TransactionRequest, WalletProvider};

/// Transaction accepted by the wallet, not yet confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    pub transaction_hash: String,
}

/// Confirmed transaction as reported by the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub success: bool,
}

#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// `admins(address)`
    async fn is_admin(&self, account: &Address) -> Result<bool, GatewayError>;

    /// `documents(hash)`
    async fn document_registered(&self, hash: &DocumentHash) -> Result<bool, GatewayError>;

    /// `verifyDocument(hash)`
    async fn verify_document(&self, hash: &DocumentHash) -> Result<bool, GatewayError>;

    /// Sends `uploadDocument(hash)` signed by `from`.
    async fn submit_upload(
        &self,
        from: &Address,
        hash: &DocumentHash,
    ) -> Result<PendingTx, GatewayError>;

    /// Sends `addAdmin(admin)` signed by `from`.
    async fn submit_add_admin(
        &self,
        from: &Address,
        admin: &Address,
    ) -> Result<PendingTx, GatewayError>;

    /// Resolves once the network has included the transaction successfully.
    async fn wait_for_confirmation(&self, pending: &PendingTx) -> Result<TxReceipt, GatewayError>;

    async fn upload_document(
        &self,
        from: &Address,
        hash: &DocumentHash,
    ) -> Result<TxReceipt, GatewayError> {
        let pending = self.submit_upload(from, hash).await?;
        self.wait_for_confirmation(&pending).await
    }

    async fn add_admin(&self, from: &Address, admin: &Address) -> Result<TxReceipt, GatewayError> {
        let pending = self.submit_add_admin(from, admin).await?;
        self.wait_for_confirmation(&pending).await
    }

    fn has_signer(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    /// `None` waits for as long as the network takes.
    pub timeout: Option<Duration>,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: None,
        }
    }
}

pub struct RpcContractGateway<W> {
    reader: JsonRpcClient,
    contract: Address,
    wallet: Option<Arc<W>>,
    confirmation: ConfirmationPolicy,
}

impl<W: WalletProvider> RpcContractGateway<W> {
    pub fn new(reader: JsonRpcClient, contract: Address) -> Self {
        Self {
            reader,
            contract,
            wallet: None,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<W>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    async fn call_bool(&self, call: Call) -> Result<bool, GatewayError> {
        let params = json!([
            { "to": self.contract.to_lower_hex(), "data": call.to_hex() },
            "latest"
        ]);
        let output: String = self.reader.call("eth_call", params).await?;
        debug!(function = call.signature, %output, "eth_call returned");
        Ok(abi::decode_bool(&output)?)
    }

    async fn send(&self, from: &Address, call: Call) -> Result<PendingTx, GatewayError> {
        let wallet = self.wallet.as_ref().ok_or(GatewayError::NoSigner)?;
        let tx = TransactionRequest::contract_call(from, &self.contract, &call);

        match wallet.send_transaction(&tx).await {
            Ok(transaction_hash) => {
                info!(function = call.signature, %transaction_hash, "transaction submitted");
                Ok(PendingTx { transaction_hash })
            }
            Err(e) if e.is_user_rejection() => Err(GatewayError::UserRejected),
            Err(e) => {
                error!(function = call.signature, error = %e, "transaction submission failed");
                Err(e.into())
            }
        }
    }

    async fn confirm(&self, pending: &PendingTx) -> Result<TxReceipt, GatewayError> {
        let tx_hash = &pending.transaction_hash;
        let receipt = match self.confirmation.timeout {
            Some(limit) => tokio::time::timeout(limit, self.wait_for_receipt(tx_hash))
                .await
                .map_err(|_| GatewayError::ConfirmationTimeout(tx_hash.clone()))??,
            None => self.wait_for_receipt(tx_hash).await?,
        };

        if !receipt.success {
            return Err(GatewayError::Reverted(tx_hash.clone()));
        }
        info!(%tx_hash, block = ?receipt.block_number, "transaction confirmed");
        Ok(receipt)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, GatewayError> {
        loop {
            let value = self
                .reader
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(receipt) = parse_receipt(tx_hash, &value)? {
                return Ok(receipt);
            }
            debug!(%tx_hash, "receipt not yet available");
            tokio::time::sleep(self.confirmation.poll_interval).await;
        }
    }
}

/// `None` while the transaction is still pending.
fn parse_receipt(tx_hash: &str, value: &Value) -> Result<Option<TxReceipt>, RpcError> {
    if value.is_null() {
        return Ok(None);
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawReceipt {
        transaction_hash: Option<String>,
        block_number: Option<U64>,
        status: Option<U64>,
    }

    let raw: RawReceipt = serde_json::from_value(value.clone())?;
    let Some(block_number) = raw.block_number else {
        return Ok(None);
    };

    // Pre-Byzantium receipts carry no status; treat them as successful.
    let success = raw.status.map(|s| s == U64::from(1)).unwrap_or(true);

    Ok(Some(TxReceipt {
        transaction_hash: raw.transaction_hash.unwrap_or_else(|| tx_hash.to_string()),
        block_number: Some(block_number.to::<u64>()),
        success,
    }))
}

#[async_trait]
impl<W: WalletProvider + 'static> ContractGateway for RpcContractGateway<W> {
    #[instrument(skip(self))]
    async fn is_admin(&self, account: &Address) -> Result<bool, GatewayError> {
        self.call_bool(abi::admins(account)).await
    }

    #[instrument(skip(self))]
    async fn document_registered(&self, hash: &DocumentHash) -> Result<bool, GatewayError> {
        self.call_bool(abi::documents(hash)).await
    }

    #[instrument(skip(self))]
    async fn verify_document(&self, hash: &DocumentHash) -> Result<bool, GatewayError> {
        self.call_bool(abi::verify_document(hash)).await
    }

    #[instrument(skip(self))]
    async fn submit_upload(
        &self,
        from: &Address,
        hash: &DocumentHash,
    ) -> Result<PendingTx, GatewayError> {
        self.send(from, abi::upload_document(hash)).await
    }

    #[instrument(skip(self))]
    async fn submit_add_admin(
        &self,
        from: &Address,
        admin: &Address,
    ) -> Result<PendingTx, GatewayError> {
        self.send(from, abi::add_admin(admin)).await
    }

    async fn wait_for_confirmation(&self, pending: &PendingTx) -> Result<TxReceipt, GatewayError> {
        self.confirm(pending).await
    }

    fn has_signer(&self) -> bool {
        self.wallet.is_some()
    }
}
