#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object};

use docnotary::error::{GatewayError, RpcError, WalletError, USER_REJECTED_CODE};
use docnotary::wallet::TransactionRequest;
use docnotary::{
    Address, ContractGateway, Controller, DocumentFile, DocumentHash, MemoryPresenter, PendingTx,
    TxReceipt, WalletProvider,
};

pub const ADMIN: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const USER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
pub const OTHER: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";

pub fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

/// Builds a real PDF with the given number of blank pages.
pub fn minimal_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn pdf_file(name: &str) -> DocumentFile {
    DocumentFile::new(name, minimal_pdf(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBehavior {
    Confirm,
    Reject,
    Fail,
}

/// In-memory contract with a call log
pub struct FakeGateway {
    pub admins: Mutex<HashSet<Address>>,
    pub documents: Mutex<HashSet<DocumentHash>>,
    pub calls: Mutex<Vec<String>>,
    pub signer: bool,
    pub fail_reads: bool,
    pub writes: WriteBehavior,
}

impl FakeGateway {
    pub fn new(signer: bool) -> Self {
        Self {
            admins: Mutex::new(HashSet::new()),
            documents: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            signer,
            fail_reads: false,
            writes: WriteBehavior::Confirm,
        }
    }

    pub fn with_admin(self, admin: &str) -> Self {
        self.admins.lock().unwrap().insert(addr(admin));
        self
    }

    pub fn with_document(self, hash: DocumentHash) -> Self {
        self.documents.lock().unwrap().insert(hash);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn write_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("submit_"))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn read_guard(&self) -> Result<(), GatewayError> {
        if self.fail_reads {
            return Err(GatewayError::Rpc(RpcError::Remote {
                code: -32603,
                message: "upstream unavailable".into(),
            }));
        }
        Ok(())
    }

    fn write_result(&self, tx: &str) -> Result<PendingTx, GatewayError> {
        if !self.signer {
            return Err(GatewayError::NoSigner);
        }
        match self.writes {
            WriteBehavior::Confirm => Ok(PendingTx {
                transaction_hash: tx.to_string(),
            }),
            WriteBehavior::Reject => Err(GatewayError::Rpc(RpcError::Remote {
                code: USER_REJECTED_CODE,
                message: "User denied transaction signature.".into(),
            })),
            WriteBehavior::Fail => Err(GatewayError::Rpc(RpcError::Remote {
                code: -32000,
                message: "insufficient funds for gas".into(),
            })),
        }
    }
}

#[async_trait]
impl ContractGateway for FakeGateway {
    async fn is_admin(&self, account: &Address) -> Result<bool, GatewayError> {
        self.record(format!("is_admin {}", account));
        self.read_guard()?;
        Ok(self.admins.lock().unwrap().contains(account))
    }

    async fn document_registered(&self, hash: &DocumentHash) -> Result<bool, GatewayError> {
        self.record(format!("documents {}", hash));
        self.read_guard()?;
        Ok(self.documents.lock().unwrap().contains(hash))
    }

    async fn verify_document(&self, hash: &DocumentHash) -> Result<bool, GatewayError> {
        self.record(format!("verify_document {}", hash));
        self.read_guard()?;
        Ok(self.documents.lock().unwrap().contains(hash))
    }

    async fn submit_upload(
        &self,
        from: &Address,
        hash: &DocumentHash,
    ) -> Result<PendingTx, GatewayError> {
        self.record(format!("submit_upload {} {}", from, hash));
        let pending = self.write_result("0xupload")?;
        self.documents.lock().unwrap().insert(hash.clone());
        Ok(pending)
    }

    async fn submit_add_admin(
        &self,
        from: &Address,
        admin: &Address,
    ) -> Result<PendingTx, GatewayError> {
        self.record(format!("submit_add_admin {} {}", from, admin));
        let pending = self.write_result("0xadmin")?;
        self.admins.lock().unwrap().insert(*admin);
        Ok(pending)
    }

    async fn wait_for_confirmation(&self, pending: &PendingTx) -> Result<TxReceipt, GatewayError> {
        self.record(format!("wait {}", pending.transaction_hash));
        Ok(TxReceipt {
            transaction_hash: pending.transaction_hash.clone(),
            block_number: Some(1),
            success: true,
        })
    }

    fn has_signer(&self) -> bool {
        self.signer
    }
}

/// Wallet exposing a fixed account list, or refusing access
pub struct FakeWallet {
    pub accounts: Mutex<Vec<Address>>,
    pub refuse: bool,
    pub broken: bool,
}

impl FakeWallet {
    pub fn with_account(account: &str) -> Self {
        Self {
            accounts: Mutex::new(vec![addr(account)]),
            refuse: false,
            broken: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            refuse: true,
            broken: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            refuse: false,
            broken: true,
        }
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if self.refuse {
            return Err(WalletError::Refused);
        }
        if self.broken {
            return Err(WalletError::Rpc(RpcError::EmptyResponse));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn send_transaction(&self, _tx: &TransactionRequest) -> Result<String, RpcError> {
        Err(RpcError::EmptyResponse)
    }
}

pub type TestController = Controller<FakeGateway, FakeWallet, MemoryPresenter>;

/// Controller already initialized against the given wallet.
pub async fn connected(gateway: FakeGateway, wallet: Option<FakeWallet>) -> TestController {
    let mut controller = Controller::new(gateway, wallet.map(Arc::new), MemoryPresenter::new());
    controller.initialize().await;
    controller
}
