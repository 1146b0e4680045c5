//! UI controller
//! Routes user actions and wallet events through validation, hashing and the
//! contract gateway, and reports every result through the presenter.
//!
//! All operations take `&mut self`, so one controller handles one action at a
//! time; a second submission cannot start while a transaction is pending.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::abi::Address;
use crate::error::{GatewayError, ValidationError};
use crate::gateway::{ContractGateway, TxReceipt};
use crate::hash_utils::{hash_document, DocumentHash};
use crate::pdf_document::validate_pdf;
use crate::presenter::{Channel, Severity, StatusPresenter};
use crate::session::Session;
use crate::types::DocumentFile;
use crate::wallet::{WalletEvent, WalletProvider};

pub const NO_FILE_LABEL: &str = "Choose a PDF file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    NoFile,
    Rejected { reason: String },
    AlreadyRegistered { hash: DocumentHash },
    Uploaded { hash: DocumentHash, receipt: TxReceipt },
    Verified { hash: DocumentHash },
    NotVerified { hash: DocumentHash },
    Cancelled { hash: DocumentHash },
    Failed { message: String },
}

impl SubmitOutcome {
    /// Whether the CLI should exit successfully.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SubmitOutcome::Uploaded { .. }
                | SubmitOutcome::Verified { .. }
                | SubmitOutcome::AlreadyRegistered { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdminOutcome {
    Unauthorized,
    InvalidAddress,
    AlreadyAdmin { address: Address },
    Added { address: Address, receipt: TxReceipt },
    Cancelled,
    Failed { message: String },
}

impl AdminOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AdminOutcome::Added { .. })
    }
}

pub struct Controller<G, W, P> {
    gateway: G,
    wallet: Option<Arc<W>>,
    presenter: P,
    session: Session,
}

impl<G, W, P> Controller<G, W, P>
where
    G: ContractGateway,
    W: WalletProvider,
    P: StatusPresenter,
{
    /// `wallet` is `None` when no wallet is available at all.
    pub fn new(gateway: G, wallet: Option<Arc<W>>, presenter: P) -> Self {
        Self {
            gateway,
            wallet,
            presenter,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Connects to the wallet if there is one and derives the session.
    #[instrument(skip(self))]
    pub async fn initialize(&mut self) {
        let mut init_error = None;

        if let Some(wallet) = self.wallet.clone() {
            match wallet.request_accounts().await {
                Ok(accounts) => match accounts.first().copied() {
                    Some(address) => {
                        let is_admin = self.lookup_admin(&address).await;
                        self.session.connect(address, true, is_admin);
                    }
                    None => self.session.disconnect(),
                },
                Err(e) if e.is_user_rejection() => {
                    info!("wallet access declined, continuing as user");
                    self.session.disconnect();
                }
                Err(e) => {
                    warn!(error = %e, "wallet connection failed, continuing as user");
                    self.session.disconnect();
                    init_error = Some(e);
                }
            }
        }

        self.render();

        if let Some(e) = init_error {
            self.presenter
                .status(&format!("Initialization failed: {}", e), Severity::Error);
        } else if let (true, Some(address)) = (self.session.is_admin(), self.session.address()) {
            let message = format!("Connected successfully as admin: {}", address);
            self.presenter.status(&message, Severity::Success);
        } else {
            self.presenter
                .status("Select a PDF file to Upload ", Severity::Info);
        }
    }

    /// Single handler for every wallet notification.
    #[instrument(skip(self))]
    pub async fn handle_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                let current = accounts.first().copied();
                let is_admin = match &current {
                    Some(address) => self.lookup_admin(address).await,
                    None => false,
                };
                self.session.accounts_changed(current, is_admin);
                self.render();

                let message = match (is_admin, self.session.address()) {
                    (true, Some(address)) => format!("Connected as admin: {}", address),
                    _ => "Verification-only mode active.".to_string(),
                };
                self.presenter.status(&message, Severity::Warning);
            }
        }
    }

    pub fn select_file(&mut self, file: Option<&DocumentFile>) {
        let label = match file {
            Some(f) => format!("📄 Selected File: {}", f.name),
            None => NO_FILE_LABEL.to_string(),
        };
        self.presenter.show_file_label(&label);
    }

    /// Validates and hashes the document, then uploads it (signer + admin)
    /// or checks whether it is registered.
    #[instrument(skip_all)]
    pub async fn submit(&mut self, file: Option<DocumentFile>) -> SubmitOutcome {
        let Some(file) = file else {
            self.presenter.status(
                "Please select a PDF file to upload or verify.",
                Severity::Warning,
            );
            return SubmitOutcome::NoFile;
        };

        if let Err(e) = validate_pdf(Some(&file)) {
            return self.reject(e);
        }

        self.presenter
            .status("Calculating file hash. Please wait...", Severity::Info);
        let hash = hash_document(&file);
        info!(%hash, "document hashed");

        let result = match self.session.signer_address().copied() {
            Some(from) if self.session.can_upload() => self.upload(&from, hash.clone()).await,
            _ => self.verify(hash.clone()).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) if e.is_user_rejection() => {
                self.presenter
                    .status("Upload transaction canceled by user.", Severity::Warning);
                SubmitOutcome::Cancelled { hash }
            }
            Err(e) => {
                error!(%hash, error = %e, "document submission failed");
                let message = format!("Error: {}", e);
                self.presenter.status(&message, Severity::Error);
                SubmitOutcome::Failed { message }
            }
        }
    }

    fn reject(&mut self, e: ValidationError) -> SubmitOutcome {
        self.presenter
            .status(&format!("Error: {}", e), Severity::Error);
        SubmitOutcome::Rejected {
            reason: e.to_string(),
        }
    }

    async fn upload(
        &mut self,
        from: &Address,
        hash: DocumentHash,
    ) -> Result<SubmitOutcome, GatewayError> {
        if self.gateway.verify_document(&hash).await? {
            self.presenter.status(
                &format!("This document already exists on blockchain.\nHash: {}", hash),
                Severity::Warning,
            );
            return Ok(SubmitOutcome::AlreadyRegistered { hash });
        }

        self.presenter
            .status("Uploading document via wallet...", Severity::Info);
        let pending = self.gateway.submit_upload(from, &hash).await?;
        self.presenter
            .status("Waiting for transaction confirmation...", Severity::Info);
        let receipt = self.gateway.wait_for_confirmation(&pending).await?;

        self.presenter.status(
            &format!("Document uploaded successfully!\nHash: {}", hash),
            Severity::Success,
        );
        Ok(SubmitOutcome::Uploaded { hash, receipt })
    }

    async fn verify(&mut self, hash: DocumentHash) -> Result<SubmitOutcome, GatewayError> {
        if self.gateway.verify_document(&hash).await? {
            self.presenter.status(
                &format!("This document is verified as REAL!\nHash: {}", hash),
                Severity::Success,
            );
            Ok(SubmitOutcome::Verified { hash })
        } else {
            self.presenter.status(
                &format!("This document is NOT verified (FAKE)!\nHash: {}", hash),
                Severity::Error,
            );
            Ok(SubmitOutcome::NotVerified { hash })
        }
    }

    /// Grants admin rights to `input` after local checks.
    #[instrument(skip(self))]
    pub async fn add_admin(&mut self, input: &str) -> AdminOutcome {
        let from = match self.session.signer_address().copied() {
            Some(from) if self.session.can_upload() => from,
            _ => {
                self.admin_message("You are not authorized to add a new admin.", Severity::Error);
                return AdminOutcome::Unauthorized;
            }
        };

        let target = match Address::parse(input) {
            Ok(a) => a,
            Err(_) => {
                self.admin_message("Please enter a valid Ethereum address.", Severity::Warning);
                return AdminOutcome::InvalidAddress;
            }
        };

        if self.lookup_admin(&target).await {
            self.admin_message("This address is already an admin.", Severity::Warning);
            return AdminOutcome::AlreadyAdmin { address: target };
        }

        self.admin_message(&format!("Adding new admin: {}...", target), Severity::Info);
        match self.gateway.add_admin(&from, &target).await {
            Ok(receipt) => {
                self.admin_message(
                    &format!("✅ Admin added successfully: {}", target),
                    Severity::Success,
                );
                self.presenter.clear_admin_input();
                AdminOutcome::Added {
                    address: target,
                    receipt,
                }
            }
            Err(e) if e.is_user_rejection() => {
                self.admin_message("Add admin transaction canceled by user.", Severity::Warning);
                AdminOutcome::Cancelled
            }
            Err(e) => {
                error!(admin = %target, error = %e, "addAdmin transaction failed");
                self.admin_message("Could not add admin. See logs for details.", Severity::Error);
                AdminOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Admin lookups never fail the caller: errors are logged and read as
    /// "not admin".
    async fn lookup_admin(&self, address: &Address) -> bool {
        match self.gateway.is_admin(address).await {
            Ok(flag) => flag,
            Err(e) => {
                error!(%address, error = %e, "admin status lookup failed");
                false
            }
        }
    }

    fn admin_message(&mut self, message: &str, severity: Severity) {
        self.presenter.show(Channel::Admin, message, severity);
    }

    fn render(&mut self) {
        let view = self.session.view();
        self.presenter.render_view(&view);
    }
}
