//! Session state
//! Signer presence, connected address and admin flag, changed only through
//! the transitions below.

use serde::Serialize;
use tracing::debug;

use crate::abi::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    Disconnected,
    ConnectedUser,
    ConnectedAdmin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    address: Option<Address>,
    signer: bool,
    is_admin: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, address: Address, signer: bool, is_admin: bool) {
        debug!(%address, signer, is_admin, "session connected");
        self.address = Some(address);
        self.signer = signer;
        self.is_admin = is_admin;
    }

    pub fn disconnect(&mut self) {
        debug!("session disconnected");
        *self = Self::default();
    }

    /// The wallet switched accounts. The signer follows the active account;
    /// no account means no signer.
    pub fn accounts_changed(&mut self, address: Option<Address>, is_admin: bool) {
        match address {
            Some(address) => self.connect(address, true, is_admin),
            None => self.disconnect(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        match (self.address, self.is_admin) {
            (None, _) => SessionMode::Disconnected,
            (Some(_), true) => SessionMode::ConnectedAdmin,
            (Some(_), false) => SessionMode::ConnectedUser,
        }
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn has_signer(&self) -> bool {
        self.signer
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Signer plus admin flag: the only state that may write to the contract.
    pub fn can_upload(&self) -> bool {
        self.signer && self.is_admin && self.address.is_some()
    }

    /// Address to sign with, when writes are allowed.
    pub fn signer_address(&self) -> Option<&Address> {
        if self.signer {
            self.address.as_ref()
        } else {
            None
        }
    }

    pub fn view(&self) -> ViewModel {
        ViewModel::for_admin(self.is_admin && self.address.is_some())
    }
}

/// What the controls look like for the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub submit_label: &'static str,
    pub accent: &'static str,
    pub admin_panel_visible: bool,
}

impl ViewModel {
    pub fn for_admin(is_admin: bool) -> Self {
        if is_admin {
            Self {
                submit_label: "Upload Document (Admin)",
                accent: "#4CAF50",
                admin_panel_visible: true,
            }
        } else {
            Self {
                submit_label: "Verify Document (User)",
                accent: "#2196F3",
                admin_panel_visible: false,
            }
        }
    }
}
