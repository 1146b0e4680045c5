//! Contract ABI codec
//! Call encoding and return decoding for the notary contract's fixed interface

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{keccak256, Address as RawAddress};
use alloy_sol_types::{sol, sol_data, SolCall, SolEvent, SolType};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AbiError;
use crate::hash_utils::DocumentHash;

const WORD: usize = 32;

lazy_static! {
    static ref ADDRESS_RE: Regex = Regex::new(r"^(0x)?[0-9a-fA-F]{40}$").unwrap();
}

sol! {
    function uploadDocument(string docHash) external;
    function addAdmin(address _admin) external;
    function admins(address) external view returns (bool);
    function documents(string) external view returns (bool);
    function verifyDocument(string docHash) external view returns (bool);

    event AdminAdded(address admin);
    event DocumentUploaded(string docHash, address by);
}

/// Topic-0 of an event log.
pub fn event_topic<E: SolEvent>() -> String {
    format!("0x{}", hex::encode(E::SIGNATURE_HASH))
}

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(RawAddress);

impl Address {
    /// Parses with `ethers.utils.isAddress` rules: the `0x` prefix is
    /// optional, and mixed-case input must carry a valid EIP-55 checksum.
    pub fn parse(input: &str) -> Result<Self, AbiError> {
        let s = input.trim();
        if !ADDRESS_RE.is_match(s) {
            return Err(AbiError::InvalidAddress(input.to_string()));
        }

        let body = s.strip_prefix("0x").unwrap_or(s);
        let raw = RawAddress::from_str(body)
            .map_err(|_| AbiError::InvalidAddress(input.to_string()))?;
        let address = Address(raw);

        let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *body {
            return Err(AbiError::InvalidAddress(input.to_string()));
        }

        Ok(address)
    }

    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    pub fn as_raw(&self) -> &RawAddress {
        &self.0
    }

    /// Lowercase hex form, as sent over JSON-RPC.
    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }

    /// EIP-55 mixed-case form.
    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<RawAddress> for Address {
    fn from(raw: RawAddress) -> Self {
        Address(raw)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Fully encoded calldata for one contract function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub signature: &'static str,
    pub data: Vec<u8>,
}

impl Call {
    fn encode<C: SolCall>(call: C) -> Self {
        Self {
            signature: C::SIGNATURE,
            data: call.abi_encode(),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.data))
    }
}

pub fn upload_document(hash: &DocumentHash) -> Call {
    Call::encode(uploadDocumentCall {
        docHash: hash.to_string(),
    })
}

pub fn add_admin(address: &Address) -> Call {
    Call::encode(addAdminCall { _admin: address.0 })
}

pub fn admins(address: &Address) -> Call {
    Call::encode(adminsCall { _0: address.0 })
}

pub fn documents(hash: &DocumentHash) -> Call {
    Call::encode(documentsCall { _0: hash.to_string() })
}

pub fn verify_document(hash: &DocumentHash) -> Call {
    Call::encode(verifyDocumentCall {
        docHash: hash.to_string(),
    })
}

/// Decodes a single `bool` return value from `eth_call` output.
pub fn decode_bool(hex_data: &str) -> Result<bool, AbiError> {
    let body = hex_data.strip_prefix("0x").unwrap_or(hex_data);
    let bytes = hex::decode(body).map_err(|_| AbiError::InvalidHex(hex_data.to_string()))?;
    if bytes.len() != WORD {
        return Err(AbiError::ReturnLength(bytes.len()));
    }
    <sol_data::Bool as SolType>::abi_decode(&bytes, true)
        .map_err(|_| AbiError::NotBool(hex_data.to_string()))
}

/// Keccak-256 of `data`, as lowercase hex without prefix.
pub fn keccak_hex(data: &[u8]) -> String {
    hex::encode(keccak256(data))
}
