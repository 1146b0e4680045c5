//! Document hashing
//! Derives the on-chain key of a document from its full byte content

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tokio::{fs::File, io::AsyncReadExt};
use tracing::{debug, instrument};

use crate::error::{HashError, Result};
use crate::types::DocumentFile;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// `0x`-prefixed lowercase SHA-256 digest of a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentHash(String);

impl DocumentHash {
    /// Parses a hash string, normalizing hex digits to lowercase.
    pub fn parse(input: &str) -> std::result::Result<Self, HashError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| HashError::Malformed(input.to_string()))?;

        if body.len() != 64 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HashError::Malformed(input.to_string()));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    fn from_digest(digest: &[u8]) -> Self {
        Self(format!("0x{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentHash {
    type Err = HashError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DocumentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DocumentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Hashes a byte slice
pub fn hash_bytes(data: &[u8]) -> DocumentHash {
    DocumentHash::from_digest(&Sha256::digest(data))
}

/// Hashes an in-memory document
pub fn hash_document(file: &DocumentFile) -> DocumentHash {
    hash_bytes(&file.bytes)
}

/// Hashes file content at the given path without loading it whole
#[instrument]
pub async fn hash_file(path: &Path) -> Result<DocumentHash> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    debug!(bytes = total, "hashed file");
    Ok(DocumentHash::from_digest(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_bytes(b"abc").as_str(),
            "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_is_stable() {
        let input = b"%PDF-1.4 same bytes";
        assert_eq!(hash_bytes(input), hash_bytes(input));
    }

    #[test]
    fn test_distinct_content_distinct_hash() {
        assert_ne!(hash_bytes(b"document A"), hash_bytes(b"document B"));
    }

    #[test]
    fn test_shape() {
        let h = hash_bytes(b"");
        assert!(h.as_str().starts_with("0x"));
        assert_eq!(h.as_str().len(), 66);
        assert_eq!(h.as_str(), h.as_str().to_lowercase());
    }

    #[test]
    fn test_parse_normalizes_case() {
        let upper = "0xBA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        assert_eq!(DocumentHash::parse(upper).unwrap(), hash_bytes(b"abc"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(DocumentHash::parse("ba7816bf").is_err());
        assert!(DocumentHash::parse("0x1234").is_err());
        assert!(DocumentHash::parse(&format!("0x{}", "g".repeat(64))).is_err());
    }

    #[tokio::test]
    async fn test_file_hash_matches_bytes_hash() {
        let content = vec![7u8; READ_BUFFER_SIZE * 2 + 13];
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&content).unwrap();

        let from_file = hash_file(tmp.path()).await.unwrap();
        assert_eq!(from_file, hash_bytes(&content));
    }

    #[tokio::test]
    async fn test_missing_file_propagates_io_error() {
        let err = hash_file(Path::new("/nonexistent/doc.pdf")).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
