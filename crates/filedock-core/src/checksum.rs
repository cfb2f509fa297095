//! Content checksum value objects.
//!
//! Every stored file carries a `FileChecksum`: the hash algorithm plus a
//! lowercase hex digest computed over the full payload. Digests are validated
//! on construction so a malformed value can never reach the metadata store.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Supported content-hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Sha256,
}

impl ChecksumAlgorithm {
    /// Length of the hex-encoded digest for this algorithm.
    pub fn hex_digest_len(&self) -> usize {
        match self {
            ChecksumAlgorithm::Sha256 => 64,
        }
    }
}

impl Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            _ => Err(AppError::InvalidInput(format!(
                "Unknown checksum algorithm: {}",
                s
            ))),
        }
    }
}

/// Immutable checksum value: algorithm + lowercase hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    pub algorithm: ChecksumAlgorithm,
    pub hex_digest: String,
}

impl FileChecksum {
    /// Build a checksum from its parts, validating the digest format.
    ///
    /// The digest must be non-empty lowercase hex (`[0-9a-f]+`) of exactly
    /// the length the algorithm produces.
    pub fn from_parts(algorithm: ChecksumAlgorithm, hex_digest: String) -> Result<Self, AppError> {
        if hex_digest.is_empty() {
            return Err(AppError::InvalidInput(
                "Checksum digest must not be empty".to_string(),
            ));
        }
        if !hex_digest
            .chars()
            .all(|c| matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(AppError::InvalidInput(format!(
                "Checksum digest is not lowercase hex: {}",
                hex_digest
            )));
        }
        if hex_digest.len() != algorithm.hex_digest_len() {
            return Err(AppError::InvalidInput(format!(
                "Checksum digest has length {}, expected {} for {}",
                hex_digest.len(),
                algorithm.hex_digest_len(),
                algorithm
            )));
        }
        Ok(FileChecksum {
            algorithm,
            hex_digest,
        })
    }

    /// SHA-256 checksum of a full in-memory payload.
    pub fn sha256_of(data: &[u8]) -> FileChecksum {
        let mut hasher = Sha256Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }
}

impl Display for FileChecksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.algorithm, self.hex_digest)
    }
}

/// Incremental SHA-256 hasher for streaming payloads through the upload
/// pipeline chunk by chunk.
#[derive(Default)]
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    pub fn finalize(self) -> FileChecksum {
        let digest = self.inner.finalize();
        FileChecksum {
            algorithm: ChecksumAlgorithm::Sha256,
            hex_digest: hex::encode(digest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let checksum = FileChecksum::sha256_of(b"hello");
        assert_eq!(checksum.algorithm, ChecksumAlgorithm::Sha256);
        assert_eq!(
            checksum.hex_digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_sha256_empty_payload() {
        let checksum = FileChecksum::sha256_of(b"");
        assert_eq!(
            checksum.hex_digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_is_deterministic() {
        let a = FileChecksum::sha256_of(b"same bytes, uploaded twice");
        let b = FileChecksum::sha256_of(b"same bytes, uploaded twice");
        assert_eq!(a, b);
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"chunk one ");
        hasher.update(b"chunk two");
        assert_eq!(
            hasher.finalize(),
            FileChecksum::sha256_of(b"chunk one chunk two")
        );
    }

    #[test]
    fn test_from_parts_accepts_valid_digest() {
        let digest = "a".repeat(64);
        let checksum = FileChecksum::from_parts(ChecksumAlgorithm::Sha256, digest.clone()).unwrap();
        assert_eq!(checksum.hex_digest, digest);
    }

    #[test]
    fn test_from_parts_rejects_uppercase_hex() {
        let err = FileChecksum::from_parts(ChecksumAlgorithm::Sha256, "A".repeat(64)).unwrap_err();
        assert_eq!(err.error_type(), "InvalidInput");
    }

    #[test]
    fn test_from_parts_rejects_non_hex() {
        let err = FileChecksum::from_parts(ChecksumAlgorithm::Sha256, "z".repeat(64)).unwrap_err();
        assert_eq!(err.error_type(), "InvalidInput");
    }

    #[test]
    fn test_from_parts_rejects_empty_and_truncated() {
        assert!(FileChecksum::from_parts(ChecksumAlgorithm::Sha256, String::new()).is_err());
        assert!(FileChecksum::from_parts(ChecksumAlgorithm::Sha256, "abc123".to_string()).is_err());
    }

    #[test]
    fn test_algorithm_round_trip() {
        assert_eq!(ChecksumAlgorithm::Sha256.to_string(), "sha256");
        assert_eq!(
            "sha256".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha256
        );
        assert!("md5".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_display_format() {
        let checksum = FileChecksum::sha256_of(b"x");
        assert!(checksum.to_string().starts_with("sha256:"));
    }
}
