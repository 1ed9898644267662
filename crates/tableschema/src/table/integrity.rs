//! Size and SHA-256 accounting over the bytes a source consumed.

use sha2::{Digest, Sha256};

use crate::config::HASH_PREFIX;
use crate::error::{Result, TableSchemaError};

/// Expected size and hash of a fully read source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityExpectation {
    /// Byte count.
    pub size: Option<u64>,
    /// Hex SHA-256, with or without the `sha256:` prefix.
    pub hash: Option<String>,
}

impl IntegrityExpectation {
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Compare against measured values. Size is checked before hash.
    pub fn verify(&self, size: u64, hash: &str) -> Result<()> {
        if let Some(expected) = self.size {
            if expected != size {
                return Err(TableSchemaError::Integrity {
                    what: "size",
                    expected: expected.to_string(),
                    actual: size.to_string(),
                });
            }
        }
        if let Some(expected) = &self.hash {
            if strip_prefix(&expected.to_ascii_lowercase()) != strip_prefix(hash) {
                return Err(TableSchemaError::Integrity {
                    what: "hash",
                    expected: expected.clone(),
                    actual: hash.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn strip_prefix(hash: &str) -> &str {
    hash.strip_prefix(HASH_PREFIX).unwrap_or(hash)
}

/// Running digest of consumed bytes.
#[derive(Clone, Default)]
pub(crate) struct ByteTracker {
    hasher: Sha256,
    size: u64,
}

impl ByteTracker {
    pub(crate) fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
        self.size += bytes.len() as u64;
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    /// Prefixed hex digest of everything seen so far.
    pub(crate) fn hash(&self) -> String {
        format!("{}{:x}", HASH_PREFIX, self.hasher.clone().finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_tracker_digest() {
        let tracker = ByteTracker::default();
        assert_eq!(tracker.size(), 0);
        assert_eq!(tracker.hash(), format!("sha256:{EMPTY_SHA256}"));

        let mut split = ByteTracker::default();
        split.update(b"id\n");
        split.update(b"1\n");
        let mut whole = ByteTracker::default();
        whole.update(b"id\n1\n");
        assert_eq!(split.hash(), whole.hash());
        assert_eq!(split.size(), 5);
    }

    #[test]
    fn test_verify() {
        let hash = format!("sha256:{EMPTY_SHA256}");
        assert!(IntegrityExpectation::default().verify(0, &hash).is_ok());
        assert!(IntegrityExpectation::default().with_hash(EMPTY_SHA256).verify(0, &hash).is_ok());
        assert!(
            IntegrityExpectation::default()
                .with_hash(EMPTY_SHA256.to_uppercase())
                .verify(0, &hash)
                .is_ok()
        );
        assert!(
            IntegrityExpectation::default()
                .with_hash(format!("SHA256:{}", EMPTY_SHA256.to_uppercase()))
                .verify(0, &hash)
                .is_ok()
        );

        let err = IntegrityExpectation::default()
            .with_size(1)
            .with_hash("bad")
            .verify(0, &hash)
            .unwrap_err();
        assert!(matches!(err, TableSchemaError::Integrity { what: "size", .. }));

        let err = IntegrityExpectation::default().with_hash("bad").verify(0, &hash).unwrap_err();
        assert!(matches!(err, TableSchemaError::Integrity { what: "hash", .. }));
    }
}
