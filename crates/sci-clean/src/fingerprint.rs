//! Content fingerprinting of raw input bytes.
//!
//! The fingerprint is the reproducibility key: two runs with equal
//! fingerprints operated on byte-identical input.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;

/// Length of the abbreviated fingerprint shown next to exports.
pub const SHORT_FINGERPRINT_LEN: usize = 16;

/// SHA-256 of a file's raw bytes, as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash raw bytes exactly as received.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hex_hash = hex::encode(hasher.finalize());

        debug!("SHA256 over {} bytes: {}", bytes.len(), hex_hash);
        Self(hex_hash)
    }

    /// Full 64-character hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading hex characters used for display.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_FINGERPRINT_LEN.min(self.0.len())]
    }

    /// Compare against a hex digest, ignoring case and surrounding whitespace.
    pub fn matches(&self, expected: &str) -> bool {
        self.0 == expected.trim().to_lowercase()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let fingerprint = Fingerprint::of_bytes(b"hello world");
        assert_eq!(
            fingerprint.as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_empty_input_digest() {
        let fingerprint = Fingerprint::of_bytes(b"");
        assert_eq!(
            fingerprint.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_short_and_matches() {
        let fingerprint = Fingerprint::of_bytes(b"hello world");
        assert_eq!(fingerprint.short(), "b94d27b9934d3e08");
        assert!(fingerprint.matches(
            "  B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9\n"
        ));
        assert!(!fingerprint.matches("deadbeef"));
    }

    #[test]
    fn test_whitespace_changes_fingerprint() {
        assert_ne!(
            Fingerprint::of_bytes(b"a,b\n1,2"),
            Fingerprint::of_bytes(b"a,b\n1,2\n")
        );
    }
}
