//! Block digest computation (SHA-256, uppercase hex).
//!
//! Digesting sits behind the `BlockDigester` trait so the hasher pool can be
//! driven by other implementations, e.g. one that injects faults in tests.

use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// Length of a rendered SHA-256 digest in hex characters.
pub const HEX_LEN: usize = 64;

/// A digest computation failed for one payload.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DigestFault(pub String);

/// Computes a fixed-length digest over a block payload.
pub trait BlockDigester: Send + Sync {
    /// Short algorithm name for logs.
    fn name(&self) -> &'static str;

    /// Digest `payload` and render it as uppercase hex.
    fn digest_hex(&self, payload: &[u8]) -> Result<String, DigestFault>;
}

/// SHA-256 digester used for real runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Digester;

impl BlockDigester for Sha256Digester {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn digest_hex(&self, payload: &[u8]) -> Result<String, DigestFault> {
        Ok(sha256_upper_hex(payload))
    }
}

/// SHA-256 of `data` as 64 uppercase hex characters.
pub fn sha256_upper_hex(data: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_empty_payload() {
        assert_eq!(
            sha256_upper_hex(b""),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn sha256_known_content() {
        let digest = Sha256Digester.digest_hex(b"hello\n").unwrap();
        assert_eq!(
            digest,
            "5891B5B522D5DF086D0FF0B110FBD9D21BB4FC7163AF34D08286A2E846F6BE03"
        );
        assert_eq!(digest.len(), HEX_LEN);
    }

    #[test]
    fn hex_uses_uppercase_alphabet_only() {
        let digest = sha256_upper_hex(&[0xff; 1000]);
        assert_eq!(digest.len(), HEX_LEN);
        assert!(digest.chars().all(|c| "0123456789ABCDEF".contains(c)));
    }
}
