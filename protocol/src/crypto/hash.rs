//! # Content Hashing
//!
//! SHA-256 integrity hashes for vault blobs.
//!
//! When a client uploads or downloads an encrypted document, both sides
//! compare content hashes to detect corruption in transit. That is the
//! entire job of this module — the succession state machine never looks
//! at these hashes, and they carry no authentication (the Poly1305 tag
//! inside the blob does that).
//!
//! SHA-256 rather than something faster because the hash travels: external
//! attestors and client SDKs in other languages all need to reproduce it,
//! and SHA-256 is the one digest everything speaks.

use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 digest of `content`.
///
/// This is the canonical integrity fingerprint recorded next to every
/// vault blob reference and certified-document reference.
///
/// # Example
///
/// ```
/// use heirloom_protocol::crypto::content_hash;
///
/// let digest = content_hash(b"sealed blob bytes");
/// assert_eq!(digest.len(), 64);
/// ```
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(sha256_array(content))
}

/// SHA-256 returning a fixed-size array, for callers that want raw bytes.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // SHA-256 of the empty string — the canonical test vector.
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn deterministic() {
        assert_eq!(content_hash(b"blob"), content_hash(b"blob"));
    }

    #[test]
    fn sensitive_to_single_bit() {
        assert_ne!(content_hash(b"blob"), content_hash(b"bloc"));
    }

    #[test]
    fn array_matches_hex() {
        let data = b"consistency check";
        assert_eq!(hex::encode(sha256_array(data)), content_hash(data));
    }
}
