//! # did:key Codec
//!
//! Deterministic, stateless conversion between a 32-byte Ed25519 public
//! key and its `did:key` identifier.
//!
//! ## Format
//!
//! ```text
//! did:key:z <base58btc( 0xed 0x01 || public_key )>
//! ```
//!
//! The two fixed bytes are the multicodec tag for `ed25519-pub`; the `z`
//! is the multibase sigil for base58btc (Bitcoin alphabet). For Ed25519
//! keys the encoded form always begins `did:key:z6Mk...` — a property
//! regular enough that humans learn to eyeball it.
//!
//! ## Strictness
//!
//! The decoder accepts exactly what the encoder produces and nothing
//! else. Wrong prefix, non-base58 characters, a foreign multicodec tag,
//! or a payload that isn't 32 bytes each fail with their own error so
//! callers can tell a typo from an unsupported key type.
//!
//! ## Standards References
//!
//! - [DID Core v1.0](https://www.w3.org/TR/did-core/)
//! - [did:key method](https://w3c-ccg.github.io/did-method-key/)
//! - [multicodec table](https://github.com/multiformats/multicodec)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{DID_KEY_PREFIX, ED25519_MULTICODEC, VERIFYING_KEY_LENGTH};
use crate::crypto::keys::HeirloomPublicKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during DID encoding and decoding.
#[derive(Debug, Error)]
pub enum DidError {
    /// The key (or decoded payload) is not exactly 32 bytes.
    #[error("invalid key length: expected {VERIFYING_KEY_LENGTH} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The string is not a well-formed `did:key:z...` identifier.
    #[error("malformed DID: {0}")]
    MalformedDid(String),

    /// The multicodec tag is not Ed25519 — some other key type we
    /// deliberately do not support.
    #[error("unsupported multicodec prefix: expected ed25519-pub (0xed 0x01)")]
    UnsupportedMulticodec,
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Encode a 32-byte Ed25519 public key as a `did:key` string.
///
/// # Errors
///
/// [`DidError::InvalidKeyLength`] unless `public_key` is exactly 32 bytes.
pub fn encode_did(public_key: &[u8]) -> Result<Did, DidError> {
    if public_key.len() != VERIFYING_KEY_LENGTH {
        return Err(DidError::InvalidKeyLength(public_key.len()));
    }

    let mut tagged = Vec::with_capacity(ED25519_MULTICODEC.len() + VERIFYING_KEY_LENGTH);
    tagged.extend_from_slice(&ED25519_MULTICODEC);
    tagged.extend_from_slice(public_key);

    Ok(Did(format!(
        "{}{}",
        DID_KEY_PREFIX,
        bs58::encode(&tagged).into_string()
    )))
}

/// Extract the 32-byte Ed25519 public key from a `did:key` string.
///
/// Exact inverse of [`encode_did`]: for every valid key `k`,
/// `decode_did(&encode_did(&k)?)? == k`.
///
/// # Errors
///
/// - [`DidError::MalformedDid`] — wrong prefix or invalid base58.
/// - [`DidError::UnsupportedMulticodec`] — tag other than `0xed 0x01`.
/// - [`DidError::InvalidKeyLength`] — payload not 32 bytes.
pub fn decode_did(did: &str) -> Result<[u8; 32], DidError> {
    let encoded = did
        .strip_prefix(DID_KEY_PREFIX)
        .ok_or_else(|| DidError::MalformedDid(format!("must start with '{DID_KEY_PREFIX}'")))?;

    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| DidError::MalformedDid(e.to_string()))?;

    if decoded.len() < ED25519_MULTICODEC.len()
        || decoded[..ED25519_MULTICODEC.len()] != ED25519_MULTICODEC
    {
        return Err(DidError::UnsupportedMulticodec);
    }

    let payload = &decoded[ED25519_MULTICODEC.len()..];
    let key: [u8; 32] = payload
        .try_into()
        .map_err(|_| DidError::InvalidKeyLength(payload.len()))?;

    Ok(key)
}

// ---------------------------------------------------------------------------
// Did
// ---------------------------------------------------------------------------

/// A validated `did:key` identifier.
///
/// Construction goes through [`encode_did`] / [`Did::parse`], so holding a
/// `Did` means holding a string that decodes to a real 32-byte Ed25519
/// key. The inner string is the persisted representation — account
/// records, attestation issuers, and handshake payloads all store it
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Derive the DID for a public key. Infallible: a
    /// [`HeirloomPublicKey`] is 32 bytes by construction.
    pub fn from_public_key(public_key: &HeirloomPublicKey) -> Self {
        encode_did(public_key.as_bytes()).expect("32-byte key always encodes")
    }

    /// Parse and validate a DID string.
    pub fn parse(s: &str) -> Result<Self, DidError> {
        decode_did(s)?;
        Ok(Self(s.to_string()))
    }

    /// The DID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the public key this DID encodes.
    pub fn public_key(&self) -> Result<HeirloomPublicKey, DidError> {
        Ok(HeirloomPublicKey::from_bytes(decode_did(&self.0)?))
    }

    /// The verification-method URL for this DID.
    ///
    /// For `did:key` the fragment repeats the method-specific identifier:
    /// `did:key:z6Mk...#z6Mk...`. Attestation proofs reference this URL.
    pub fn verification_method(&self) -> String {
        let method_id = self.0.rsplit(':').next().unwrap_or_default();
        format!("{}#{}", self.0, method_id)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::HeirloomKeypair;

    #[test]
    fn encode_produces_did_key_format() {
        let kp = HeirloomKeypair::generate();
        let did = encode_did(&kp.public_key_bytes()).unwrap();
        // Ed25519 multicodec + base58btc always yields the 6Mk prefix.
        assert!(did.as_str().starts_with("did:key:z6Mk"), "got: {did}");
    }

    #[test]
    fn roundtrip_random_keys() {
        for _ in 0..16 {
            let key = HeirloomKeypair::generate().public_key_bytes();
            let did = encode_did(&key).unwrap();
            assert_eq!(decode_did(did.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn roundtrip_edge_patterns() {
        // All-zero and all-ones keys exercise leading-zero handling in the
        // base58 payload; they must round-trip exactly like any other key.
        for key in [[0u8; 32], [0xFFu8; 32], [0x01u8; 32]] {
            let did = encode_did(&key).unwrap();
            assert_eq!(decode_did(did.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn encode_is_deterministic_and_injective() {
        let k1 = [7u8; 32];
        let mut k2 = k1;
        k2[31] ^= 1;
        assert_eq!(encode_did(&k1).unwrap(), encode_did(&k1).unwrap());
        assert_ne!(encode_did(&k1).unwrap(), encode_did(&k2).unwrap());
    }

    #[test]
    fn wrong_key_length_rejected() {
        assert!(matches!(
            encode_did(&[0u8; 16]),
            Err(DidError::InvalidKeyLength(16))
        ));
        assert!(matches!(
            encode_did(&[0u8; 33]),
            Err(DidError::InvalidKeyLength(33))
        ));
    }

    #[test]
    fn malformed_prefix_rejected() {
        assert!(matches!(
            decode_did("did:web:example.com"),
            Err(DidError::MalformedDid(_))
        ));
        assert!(matches!(
            decode_did("did:key:x6MkAbc"),
            Err(DidError::MalformedDid(_))
        ));
        assert!(matches!(decode_did(""), Err(DidError::MalformedDid(_))));
    }

    #[test]
    fn invalid_base58_rejected() {
        // '0', 'O', 'I', 'l' are not in the Bitcoin alphabet.
        assert!(matches!(
            decode_did("did:key:z0OIl"),
            Err(DidError::MalformedDid(_))
        ));
    }

    #[test]
    fn foreign_multicodec_rejected() {
        // secp256k1-pub is tagged 0xe7 0x01 — close, but not ours.
        let mut tagged = vec![0xe7, 0x01];
        tagged.extend_from_slice(&[9u8; 32]);
        let did = format!("did:key:z{}", bs58::encode(&tagged).into_string());
        assert!(matches!(
            decode_did(&did),
            Err(DidError::UnsupportedMulticodec)
        ));
    }

    #[test]
    fn truncated_payload_rejected() {
        let mut tagged = vec![0xed, 0x01];
        tagged.extend_from_slice(&[9u8; 31]);
        let did = format!("did:key:z{}", bs58::encode(&tagged).into_string());
        assert!(matches!(
            decode_did(&did),
            Err(DidError::InvalidKeyLength(31))
        ));
    }

    #[test]
    fn did_parse_validates() {
        let kp = HeirloomKeypair::generate();
        let did = Did::from_public_key(&kp.public_key());
        assert_eq!(Did::parse(did.as_str()).unwrap(), did);
        assert!(Did::parse("did:key:znonsense!!").is_err());
    }

    #[test]
    fn did_recovers_public_key() {
        let kp = HeirloomKeypair::generate();
        let did = Did::from_public_key(&kp.public_key());
        assert_eq!(did.public_key().unwrap(), kp.public_key());
    }

    #[test]
    fn verification_method_repeats_method_id() {
        let kp = HeirloomKeypair::generate();
        let did = Did::from_public_key(&kp.public_key());
        let vm = did.verification_method();
        let method_id = did.as_str().rsplit(':').next().unwrap();
        assert_eq!(vm, format!("{}#{}", did.as_str(), method_id));
    }

    #[test]
    fn did_serde_is_transparent() {
        let kp = HeirloomKeypair::generate();
        let did = Did::from_public_key(&kp.public_key());
        let json = serde_json::to_string(&did).unwrap();
        assert_eq!(json, format!("\"{}\"", did.as_str()));
        let back: Did = serde_json::from_str(&json).unwrap();
        assert_eq!(back, did);
    }
}
