//! # Envelope Encryption
//!
//! Authenticated encryption for the zero-knowledge vault. Documents are
//! encrypted client-side; the server stores sealed blobs plus the metadata
//! needed to unseal them — and nothing it could unseal them *with*.
//!
//! The scheme is NaCl secretbox (XSalsa20-Poly1305): 256-bit keys, 24-byte
//! nonces, 16-byte Poly1305 tags. The 24-byte nonce is why we can use
//! random nonces without ceremony — the birthday bound is ~2^96 messages
//! per key, which is not a number anyone will reach.
//!
//! ## Envelope construction
//!
//! 1. Generate a fresh random data-encryption key (DEK).
//! 2. Encrypt the document under the DEK with a fresh nonce.
//! 3. Wrap the DEK under the caller's document key with a second fresh nonce.
//!
//! The returned [`EncryptionMeta`] carries both nonces, the wrapped DEK,
//! and the scheme identifiers — sufficient and necessary to decrypt, with
//! no secret material in the clear. Rotating the document key means
//! re-wrapping one 48-byte DEK blob, not re-encrypting the document.
//!
//! ## Tampering
//!
//! Decryption is all-or-nothing. A flipped bit anywhere — blob, wrapped
//! DEK, either nonce — fails the Poly1305 tag check and surfaces as
//! [`VaultError::DecryptionFailed`]. Corrupted plaintext is never returned.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{
    KEY_WRAP_ALGORITHM, SCHEME_SECRETBOX, VAULT_KEY_LENGTH, VAULT_NONCE_LENGTH,
};

/// Errors that can occur during envelope operations.
///
/// Decryption failures are deliberately uninformative: "wrong key" and
/// "tampered ciphertext" are indistinguishable by design.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The supplied key is not exactly 32 bytes.
    #[error("invalid key length: expected {VAULT_KEY_LENGTH} bytes")]
    InvalidKeyLength,

    /// Encryption failed. With valid inputs this should not happen.
    #[error("encryption failed")]
    EncryptFailed,

    /// Authentication-tag mismatch — wrong key or tampered data.
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    DecryptionFailed,

    /// The metadata names a scheme this implementation does not speak.
    #[error("unsupported encryption scheme: {0}")]
    UnsupportedScheme(String),

    /// The metadata is structurally broken (bad base64, wrong nonce size).
    #[error("malformed encryption metadata: {0}")]
    MalformedMeta(String),
}

/// DEK wrap information inside [`EncryptionMeta`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWrap {
    /// Algorithm used to wrap the DEK.
    pub algorithm: String,
    /// The DEK, encrypted under the document key. Base64.
    pub wrapped_key: String,
    /// Nonce used for the wrap operation. Base64.
    pub wrap_nonce: String,
}

/// Everything needed (besides the document key) to decrypt a vault blob.
///
/// This is a persisted representation: the JSON shape
/// `{scheme, nonce, key_wrap: {algorithm, wrapped_key, wrap_nonce}}` is
/// stable and shared with every other component that reads the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMeta {
    /// Scheme used for the document payload.
    pub scheme: String,
    /// Nonce used for the document payload. Base64.
    pub nonce: String,
    /// How the DEK is wrapped.
    pub key_wrap: KeyWrap,
}

/// Generate a fresh random 32-byte document key.
///
/// In production the document key is usually *derived* (see
/// [`crate::crypto::kdf`]) rather than generated, so that the owner can
/// re-derive it from their secret. This exists for ephemeral use and tests.
pub fn generate_document_key() -> [u8; VAULT_KEY_LENGTH] {
    let mut key = [0u8; VAULT_KEY_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

fn generate_nonce() -> [u8; VAULT_NONCE_LENGTH] {
    let mut nonce = [0u8; VAULT_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

fn cipher_for(key: &[u8]) -> Result<XSalsa20Poly1305, VaultError> {
    XSalsa20Poly1305::new_from_slice(key).map_err(|_| VaultError::InvalidKeyLength)
}

fn decode_nonce(b64: &str, label: &str) -> Result<[u8; VAULT_NONCE_LENGTH], VaultError> {
    let bytes = BASE64
        .decode(b64)
        .map_err(|_| VaultError::MalformedMeta(format!("{label} is not valid base64")))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| VaultError::MalformedMeta(format!("{label} must be {VAULT_NONCE_LENGTH} bytes")))
}

/// Encrypt a document for vault storage.
///
/// Returns the sealed blob and the [`EncryptionMeta`] describing how to
/// unseal it. The blob and the metadata are both safe to hand to an
/// untrusted store; only the document key is secret.
///
/// # Errors
///
/// [`VaultError::InvalidKeyLength`] unless `document_key` is 32 bytes.
pub fn encrypt_for_vault(
    plaintext: &[u8],
    document_key: &[u8],
) -> Result<(Vec<u8>, EncryptionMeta), VaultError> {
    let wrap_cipher = cipher_for(document_key)?;

    // Fresh DEK per document. The document key never touches the payload
    // directly, so key rotation is a metadata-only operation.
    let dek = generate_document_key();
    let payload_nonce = generate_nonce();
    let payload_cipher = cipher_for(&dek)?;
    let blob = payload_cipher
        .encrypt(Nonce::from_slice(&payload_nonce), plaintext)
        .map_err(|_| VaultError::EncryptFailed)?;

    let wrap_nonce = generate_nonce();
    let wrapped_dek = wrap_cipher
        .encrypt(Nonce::from_slice(&wrap_nonce), dek.as_slice())
        .map_err(|_| VaultError::EncryptFailed)?;

    let meta = EncryptionMeta {
        scheme: SCHEME_SECRETBOX.to_string(),
        nonce: BASE64.encode(payload_nonce),
        key_wrap: KeyWrap {
            algorithm: KEY_WRAP_ALGORITHM.to_string(),
            wrapped_key: BASE64.encode(&wrapped_dek),
            wrap_nonce: BASE64.encode(wrap_nonce),
        },
    };

    Ok((blob, meta))
}

/// Decrypt a document from vault storage. Exact inverse of
/// [`encrypt_for_vault`].
///
/// # Errors
///
/// - [`VaultError::InvalidKeyLength`] unless `document_key` is 32 bytes.
/// - [`VaultError::UnsupportedScheme`] / [`VaultError::MalformedMeta`] for
///   broken metadata.
/// - [`VaultError::DecryptionFailed`] for a wrong key or any tampering —
///   of the blob, the wrapped DEK, or either nonce.
pub fn decrypt_from_vault(
    blob: &[u8],
    meta: &EncryptionMeta,
    document_key: &[u8],
) -> Result<Vec<u8>, VaultError> {
    if meta.scheme != SCHEME_SECRETBOX {
        return Err(VaultError::UnsupportedScheme(meta.scheme.clone()));
    }
    if meta.key_wrap.algorithm != KEY_WRAP_ALGORITHM {
        return Err(VaultError::UnsupportedScheme(meta.key_wrap.algorithm.clone()));
    }

    let wrap_cipher = cipher_for(document_key)?;
    let wrap_nonce = decode_nonce(&meta.key_wrap.wrap_nonce, "wrap_nonce")?;
    let wrapped_dek = BASE64
        .decode(&meta.key_wrap.wrapped_key)
        .map_err(|_| VaultError::MalformedMeta("wrapped_key is not valid base64".into()))?;

    let dek = wrap_cipher
        .decrypt(Nonce::from_slice(&wrap_nonce), wrapped_dek.as_slice())
        .map_err(|_| VaultError::DecryptionFailed)?;
    let payload_cipher = cipher_for(&dek).map_err(|_| VaultError::DecryptionFailed)?;

    let payload_nonce = decode_nonce(&meta.nonce, "nonce")?;
    payload_cipher
        .decrypt(Nonce::from_slice(&payload_nonce), blob)
        .map_err(|_| VaultError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn roundtrip() {
        let key = test_key();
        let plaintext = b"certified copy of last will and testament";
        let (blob, meta) = encrypt_for_vault(plaintext, &key).unwrap();
        let recovered = decrypt_from_vault(&blob, &meta, &key).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn blob_contains_no_plaintext() {
        let key = test_key();
        let plaintext = b"passport number 123456789";
        let (blob, _) = encrypt_for_vault(plaintext, &key).unwrap();
        assert!(!blob
            .windows(plaintext.len())
            .any(|window| window == plaintext));
    }

    #[test]
    fn wrong_key_fails() {
        let key = test_key();
        let (blob, meta) = encrypt_for_vault(b"secret", &key).unwrap();

        let mut wrong = test_key();
        wrong[0] ^= 0xFF;
        assert!(matches!(
            decrypt_from_vault(&blob, &meta, &wrong),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn tampered_blob_fails() {
        let key = test_key();
        let (mut blob, meta) = encrypt_for_vault(b"secret", &key).unwrap();
        blob[0] ^= 0xFF;
        assert!(matches!(
            decrypt_from_vault(&blob, &meta, &key),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn tampered_wrapped_key_fails() {
        let key = test_key();
        let (blob, mut meta) = encrypt_for_vault(b"secret", &key).unwrap();
        let mut wrapped = BASE64.decode(&meta.key_wrap.wrapped_key).unwrap();
        wrapped[0] ^= 0xFF;
        meta.key_wrap.wrapped_key = BASE64.encode(&wrapped);
        assert!(matches!(
            decrypt_from_vault(&blob, &meta, &key),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn swapped_nonces_fail() {
        // Using the wrap nonce for the payload (or vice versa) must not
        // decrypt. Nonce misuse shows up as an auth failure, not garbage.
        let key = test_key();
        let (blob, mut meta) = encrypt_for_vault(b"secret", &key).unwrap();
        std::mem::swap(&mut meta.nonce, &mut meta.key_wrap.wrap_nonce);
        assert!(decrypt_from_vault(&blob, &meta, &key).is_err());
    }

    #[test]
    fn wrong_scheme_rejected_before_any_crypto() {
        let key = test_key();
        let (blob, mut meta) = encrypt_for_vault(b"secret", &key).unwrap();
        meta.scheme = "AES-256-GCM".into();
        assert!(matches!(
            decrypt_from_vault(&blob, &meta, &key),
            Err(VaultError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn short_key_rejected() {
        assert!(matches!(
            encrypt_for_vault(b"secret", &[0u8; 16]),
            Err(VaultError::InvalidKeyLength)
        ));
        let key = test_key();
        let (blob, meta) = encrypt_for_vault(b"secret", &key).unwrap();
        assert!(matches!(
            decrypt_from_vault(&blob, &meta, &[0u8; 16]),
            Err(VaultError::InvalidKeyLength)
        ));
    }

    #[test]
    fn fresh_deks_per_document() {
        // Same plaintext, same document key — different blobs and different
        // wrapped DEKs. If this fails the RNG is broken.
        let key = test_key();
        let (blob1, meta1) = encrypt_for_vault(b"same document", &key).unwrap();
        let (blob2, meta2) = encrypt_for_vault(b"same document", &key).unwrap();
        assert_ne!(blob1, blob2);
        assert_ne!(meta1.key_wrap.wrapped_key, meta2.key_wrap.wrapped_key);
        assert_ne!(meta1.nonce, meta2.nonce);
    }

    #[test]
    fn meta_json_shape_is_stable() {
        let key = test_key();
        let (_, meta) = encrypt_for_vault(b"doc", &key).unwrap();
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["scheme"], "XSalsa20-Poly1305");
        assert!(json["nonce"].is_string());
        assert_eq!(json["key_wrap"]["algorithm"], "XSalsa20-Poly1305");
        assert!(json["key_wrap"]["wrapped_key"].is_string());
        assert!(json["key_wrap"]["wrap_nonce"].is_string());
    }

    #[test]
    fn meta_roundtrips_through_json() {
        let key = test_key();
        let (blob, meta) = encrypt_for_vault(b"doc", &key).unwrap();
        let json = serde_json::to_string(&meta).unwrap();
        let parsed: EncryptionMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(decrypt_from_vault(&blob, &parsed, &key).unwrap(), b"doc");
    }

    #[test]
    fn empty_plaintext() {
        let key = test_key();
        let (blob, meta) = encrypt_for_vault(b"", &key).unwrap();
        // Empty payload still carries a Poly1305 tag.
        assert_eq!(blob.len(), 16);
        assert!(decrypt_from_vault(&blob, &meta, &key).unwrap().is_empty());
    }

    #[test]
    fn large_plaintext() {
        let key = test_key();
        let plaintext = vec![0xAB; 1_000_000];
        let (blob, meta) = encrypt_for_vault(&plaintext, &key).unwrap();
        assert_eq!(decrypt_from_vault(&blob, &meta, &key).unwrap(), plaintext);
    }
}
