//! # Key Management
//!
//! Ed25519 keypair generation and serialization for HEIRLOOM identities.
//!
//! Every citizen account is anchored to exactly one Ed25519 keypair. The
//! public half becomes the account's DID; the private half authorizes
//! every recovery-graph edit and every succession action. There is no
//! password reset here — key custody *is* the product.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Constant-time implementations exist and are well-audited.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses the OS CSPRNG (`OsRng`).
//! - Key bytes are never logged, and `Debug` output never contains them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use crate::config::{SIGNATURE_LENGTH, VERIFYING_KEY_LENGTH};

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed — leaking details
/// about key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: wrong length or not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes of base64")]
    InvalidSignature,
}

/// A HEIRLOOM identity keypair wrapping an Ed25519 signing key.
///
/// This is the root of everything: the DID is derived from its public
/// half, and every role handshake, succession claim, and halt request
/// traces back to a signature made with it.
///
/// ## Serialization
///
/// `HeirloomKeypair` intentionally does NOT implement `Serialize`.
/// Exporting a private key should be a deliberate act — use
/// [`secret_key_bytes`](Self::secret_key_bytes) explicitly, and think
/// twice before you do.
pub struct HeirloomKeypair {
    signing_key: SigningKey,
}

/// The public half of a HEIRLOOM identity, safe to share with the world.
///
/// Stored base64-encoded at rest (account records, handshake metadata);
/// the raw 32 bytes are what the DID codec and the verifier consume.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeirloomPublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature over a canonical action payload.
///
/// 64 bytes, deterministic for a given (key, message) pair. Stored as
/// `Vec<u8>` for serde compatibility, but always exactly 64 bytes when
/// produced by this crate. A signature of any other length simply fails
/// verification — no panics, just `false`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeirloomSignature {
    bytes: Vec<u8>,
}

impl HeirloomKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// Useful for deriving keypairs from KDF output or recovery material.
    /// A weak seed yields a weak key — the seed must come from a CSPRNG
    /// or a proper KDF.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from raw secret key material.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed; the public key is
    /// re-derived, so a corrupted public half can never sneak in.
    pub fn from_secret_key_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_seed(bytes)
    }

    /// The public key associated with this keypair.
    pub fn public_key(&self) -> HeirloomPublicKey {
        HeirloomPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Raw public key bytes (32 bytes). Safe to share.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message and return a [`HeirloomSignature`].
    ///
    /// Deterministic: same key + same message = same signature (RFC 8032).
    pub fn sign(&self, message: &[u8]) -> HeirloomSignature {
        let sig = self.signing_key.sign(message);
        HeirloomSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &HeirloomSignature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Export the raw 32-byte secret key material.
    ///
    /// **Handle with extreme care.** This is the only secret standing
    /// between an attacker and full control of the identity — and, after
    /// succession, of everything the identity owns.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for HeirloomKeypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for HeirloomKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even partially.
        write!(f, "HeirloomKeypair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for HeirloomKeypair {
    /// Two keypairs are equal if their public keys match. Comparing secret
    /// material in a non-constant-time way is a bad habit, and for identity
    /// purposes the public key is what matters.
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for HeirloomKeypair {}

// ---------------------------------------------------------------------------
// HeirloomPublicKey
// ---------------------------------------------------------------------------

impl HeirloomPublicKey {
    /// Create a public key from raw bytes without point validation.
    ///
    /// Degenerate byte patterns are tolerated here because [`verify`]
    /// rejects them at use time; prefer [`try_from_slice`](Self::try_from_slice)
    /// when the bytes come from outside the process.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Try to create a public key from a byte slice, validating both the
    /// length and that the bytes decode to a valid Ed25519 point. This
    /// catches low-order points and other degenerate cases.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != VERIFYING_KEY_LENGTH {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);

        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;

        Ok(Self { bytes })
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// Returns `true` if the signature is valid, `false` otherwise —
    /// including for malformed signatures and invalid key bytes. The vast
    /// majority of callers want a yes/no answer, and a detailed failure
    /// oracle helps nobody but attackers.
    pub fn verify(&self, message: &[u8], signature: &HeirloomSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let dalek_sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Base64 representation — the at-rest encoding for account records.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }

    /// Parse a base64-encoded public key, validating the point.
    pub fn from_base64(s: &str) -> Result<Self, KeyError> {
        let bytes = BASE64.decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }

    /// Hex representation, for display and logging.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl Hash for HeirloomPublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for HeirloomPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for HeirloomPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeirloomPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// HeirloomSignature
// ---------------------------------------------------------------------------

impl HeirloomSignature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// The raw signature bytes (64 bytes for any valid Ed25519 signature).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64 representation — signatures are stored base64-encoded in
    /// handshake records, claims, and attestation proofs.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Parse a base64-encoded signature, enforcing the 64-byte length.
    pub fn from_base64(s: &str) -> Result<Self, KeyError> {
        let bytes = BASE64.decode(s).map_err(|_| KeyError::InvalidSignature)?;
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self { bytes })
    }

    /// Hex representation. 128 characters for a valid signature.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for HeirloomSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for HeirloomSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "HeirloomSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "HeirloomSignature({})", hex_str)
        }
    }
}
