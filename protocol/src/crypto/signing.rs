//! # Canonical Action Payloads
//!
//! Every privileged operation in HEIRLOOM — proposing a recovery role,
//! acknowledging one, revoking one, submitting a succession claim, halting
//! a succession — is authorized by an Ed25519 signature. What exactly gets
//! signed matters enormously: sign something ambiguous and a signature
//! harvested from one context can be replayed in another.
//!
//! This module defines the one true encoding. An action's semantic fields
//! (DIDs, role types, record ids, timestamps) are framed into an
//! unambiguous byte sequence, then digested with BLAKE3 in `derive_key`
//! mode under a per-action context string. The signature covers the
//! 32-byte digest.
//!
//! Three properties fall out of the construction:
//!
//! - **Context separation.** The context string is baked into the BLAKE3
//!   IV, so a role-proposal digest can never collide with a claim digest,
//!   even over identical fields. Cross-context replay is impossible by
//!   construction, not by convention.
//! - **Unambiguous framing.** Every field is length-prefixed. There is no
//!   concatenation of `("ab", "c")` that collides with `("a", "bc")`.
//! - **Versioning.** The protocol tag and payload version open every
//!   digest. A future encoding change invalidates old signatures instead
//!   of silently accepting them.

use crate::config::{PAYLOAD_DOMAIN, PAYLOAD_VERSION};
use crate::crypto::keys::{HeirloomKeypair, HeirloomPublicKey, HeirloomSignature};

/// The closed set of signable actions.
///
/// One context per privileged operation. Adding a variant is a protocol
/// change; reusing one for a new operation is a vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningContext {
    /// An account owner proposes a recovery role for another account.
    RolePropose,
    /// The target of a pending role acknowledges it, completing the handshake.
    RoleAcknowledge,
    /// The owner revokes a previously created role.
    RoleRevoke,
    /// A beneficiary submits a succession claim against a subject account.
    ClaimSubmit,
    /// The owner or a guardian halts an in-progress succession.
    SuccessionHalt,
}

impl SigningContext {
    /// The BLAKE3 `derive_key` context string for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningContext::RolePropose => "heirloom/v1/role/propose",
            SigningContext::RoleAcknowledge => "heirloom/v1/role/acknowledge",
            SigningContext::RoleRevoke => "heirloom/v1/role/revoke",
            SigningContext::ClaimSubmit => "heirloom/v1/claim/submit",
            SigningContext::SuccessionHalt => "heirloom/v1/succession/halt",
        }
    }
}

/// Builder for a canonical, signable payload.
///
/// Fields are appended in a fixed order decided by the caller (the
/// per-action constructors in `heirloom-succession` are the only callers
/// that matter) and framed with little-endian `u32` length prefixes.
///
/// # Examples
///
/// ```
/// use heirloom_protocol::crypto::{CanonicalPayload, SigningContext};
///
/// let digest = CanonicalPayload::new(SigningContext::RolePropose)
///     .text("did:key:zOwner")
///     .text("did:key:zTarget")
///     .text("beneficiary")
///     .uint(0)
///     .digest();
/// assert_eq!(digest.len(), 32);
/// ```
#[derive(Debug, Clone)]
pub struct CanonicalPayload {
    context: SigningContext,
    fields: Vec<Vec<u8>>,
}

impl CanonicalPayload {
    /// Start a payload for the given action context.
    pub fn new(context: SigningContext) -> Self {
        Self {
            context,
            fields: Vec::new(),
        }
    }

    /// Append a UTF-8 text field.
    pub fn text(mut self, value: &str) -> Self {
        self.fields.push(value.as_bytes().to_vec());
        self
    }

    /// Append a raw byte field.
    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.fields.push(value.to_vec());
        self
    }

    /// Append an unsigned integer field (encoded little-endian, 4 bytes).
    pub fn uint(mut self, value: u32) -> Self {
        self.fields.push(value.to_le_bytes().to_vec());
        self
    }

    /// Compute the 32-byte signing digest.
    ///
    /// Layout fed to the hasher: protocol tag, version byte, field count,
    /// then each field as `len(u32 LE) || bytes`. The action context goes
    /// into the BLAKE3 key-derivation IV rather than the data stream —
    /// that is what makes cross-context collisions impossible.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_derive_key(self.context.as_str());
        hasher.update(PAYLOAD_DOMAIN.as_bytes());
        hasher.update(&[PAYLOAD_VERSION]);
        hasher.update(&(self.fields.len() as u32).to_le_bytes());
        for field in &self.fields {
            hasher.update(&(field.len() as u32).to_le_bytes());
            hasher.update(field);
        }
        *hasher.finalize().as_bytes()
    }
}

/// Sign raw message bytes.
///
/// Thin facade over [`HeirloomKeypair::sign`] so that call sites read the
/// same whether they hold a keypair or came in through the module. For
/// anything the succession layer authorizes, prefer [`sign_payload`] —
/// raw-byte signatures carry no context separation.
pub fn sign(keypair: &HeirloomKeypair, message: &[u8]) -> HeirloomSignature {
    keypair.sign(message)
}

/// Verify a signature over raw message bytes. Returns `true` iff valid;
/// never panics on malformed input.
pub fn verify(
    public_key: &HeirloomPublicKey,
    message: &[u8],
    signature: &HeirloomSignature,
) -> bool {
    public_key.verify(message, signature)
}

/// Sign a canonical payload.
pub fn sign_payload(keypair: &HeirloomKeypair, payload: &CanonicalPayload) -> HeirloomSignature {
    keypair.sign(&payload.digest())
}

/// Verify a signature over a canonical payload.
///
/// Returns `false` for any failure — wrong key, wrong context, tampered
/// fields, malformed signature. No distinguishing oracle.
pub fn verify_payload(
    public_key: &HeirloomPublicKey,
    payload: &CanonicalPayload,
    signature: &HeirloomSignature,
) -> bool {
    public_key.verify(&payload.digest(), signature)
}
