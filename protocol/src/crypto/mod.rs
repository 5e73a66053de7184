//! # Cryptographic Primitives
//!
//! Everything in HEIRLOOM that touches key material goes through this
//! module. The layering is deliberate:
//!
//! 1. **keys** — Ed25519 keypairs, public keys, signatures. The atomic
//!    unit of identity.
//! 2. **signing** — Canonical action payloads. Every privileged operation
//!    (role proposal, acknowledgment, revocation, succession claim, halt)
//!    is signed over a versioned, domain-separated digest so that a
//!    signature can never be replayed in a different context.
//! 3. **kdf** — Argon2id derivation of vault keys from user secrets.
//!    Intentionally expensive; never call it on a latency-sensitive path.
//! 4. **vault** — Envelope encryption (XSalsa20-Poly1305) for
//!    zero-knowledge document storage. The server only ever sees sealed
//!    blobs and wrap metadata.
//! 5. **hash** — SHA-256 content hashing for blob-integrity checks.

pub mod hash;
pub mod kdf;
pub mod keys;
pub mod signing;
pub mod vault;

pub use hash::content_hash;
pub use kdf::{derive_key, KdfError, KdfParams};
pub use keys::{HeirloomKeypair, HeirloomPublicKey, HeirloomSignature, KeyError};
pub use signing::{sign, sign_payload, verify, verify_payload, CanonicalPayload, SigningContext};
pub use vault::{
    decrypt_from_vault, encrypt_for_vault, EncryptionMeta, KeyWrap, VaultError,
};
