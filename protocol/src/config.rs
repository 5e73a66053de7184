//! # Protocol Configuration & Constants
//!
//! Every magic number in HEIRLOOM lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong.
//!
//! Several of these values are load-bearing for interoperability: the DID
//! multicodec tag, the envelope scheme identifiers, and the Argon2id
//! defaults all appear in persisted records. Changing them invalidates
//! existing identities and vault metadata, so don't.

// ---------------------------------------------------------------------------
// Identity (did:key)
// ---------------------------------------------------------------------------

/// Multicodec prefix for an Ed25519 public key, per the multicodec table.
/// Prepended to the raw key bytes before base58btc encoding.
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Prefix of every HEIRLOOM identifier. The trailing `z` is the multibase
/// sigil for base58btc — it is part of the fixed prefix, not of the payload.
pub const DID_KEY_PREFIX: &str = "did:key:z";

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Ed25519 — deterministic signatures, 128-bit security, no nonce footguns.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 secret keys are 32 bytes. The secret key *is* the seed.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Domain tag mixed into every canonical action payload. Signatures made
/// under one tag are meaningless under any other, by construction.
pub const PAYLOAD_DOMAIN: &str = "heirloom";

/// Version of the canonical payload encoding. Bump on any change to field
/// ordering or framing — old signatures must not verify against new
/// encodings.
pub const PAYLOAD_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Envelope Encryption (vault)
// ---------------------------------------------------------------------------

/// Symmetric scheme for vault payloads and DEK wrapping. NaCl secretbox:
/// XSalsa20 stream cipher with a Poly1305 authentication tag.
pub const SCHEME_SECRETBOX: &str = "XSalsa20-Poly1305";

/// Key-wrap algorithm identifier recorded in encryption metadata.
pub const KEY_WRAP_ALGORITHM: &str = "XSalsa20-Poly1305";

/// Secretbox key length in bytes.
pub const VAULT_KEY_LENGTH: usize = 32;

/// Secretbox nonce length. XSalsa20 uses 24-byte nonces — large enough
/// that random generation is safe for any realistic message volume.
pub const VAULT_NONCE_LENGTH: usize = 24;

/// Poly1305 authentication tag length in bytes.
pub const VAULT_TAG_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Key Derivation (Argon2id)
// ---------------------------------------------------------------------------

/// Argon2id iteration count. Three passes over memory.
pub const ARGON2_TIME_COST: u32 = 3;

/// Argon2id memory cost in KiB (64 MiB). High enough to price out GPU
/// farms, low enough to run on a phone.
pub const ARGON2_MEMORY_COST_KIB: u32 = 65536;

/// Argon2id lane count.
pub const ARGON2_PARALLELISM: u32 = 4;

/// Default derived-key length in bytes.
pub const ARGON2_HASH_LENGTH: usize = 32;

/// Default salt length in bytes.
pub const ARGON2_SALT_LENGTH: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_parameter_sizes() {
        assert_eq!(SIGNING_KEY_LENGTH, 32);
        assert_eq!(VERIFYING_KEY_LENGTH, 32);
        assert_eq!(SIGNATURE_LENGTH, 64);
        assert_eq!(VAULT_KEY_LENGTH, 32);
        assert_eq!(VAULT_NONCE_LENGTH, 24);
        assert_eq!(VAULT_TAG_LENGTH, 16);
    }

    #[test]
    fn multicodec_tag_is_ed25519() {
        // 0xed 0x01 is the varint encoding of the ed25519-pub multicodec.
        assert_eq!(ED25519_MULTICODEC, [0xed, 0x01]);
    }

    #[test]
    fn did_prefix_carries_multibase_sigil() {
        assert!(DID_KEY_PREFIX.ends_with('z'));
    }

    #[test]
    fn argon2_defaults_match_deployment_profile() {
        // These defaults are persisted alongside derived-key salts; a silent
        // change here would orphan every existing vault key.
        assert_eq!(ARGON2_TIME_COST, 3);
        assert_eq!(ARGON2_MEMORY_COST_KIB, 64 * 1024);
        assert_eq!(ARGON2_PARALLELISM, 4);
        assert_eq!(ARGON2_HASH_LENGTH, 32);
        assert_eq!(ARGON2_SALT_LENGTH, 16);
    }
}
