//! # Identity Module
//!
//! Self-certifying identity for HEIRLOOM citizens.
//!
//! An identity is nothing more than an Ed25519 public key wearing a
//! portable spelling. The `did:key` method encodes the key directly into
//! the identifier, which buys us:
//!
//! - No registry, no resolution, no network calls — the DID *is* the key.
//! - Instant creation at registration time.
//! - Interoperability with the W3C Verifiable Credentials ecosystem that
//!   attestors (notaries, insurers, registrars) already speak.
//!
//! The codec is deliberately tiny and deliberately strict: exactly one
//! key type (Ed25519), exactly one multibase (base58btc), and a hard
//! round-trip guarantee — `decode(encode(k)) == k` for every valid key.

pub mod did;

pub use did::{decode_did, encode_did, Did, DidError};
