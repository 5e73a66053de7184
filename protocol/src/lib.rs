// Copyright (c) 2026 Heirloom Contributors. MIT License.
// See LICENSE for details.

//! # HEIRLOOM Protocol — Cryptographic Identity Layer
//!
//! HEIRLOOM anchors a citizen's digital identity to a single Ed25519 keypair
//! and governs what happens to that identity when its owner can no longer
//! act for themselves. This crate is the stateless half of the system: the
//! primitives that turn a public key into a self-certifying identifier,
//! authenticate every privileged action, and keep vault contents opaque to
//! everyone but their owner.
//!
//! ## Architecture
//!
//! - **identity** — `did:key` codec. A 32-byte Ed25519 public key *is* the
//!   identity; the DID is just its portable spelling.
//! - **crypto** — Signing, canonical action payloads, Argon2id key
//!   derivation, and XSalsa20-Poly1305 envelope encryption for the
//!   zero-knowledge vault.
//! - **config** — Every protocol constant in one place.
//!
//! The stateful half — accounts, the recovery graph, and the succession
//! state machine — lives in the `heirloom-succession` crate, which builds
//! exclusively on the primitives exported here.
//!
//! ## Design Philosophy
//!
//! 1. Deterministic where possible: DIDs, signatures, and derived keys are
//!    pure functions of their inputs. Randomness only where it buys
//!    security (DEKs, nonces, salts).
//! 2. No unsafe code in crypto paths.
//! 3. Verification never panics. Malformed input is a `false` or a typed
//!    error, not a crash.

pub mod config;
pub mod crypto;
pub mod identity;
