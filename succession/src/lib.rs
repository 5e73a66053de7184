// Copyright (c) 2026 Heirloom Contributors. MIT License.
// See LICENSE for details.

//! # HEIRLOOM Succession — Recovery Graph & State Machine
//!
//! What happens to a cryptographic identity when its owner dies, or can no
//! longer act? This crate is the answer: a per-account recovery graph of
//! beneficiaries, verifiers, and guardians, and a four-layer state machine
//! that decides whether — and how slowly — control transfers.
//!
//! ## The four layers
//!
//! 1. **Inactivity** — no heartbeat for 90 days moves an account from
//!    `Active` to `Watch`. Advisory and fully reversible: any
//!    authenticated heartbeat moves it back.
//! 2. **Claim** — a beneficiary with a completed cryptographic handshake
//!    submits a signed claim with certified documents. The only doorway
//!    into `InSuccession`.
//! 3. **Quorum** — nothing is released until at least two independent
//!    verifiers hold active edges and present valid attestations. A gate,
//!    not a transition.
//! 4. **Cooling-off** — for 60 days after the claim, the owner or any
//!    guardian can halt the process cold. A halt lands the account in
//!    `Suspended`, a deliberately sticky state that only out-of-band
//!    review can clear.
//!
//! ## Trust model
//!
//! Beneficiaries are **accounts, not email addresses**. Every edge in the
//! recovery graph requires signatures from both sides before it counts
//! for anything — a relationship nobody acknowledged is a relationship
//! that grants nothing. This is the single most important defense against
//! social-engineering takeover, and the code refuses to compromise on it.
//!
//! ## Architecture
//!
//! - **account** — the account root: DID, status, heartbeat.
//! - **graph** — role edges and the beneficiary handshake.
//! - **attestation** — verifiable credentials consumed as quorum evidence.
//! - **claim** — succession claims and the per-attempt audit ledger.
//! - **payload** — canonical signing digests for every privileged action.
//! - **engine** — the ledger tying it all together, plus a thread-safe
//!   wrapper with an explicit commit boundary.

pub mod account;
pub mod attestation;
pub mod claim;
pub mod config;
pub mod engine;
pub mod graph;
pub mod payload;

pub use account::{evaluate_inactivity, Account, AccountId, AccountStatus};
pub use attestation::{Attestation, AttestationId, CredentialType, Proof, RevocationStatus};
pub use claim::{
    AttemptId, ClaimId, ClaimType, HaltRecord, HalterRole, SuccessionAttempt, SuccessionClaim,
};
pub use config::SuccessionConfig;
pub use engine::{AccessGrant, SharedLedger, SuccessionError, SuccessionLedger};
pub use graph::{
    AccessPhase, EdgeId, GraphError, Handshake, RecoveryGraph, RoleEdge, RoleStatus, RoleType,
    SuccessionPermissions,
};
