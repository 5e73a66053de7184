//! # Succession Claims & the Attempt Ledger
//!
//! A claim is the Layer-2 trigger: a beneficiary asserting, under
//! signature and with certified documents, that the subject has died or
//! is incapacitated. Claims are ephemeral as *inputs* — they drive one
//! state transition — but they are permanent as *records*. Every accepted
//! claim is written to the account's attempt ledger before the transition
//! it causes, so the audit trail can never show an account in succession
//! with no surviving explanation of why.
//!
//! Attempts are first-class and plural: an account that was claimed,
//! halted, reviewed, and claimed again has two distinguishable attempts,
//! each with its own claim, its own cooling-off anchor, and — if it came
//! to that — its own halt record naming who pulled the brake and why.

use chrono::{DateTime, Utc};
use heirloom_protocol::crypto::keys::HeirloomSignature;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::account::AccountId;

/// Opaque claim identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(Uuid);

impl ClaimId {
    /// Mint a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the claimant asserts happened to the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// The subject has died. Requires a certified death certificate.
    Death,
    /// The subject is alive but permanently unable to act.
    Incapacity,
}

impl ClaimType {
    /// Stable lowercase name, used in canonical signing payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Death => "death",
            ClaimType::Incapacity => "incapacity",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A signed succession claim.
///
/// The certified documents themselves live in blob storage; the claim
/// carries only a reference and a SHA-256 content hash, which is all the
/// core ever needs to bind the claim to its evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessionClaim {
    /// Claim identifier.
    pub claim_id: ClaimId,
    /// The beneficiary making the claim.
    pub claimant: AccountId,
    /// The account being claimed.
    pub subject: AccountId,
    /// What is being asserted.
    pub claim_type: ClaimType,
    /// Reference to the certified documents in blob storage.
    pub certified_docs_ref: String,
    /// Hex SHA-256 of the referenced blob.
    pub docs_hash: String,
    /// Claimant's signature over the canonical claim payload. Base64.
    pub signature: String,
    /// When the claimant signed and submitted.
    pub submitted_at: DateTime<Utc>,
}

impl SuccessionClaim {
    /// Assemble a claim record from its parts.
    pub fn new(
        claimant: AccountId,
        subject: AccountId,
        claim_type: ClaimType,
        certified_docs_ref: impl Into<String>,
        docs_hash: impl Into<String>,
        signature: &HeirloomSignature,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            claim_id: ClaimId::new(),
            claimant,
            subject,
            claim_type,
            certified_docs_ref: certified_docs_ref.into(),
            docs_hash: docs_hash.into(),
            signature: signature.to_base64(),
            submitted_at,
        }
    }
}

/// Who exercised the halt authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalterRole {
    /// The subject themselves — alive after all.
    Owner,
    /// An acknowledged guardian.
    Guardian,
}

impl fmt::Display for HalterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalterRole::Owner => write!(f, "owner"),
            HalterRole::Guardian => write!(f, "guardian"),
        }
    }
}

/// The panic-freeze record written when a succession attempt is halted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaltRecord {
    /// Who halted.
    pub halted_by: AccountId,
    /// In what capacity.
    pub halter_role: HalterRole,
    /// Stated reason, preserved verbatim for the review process.
    pub reason: String,
    /// When the halt landed.
    pub halted_at: DateTime<Utc>,
}

/// Opaque attempt identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Mint a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One succession attempt: the claim that opened it, when it opened, and
/// how it ended (if it has).
///
/// `started_at` is the cooling-off anchor — Layer 4's window is measured
/// from here, and Layer 3's phase clamp reads it too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessionAttempt {
    /// Attempt identifier.
    pub attempt_id: AttemptId,
    /// The accepted claim that opened this attempt.
    pub claim: SuccessionClaim,
    /// When the account entered `InSuccession` for this attempt.
    pub started_at: DateTime<Utc>,
    /// The halt that ended this attempt, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<HaltRecord>,
}

impl SuccessionAttempt {
    /// Open a new attempt from an accepted claim.
    pub fn open(claim: SuccessionClaim, started_at: DateTime<Utc>) -> Self {
        Self {
            attempt_id: AttemptId::new(),
            claim,
            started_at,
            halted: None,
        }
    }

    /// True while this attempt is still driving the account's state.
    pub fn is_open(&self) -> bool {
        self.halted.is_none()
    }
}
