//! # The Account Root
//!
//! Core identity record for each citizen. UUID-keyed (not email-keyed)
//! for sovereignty: an account is reachable only through its identifier
//! or its DID, and the DID is just the owner's public key in portable
//! spelling.
//!
//! Accounts are never hard-deleted. The lifecycle is entirely soft,
//! expressed by [`AccountStatus`] — which is also the visible output of
//! the succession state machine. External layers persist it, notify on
//! it, and gate vault access by it; this module only decides what it is.

use chrono::{DateTime, Utc};
use heirloom_protocol::crypto::keys::HeirloomPublicKey;
use heirloom_protocol::identity::Did;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::SuccessionConfig;

/// Opaque account identifier. UUID v4 — no meaning, no ordering, no PII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Mint a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account states in the recovery lifecycle.
///
/// Distinct from per-edge [`crate::graph::RoleStatus`] — this is the
/// account's own position in the succession flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Normal operation.
    Active,
    /// Inactivity threshold exceeded (Layer 1). Advisory; any heartbeat
    /// returns the account to `Active`.
    Watch,
    /// Frozen by a halt or a fraud flag. Sticky: only an out-of-band
    /// review process clears it. There is no code path back to `Active`
    /// in this crate, on purpose.
    Suspended,
    /// A succession claim is in progress; staged access release applies.
    InSuccession,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Watch => write!(f, "watch"),
            AccountStatus::Suspended => write!(f, "suspended"),
            AccountStatus::InSuccession => write!(f, "in_succession"),
        }
    }
}

/// The citizen account: one keypair, one DID, one status, one heartbeat.
///
/// The key and DID are fixed at registration and never change — rotating
/// a key means registering a new account and re-building the recovery
/// graph, which is a feature: every attestor and beneficiary re-confirms
/// against the new key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Primary identifier.
    pub id: AccountId,
    /// The owner's DID (`did:key`, derived from `public_key`). Immutable.
    pub did: Did,
    /// The owner's Ed25519 public key. Immutable.
    pub public_key: HeirloomPublicKey,
    /// Position in the recovery lifecycle.
    pub status: AccountStatus,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Most recent authenticated activity. Layer 1 watches this.
    pub last_heartbeat: DateTime<Utc>,
}

impl Account {
    /// Create an account for a public key at registration time.
    pub fn new(public_key: HeirloomPublicKey, now: DateTime<Utc>) -> Self {
        let did = Did::from_public_key(&public_key);
        Self {
            id: AccountId::new(),
            did,
            public_key,
            status: AccountStatus::Active,
            created_at: now,
            last_heartbeat: now,
        }
    }

    /// Record authenticated activity.
    ///
    /// Always stamps `last_heartbeat`. If the account was in `Watch`, it
    /// returns to `Active` — the owner is demonstrably alive and Layer 1
    /// stands down. `InSuccession` and `Suspended` are untouched: a
    /// heartbeat is not how you contest a succession; [`halt`] is.
    ///
    /// [`halt`]: crate::engine::SuccessionLedger::halt
    pub fn record_heartbeat(&mut self, now: DateTime<Utc>) {
        self.last_heartbeat = now;
        if self.status == AccountStatus::Watch {
            self.status = AccountStatus::Active;
        }
    }

    /// True while the succession machinery owns this account's fate.
    pub fn succession_locked(&self) -> bool {
        matches!(
            self.status,
            AccountStatus::InSuccession | AccountStatus::Suspended
        )
    }
}

/// Layer 1: evaluate the inactivity trigger.
///
/// Pure function of `(status, last_heartbeat, now, threshold)` — returns
/// the status the account *should* have, without touching anything. The
/// external scheduler calls this periodically and persists the result via
/// [`sweep_inactivity`].
///
/// Only `Active` escalates to `Watch`; `Watch` de-escalates through
/// heartbeats, not through this function; `InSuccession` and `Suspended`
/// are out of Layer 1's jurisdiction entirely.
///
/// [`sweep_inactivity`]: crate::engine::SuccessionLedger::sweep_inactivity
pub fn evaluate_inactivity(
    account: &Account,
    now: DateTime<Utc>,
    config: &SuccessionConfig,
) -> AccountStatus {
    match account.status {
        AccountStatus::Active => {
            if now.signed_duration_since(account.last_heartbeat) > config.watch_after() {
                AccountStatus::Watch
            } else {
                AccountStatus::Active
            }
        }
        other => other,
    }
}
