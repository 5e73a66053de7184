//! # The Succession Ledger
//!
//! The stateful heart of HEIRLOOM: accounts, their recovery graphs, and
//! the four-layer trigger logic, held as id-indexed records in flat
//! tables. Relations are resolved by lookup, never by object reference —
//! the account/edge/attestation graph is circular on paper, and arenas
//! with indices are how you model that without fighting the borrow
//! checker or inventing ownership cycles.
//!
//! ## Authorization
//!
//! Every mutating operation authenticates its actor before touching
//! state: the actor's account is resolved, the action's canonical payload
//! digest is rebuilt from the same fields the actor signed (see
//! [`crate::payload`]), and the signature is checked against the actor's
//! registered key. A failed check is [`SuccessionError::Forbidden`] — the
//! caller learns the action was rejected, not why the crypto said no.
//!
//! ## Atomicity
//!
//! Operations validate first and mutate last. Every path either returns a
//! named error with the ledger untouched, or applies its full effect —
//! state, timestamps, and audit records together. Claims are written to
//! the attempt ledger *before* the status transition they trigger, so an
//! account can never be observed in succession without a recorded reason.
//!
//! ## Concurrency
//!
//! `SuccessionLedger` itself is single-threaded by design; operations on
//! one account must serialize because the handshake and every transition
//! are read-then-conditionally-write. [`SharedLedger`] provides the
//! thread-safe wrapper with an explicit commit boundary for callers that
//! need one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use heirloom_protocol::crypto::keys::{HeirloomPublicKey, HeirloomSignature};
use heirloom_protocol::crypto::signing::verify_payload;
use heirloom_protocol::identity::{Did, DidError};

use crate::account::{evaluate_inactivity, Account, AccountId, AccountStatus};
use crate::attestation::Attestation;
use crate::claim::{AttemptId, HaltRecord, HalterRole, SuccessionAttempt, SuccessionClaim};
use crate::config::SuccessionConfig;
use crate::graph::{
    AccessPhase, EdgeId, GraphError, RecoveryGraph, RoleEdge, RoleType, SuccessionPermissions,
};
use crate::payload;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from succession-ledger operations.
///
/// Each rejection is distinct on purpose: clients must be able to tell
/// "not yet authorized" from "structurally invalid" from "already
/// terminal" without parsing strings.
#[derive(Debug, Error)]
pub enum SuccessionError {
    /// The referenced account is not registered.
    #[error("account not found")]
    AccountNotFound,

    /// The proposed role's target does not resolve to a registered
    /// account. Beneficiaries are accounts, not contact addresses.
    #[error("target account not found: recovery roles must name registered accounts")]
    TargetNotAccount,

    /// An identity with this key is already registered.
    #[error("an identity for this public key already exists")]
    DuplicateIdentity,

    /// The claimant does not hold an acknowledged Beneficiary edge on the
    /// subject.
    #[error("claimant is not an active beneficiary for this account")]
    NotBeneficiary,

    /// A succession is already in progress; one attempt at a time.
    #[error("succession is already in progress for this account")]
    AlreadyInSuccession,

    /// The subject is suspended; nothing moves until review clears it.
    #[error("account is suspended pending review")]
    AccountSuspended,

    /// Halt requested, but no succession is in progress.
    #[error("no succession process to halt")]
    NothingToHalt,

    /// Release requested, but no succession is in progress.
    #[error("account is not in succession")]
    NotInSuccession,

    /// Reinstatement requested, but the account is not suspended.
    #[error("account is not suspended")]
    NotSuspended,

    /// The actor is not authorized for this operation — wrong account,
    /// missing role, or a signature that does not verify.
    #[error("operation not authorized")]
    Forbidden,

    /// The cooling-off window has closed; the halt authority has lapsed.
    #[error("the cooling-off window has closed; succession can no longer be halted")]
    CoolingOffExpired,

    /// Fewer valid, independent verifier attestations than the quorum
    /// requires.
    #[error("verifier quorum not met")]
    QuorumNotMet,

    /// A recovery-graph rule rejected the operation.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The supplied key could not be turned into an identity.
    #[error(transparent)]
    Did(#[from] DidError),
}

// ---------------------------------------------------------------------------
// Access Grants
// ---------------------------------------------------------------------------

/// The staged-release decision Layer 3 hands to the vault layer.
///
/// While the cooling-off window is open, the phase is clamped to
/// [`AccessPhase::A`] and access is read-only regardless of what the
/// owner granted — a fraudulent claim that somehow assembles a quorum
/// still cannot move anything for sixty days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// The beneficiary receiving access.
    pub beneficiary: AccountId,
    /// Release phase currently in force.
    pub phase: AccessPhase,
    /// Whether access is read-only at this phase.
    pub read_only: bool,
    /// Vault sections covered by the grant.
    pub vault_access: Vec<String>,
    /// When this grant was computed.
    pub granted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SuccessionLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountRecord {
    account: Account,
    graph: RecoveryGraph,
    attempts: Vec<SuccessionAttempt>,
}

/// In-memory ledger of accounts, recovery graphs, and succession attempts.
///
/// This is the core the persistence/API layer wraps: it owns the rules,
/// the collaborators own durability and transport. All lookups are by id
/// or DID; all state lives in flat tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessionLedger {
    accounts: HashMap<AccountId, AccountRecord>,
    by_did: HashMap<Did, AccountId>,
    edge_owners: HashMap<EdgeId, AccountId>,
    config: SuccessionConfig,
}

impl SuccessionLedger {
    /// Create an empty ledger with default policy.
    pub fn new() -> Self {
        Self::with_config(SuccessionConfig::default())
    }

    /// Create an empty ledger with explicit policy parameters.
    pub fn with_config(config: SuccessionConfig) -> Self {
        Self {
            accounts: HashMap::new(),
            by_did: HashMap::new(),
            edge_owners: HashMap::new(),
            config,
        }
    }

    /// The policy in force.
    pub fn config(&self) -> &SuccessionConfig {
        &self.config
    }

    // -- registration & lookup ------------------------------------------------

    /// Register a new identity for an Ed25519 public key.
    ///
    /// The DID is derived on the spot; the account starts `Active` with
    /// its heartbeat stamped at `now`.
    ///
    /// # Errors
    ///
    /// [`DidError::InvalidKeyLength`] (via [`SuccessionError::Did`]) for
    /// anything but 32 bytes; [`SuccessionError::DuplicateIdentity`] if
    /// the key is already registered.
    pub fn create_identity(
        &mut self,
        public_key: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Account, SuccessionError> {
        let bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| DidError::InvalidKeyLength(public_key.len()))?;
        let account = Account::new(HeirloomPublicKey::from_bytes(bytes), now);

        if self.by_did.contains_key(&account.did) {
            return Err(SuccessionError::DuplicateIdentity);
        }

        tracing::info!(account = %account.id, did = %account.did, "identity created");
        self.by_did.insert(account.did.clone(), account.id);
        self.accounts.insert(
            account.id,
            AccountRecord {
                account: account.clone(),
                graph: RecoveryGraph::new(account.id),
                attempts: Vec::new(),
            },
        );
        Ok(account)
    }

    /// Look up an account by id.
    pub fn account(&self, id: AccountId) -> Result<&Account, SuccessionError> {
        self.accounts
            .get(&id)
            .map(|r| &r.account)
            .ok_or(SuccessionError::AccountNotFound)
    }

    /// Look up an account by DID.
    pub fn account_by_did(&self, did: &Did) -> Option<&Account> {
        let id = self.by_did.get(did)?;
        self.accounts.get(id).map(|r| &r.account)
    }

    /// The recovery graph owned by an account.
    pub fn graph(&self, id: AccountId) -> Result<&RecoveryGraph, SuccessionError> {
        self.accounts
            .get(&id)
            .map(|r| &r.graph)
            .ok_or(SuccessionError::AccountNotFound)
    }

    /// The succession attempt ledger for an account, oldest first.
    pub fn attempts(&self, id: AccountId) -> Result<&[SuccessionAttempt], SuccessionError> {
        self.accounts
            .get(&id)
            .map(|r| r.attempts.as_slice())
            .ok_or(SuccessionError::AccountNotFound)
    }

    fn record(&self, id: AccountId) -> Result<&AccountRecord, SuccessionError> {
        self.accounts.get(&id).ok_or(SuccessionError::AccountNotFound)
    }

    fn record_mut(&mut self, id: AccountId) -> Result<&mut AccountRecord, SuccessionError> {
        self.accounts
            .get_mut(&id)
            .ok_or(SuccessionError::AccountNotFound)
    }

    // -- Layer 1: heartbeat & inactivity --------------------------------------

    /// Record authenticated activity for an account.
    ///
    /// Returns the resulting status (`Watch` accounts come back to
    /// `Active`; succession states are untouched).
    pub fn record_heartbeat(
        &mut self,
        id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<AccountStatus, SuccessionError> {
        let record = self.record_mut(id)?;
        let before = record.account.status;
        record.account.record_heartbeat(now);
        if before == AccountStatus::Watch && record.account.status == AccountStatus::Active {
            tracing::info!(account = %id, "heartbeat cleared watch state");
        }
        Ok(record.account.status)
    }

    /// Layer 1, read-only: the status the account *should* have at `now`.
    pub fn evaluate_inactivity(
        &self,
        id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<AccountStatus, SuccessionError> {
        let record = self.record(id)?;
        Ok(evaluate_inactivity(&record.account, now, &self.config))
    }

    /// Layer 1, applying: persist the inactivity evaluation. Called by
    /// the external scheduler; a no-op for accounts that are current.
    pub fn sweep_inactivity(
        &mut self,
        id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<AccountStatus, SuccessionError> {
        let evaluated = self.evaluate_inactivity(id, now)?;
        let record = self.record_mut(id)?;
        if record.account.status != evaluated {
            tracing::info!(
                account = %id,
                from = %record.account.status,
                to = %evaluated,
                "inactivity sweep moved account to watch"
            );
            record.account.status = evaluated;
        }
        Ok(evaluated)
    }

    // -- recovery graph operations --------------------------------------------

    /// Propose a recovery role. Layer 0 of everything else: the edge is
    /// created `Pending` and counts for nothing until the target
    /// acknowledges.
    ///
    /// The owner's signature must cover the canonical proposal payload
    /// for exactly these fields at exactly `at`.
    #[allow(clippy::too_many_arguments)]
    pub fn propose_role(
        &mut self,
        owner: AccountId,
        target: AccountId,
        role_type: RoleType,
        priority: u32,
        permissions: SuccessionPermissions,
        verification_scope: Option<serde_json::Value>,
        notes: Option<String>,
        owner_signature: &HeirloomSignature,
        at: DateTime<Utc>,
    ) -> Result<RoleEdge, SuccessionError> {
        if !self.accounts.contains_key(&owner) {
            return Err(SuccessionError::AccountNotFound);
        }
        let target_did = self
            .accounts
            .get(&target)
            .map(|r| r.account.did.clone())
            .ok_or(SuccessionError::TargetNotAccount)?;

        let record = self.record(owner)?;
        let proposal = payload::role_proposal(
            &record.account.did,
            &target_did,
            role_type,
            priority,
            at,
        );
        if !verify_payload(&record.account.public_key, &proposal, owner_signature) {
            return Err(SuccessionError::Forbidden);
        }

        let record = self.record_mut(owner)?;
        let edge = record
            .graph
            .propose(
                target,
                role_type,
                priority,
                permissions,
                verification_scope,
                notes,
                owner_signature,
                at,
            )?
            .clone();

        // Defining a role is authenticated activity.
        record.account.record_heartbeat(at);

        self.edge_owners.insert(edge.edge_id, owner);
        tracing::info!(
            account = %owner,
            target = %target,
            role = %role_type,
            edge = %edge.edge_id,
            "recovery role proposed"
        );
        Ok(edge)
    }

    /// Complete the handshake: the target acknowledges a pending role.
    ///
    /// The target's signature must cover the canonical acknowledgment
    /// payload binding this specific edge.
    pub fn acknowledge_role(
        &mut self,
        edge_id: EdgeId,
        target_signature: &HeirloomSignature,
        at: DateTime<Utc>,
    ) -> Result<RoleEdge, SuccessionError> {
        let owner = *self
            .edge_owners
            .get(&edge_id)
            .ok_or(SuccessionError::Graph(GraphError::EdgeNotFound))?;

        let target = self
            .record(owner)?
            .graph
            .edge(edge_id)
            .ok_or(SuccessionError::Graph(GraphError::EdgeNotFound))?
            .target;
        let target_account = self.account(target)?;

        let acknowledgment = payload::role_acknowledgment(edge_id, &target_account.did, at);
        if !verify_payload(&target_account.public_key, &acknowledgment, target_signature) {
            return Err(SuccessionError::Forbidden);
        }

        let record = self.record_mut(owner)?;
        let edge = record.graph.acknowledge(edge_id, target_signature, at)?.clone();
        tracing::info!(
            account = %owner,
            target = %target,
            role = %edge.role_type,
            edge = %edge_id,
            "recovery role acknowledged and active"
        );
        Ok(edge)
    }

    /// Revoke a role. Owner-only and terminal.
    pub fn revoke_role(
        &mut self,
        edge_id: EdgeId,
        requester: AccountId,
        signature: &HeirloomSignature,
        at: DateTime<Utc>,
    ) -> Result<(), SuccessionError> {
        let owner = *self
            .edge_owners
            .get(&edge_id)
            .ok_or(SuccessionError::Graph(GraphError::EdgeNotFound))?;

        let requester_account = self.account(requester)?;
        let revocation = payload::role_revocation(edge_id, &requester_account.did, at);
        if !verify_payload(&requester_account.public_key, &revocation, signature) {
            return Err(SuccessionError::Forbidden);
        }

        let record = self.record_mut(owner)?;
        record.graph.revoke(edge_id, requester, at)?;
        tracing::info!(account = %owner, edge = %edge_id, "recovery role revoked");
        Ok(())
    }

    // -- Layer 3 predicate ----------------------------------------------------

    /// Does the account have at least the quorum of acknowledged,
    /// independent verifiers?
    pub fn quorum_met(&self, owner: AccountId) -> Result<bool, SuccessionError> {
        Ok(self.record(owner)?.graph.quorum_met(self.config.verifier_quorum))
    }

    // -- Layer 2: claims ------------------------------------------------------

    /// Submit a succession claim. The only doorway into `InSuccession`.
    ///
    /// The claim is recorded in the attempt ledger before the status
    /// transition it triggers — audit first, consequences second.
    ///
    /// # Errors
    ///
    /// - [`SuccessionError::NotBeneficiary`] — no acknowledged Beneficiary
    ///   edge from subject to claimant.
    /// - [`SuccessionError::AlreadyInSuccession`] — one attempt at a time.
    /// - [`SuccessionError::AccountSuspended`] — a suspended account takes
    ///   no claims until review clears it.
    /// - [`SuccessionError::Forbidden`] — the claim signature does not
    ///   verify against the claimant's key.
    pub fn submit_claim(&mut self, claim: SuccessionClaim) -> Result<AttemptId, SuccessionError> {
        let claimant_account = self.account(claim.claimant)?.clone();
        let subject_record = self.record(claim.subject)?;

        if !subject_record
            .graph
            .has_active(RoleType::Beneficiary, claim.claimant)
        {
            return Err(SuccessionError::NotBeneficiary);
        }

        match subject_record.account.status {
            AccountStatus::InSuccession => return Err(SuccessionError::AlreadyInSuccession),
            AccountStatus::Suspended => return Err(SuccessionError::AccountSuspended),
            AccountStatus::Active | AccountStatus::Watch => {}
        }

        let submission = payload::claim_submission(
            &subject_record.account.did,
            &claimant_account.did,
            claim.claim_type,
            &claim.certified_docs_ref,
            &claim.docs_hash,
            claim.submitted_at,
        );
        let signature = HeirloomSignature::from_base64(&claim.signature)
            .map_err(|_| SuccessionError::Forbidden)?;
        if !verify_payload(&claimant_account.public_key, &submission, &signature) {
            return Err(SuccessionError::Forbidden);
        }

        let submitted_at = claim.submitted_at;
        let claim_type = claim.claim_type;
        let subject = claim.subject;
        let claimant = claim.claimant;

        let record = self.record_mut(subject)?;
        // Audit before transition: the attempt record must exist before the
        // account is observable as InSuccession.
        let attempt = SuccessionAttempt::open(claim, submitted_at);
        let attempt_id = attempt.attempt_id;
        record.attempts.push(attempt);
        record.account.status = AccountStatus::InSuccession;

        tracing::info!(
            subject = %subject,
            claimant = %claimant,
            claim_type = %claim_type,
            attempt = %attempt_id,
            "succession claim accepted; account in succession"
        );
        Ok(attempt_id)
    }

    // -- Layer 3: quorum-gated release ----------------------------------------

    /// Evaluate the staged-release gate for an account in succession.
    ///
    /// Not a state transition: the account stays `InSuccession` whatever
    /// this returns. Access is released only when at least the quorum of
    /// *distinct* issuers (a) hold acknowledged Verifier edges on the
    /// subject and (b) present attestations that are valid at `now`.
    ///
    /// The grant is derived from the claimant's beneficiary edge, with
    /// the phase clamped to read-only Phase A while the cooling-off
    /// window is open.
    pub fn try_release(
        &self,
        subject: AccountId,
        attestations: &[Attestation],
        now: DateTime<Utc>,
    ) -> Result<AccessGrant, SuccessionError> {
        let record = self.record(subject)?;
        if record.account.status != AccountStatus::InSuccession {
            return Err(SuccessionError::NotInSuccession);
        }
        let attempt = record
            .attempts
            .iter()
            .rev()
            .find(|a| a.is_open())
            .ok_or(SuccessionError::NotInSuccession)?;

        let mut issuers: Vec<AccountId> = Vec::new();
        for attestation in attestations {
            if attestation.subject != subject || !attestation.is_valid(now) {
                continue;
            }
            let Some(&issuer) = self.by_did.get(&attestation.issuer_did) else {
                continue;
            };
            if record.graph.has_active(RoleType::Verifier, issuer) && !issuers.contains(&issuer) {
                issuers.push(issuer);
            }
        }
        if issuers.len() < self.config.verifier_quorum {
            return Err(SuccessionError::QuorumNotMet);
        }

        let claimant = attempt.claim.claimant;
        let edge = record
            .graph
            .active_edges(RoleType::Beneficiary)
            .into_iter()
            .find(|e| e.target == claimant)
            .ok_or(SuccessionError::NotBeneficiary)?;

        let cooling_off_open = now < attempt.started_at + self.config.cooling_off();
        let permissions = &edge.succession_permissions;
        let grant = if cooling_off_open {
            AccessGrant {
                beneficiary: claimant,
                phase: AccessPhase::A,
                read_only: true,
                vault_access: permissions.vault_access.clone(),
                granted_at: now,
            }
        } else {
            AccessGrant {
                beneficiary: claimant,
                phase: permissions.phase,
                read_only: permissions.read_only,
                vault_access: permissions.vault_access.clone(),
                granted_at: now,
            }
        };

        tracing::info!(
            subject = %subject,
            beneficiary = %claimant,
            verifiers = issuers.len(),
            phase = ?grant.phase,
            "verifier quorum met; access released"
        );
        Ok(grant)
    }

    // -- Layer 4: cooling-off halt --------------------------------------------

    /// Halt an in-progress succession — the panic freeze.
    ///
    /// Available to the subject owner (alive after all) or any
    /// acknowledged guardian, for the duration of the cooling-off window.
    /// On success the account lands in `Suspended`, which nothing in this
    /// crate leaves automatically: clearing it is the job of the
    /// out-of-band review committed through [`reinstate`](Self::reinstate).
    pub fn halt(
        &mut self,
        subject: AccountId,
        halter: AccountId,
        reason: &str,
        signature: &HeirloomSignature,
        at: DateTime<Utc>,
    ) -> Result<(), SuccessionError> {
        let record = self.record(subject)?;
        if record.account.status != AccountStatus::InSuccession {
            return Err(SuccessionError::NothingToHalt);
        }

        let halter_role = if halter == subject {
            HalterRole::Owner
        } else if record.graph.has_active(RoleType::Guardian, halter) {
            HalterRole::Guardian
        } else {
            return Err(SuccessionError::Forbidden);
        };

        let started_at = record
            .attempts
            .iter()
            .rev()
            .find(|a| a.is_open())
            .ok_or(SuccessionError::NothingToHalt)?
            .started_at;
        if at > started_at + self.config.cooling_off() {
            return Err(SuccessionError::CoolingOffExpired);
        }

        // The halter is the subject or an edge target, both registered.
        let halter_account = self.account(halter)?;
        let halt_payload =
            payload::succession_halt(&record.account.did, &halter_account.did, reason, at);
        if !verify_payload(&halter_account.public_key, &halt_payload, signature) {
            return Err(SuccessionError::Forbidden);
        }

        let record = self.record_mut(subject)?;
        let attempt = record
            .attempts
            .iter_mut()
            .rev()
            .find(|a| a.is_open())
            .ok_or(SuccessionError::NothingToHalt)?;
        attempt.halted = Some(HaltRecord {
            halted_by: halter,
            halter_role,
            reason: reason.to_string(),
            halted_at: at,
        });
        record.account.status = AccountStatus::Suspended;

        tracing::warn!(
            subject = %subject,
            halter = %halter,
            role = %halter_role,
            reason,
            "succession halted; account suspended for review"
        );
        Ok(())
    }

    /// Commit the outcome of the out-of-band review of a suspended
    /// account, returning it to `Active`.
    ///
    /// This is deliberately the *only* exit from `Suspended`, and it has
    /// no self-service path: the review process itself — who convenes it,
    /// what it examines — lives entirely outside the core.
    pub fn reinstate(
        &mut self,
        subject: AccountId,
        now: DateTime<Utc>,
    ) -> Result<(), SuccessionError> {
        let record = self.record_mut(subject)?;
        if record.account.status != AccountStatus::Suspended {
            return Err(SuccessionError::NotSuspended);
        }
        record.account.status = AccountStatus::Active;
        record.account.last_heartbeat = now;
        tracing::info!(subject = %subject, "account reinstated after review");
        Ok(())
    }
}

impl Default for SuccessionLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SharedLedger
// ---------------------------------------------------------------------------

/// Thread-safe wrapper around a [`SuccessionLedger`] with an explicit
/// commit boundary.
///
/// Reads run concurrently; mutations serialize through [`commit`]. The
/// lock is coarse — one writer across the whole ledger — because
/// cross-account operations (a proposal touches two accounts, a claim
/// three) make per-account locks a deadlock generator, and the critical
/// sections here are pure in-memory work with no I/O to wait on.
/// Finer-grained parallelism belongs to the persistence collaborator,
/// which shards by account anyway.
///
/// [`commit`]: SharedLedger::commit
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<SuccessionLedger>>,
}

impl SharedLedger {
    /// Wrap a ledger for shared use.
    pub fn new(ledger: SuccessionLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Run a read-only view against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&SuccessionLedger) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run a mutating operation as one atomic commit.
    pub fn commit<R>(&self, f: impl FnOnce(&mut SuccessionLedger) -> R) -> R {
        f(&mut self.inner.write())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
