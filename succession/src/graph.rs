//! # The Recovery Graph
//!
//! Each account owns a graph of role edges, not just a beneficiary name
//! scribbled in a form field. An edge names another *account* — never an
//! email address — as beneficiary, verifier, or guardian, and the edge
//! only counts once both parties have signed it.
//!
//! ## The Beneficiary Handshake
//!
//! 1. The owner proposes the role, signing the proposal. The edge is
//!    created `Pending` with the owner's signature recorded.
//! 2. The target acknowledges, signing the acknowledgment. Only at the
//!    moment both signatures are present does the edge flip to `Active` —
//!    atomically, with `acknowledged_at` stamped in the same operation.
//!
//! No edge is ever `Active` with a missing signature on either side.
//! That invariant is what makes "my uncle says I'm the beneficiary"
//! worthless as an attack: the uncle's say-so is an unacknowledged
//! `Pending` edge, and `Pending` edges grant nothing.
//!
//! ## Uniqueness & revocation
//!
//! At most one non-revoked edge per `(owner, target, role_type)` triple.
//! `Revoked` is terminal and owner-only; a revoked edge stays in the
//! table as an audit record but never counts for quorum or claims again.

use chrono::{DateTime, Utc};
use heirloom_protocol::crypto::keys::HeirloomSignature;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::account::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during recovery-graph operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// An account tried to assign a recovery role to itself.
    #[error("cannot assign a recovery role to yourself")]
    SelfReference,

    /// A non-revoked edge with the same `(owner, target, role_type)`
    /// triple already exists.
    #[error("a non-revoked {0} role already exists for this target")]
    DuplicateRole(RoleType),

    /// The edge is not `Pending`, so it cannot be acknowledged.
    #[error("role cannot be acknowledged in {0} status")]
    NotPending(RoleStatus),

    /// Someone other than the owning account tried to revoke the edge.
    #[error("only the account owner may revoke a recovery role")]
    Forbidden,

    /// The edge is already revoked. Revocation is terminal.
    #[error("role is already revoked")]
    AlreadyRevoked,

    /// No edge with that identifier exists in this graph.
    #[error("recovery role not found")]
    EdgeNotFound,
}

// ---------------------------------------------------------------------------
// Role Types & Status
// ---------------------------------------------------------------------------

/// Opaque edge identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(Uuid);

impl EdgeId {
    /// Mint a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of recovery roles. Exhaustively matched in the state
/// machine — adding a variant is a protocol change, not a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    /// Inherits access once succession is verified. Must be an account.
    Beneficiary,
    /// Independent party whose attestation counts toward quorum
    /// (notary, insurer, registrar).
    Verifier,
    /// Can halt a succession during the cooling-off window.
    Guardian,
}

impl RoleType {
    /// Stable lowercase name, used in canonical signing payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Beneficiary => "beneficiary",
            RoleType::Verifier => "verifier",
            RoleType::Guardian => "guardian",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single role edge. Distinct from the account-level
/// [`crate::account::AccountStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleStatus {
    /// Proposed by the owner, not yet acknowledged by the target.
    Pending,
    /// Both parties have signed. The edge counts.
    Active,
    /// Temporarily out of force (administrative hold).
    Suspended,
    /// Permanently removed. Terminal.
    Revoked,
}

impl fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleStatus::Pending => write!(f, "pending"),
            RoleStatus::Active => write!(f, "active"),
            RoleStatus::Suspended => write!(f, "suspended"),
            RoleStatus::Revoked => write!(f, "revoked"),
        }
    }
}

// ---------------------------------------------------------------------------
// Handshake & Permissions
// ---------------------------------------------------------------------------

/// The two-sided cryptographic acknowledgment on an edge.
///
/// Signatures are stored base64-encoded, exactly as they appear in the
/// persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    /// Owner's signature over the proposal payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_signature: Option<String>,
    /// When the owner signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_signed_at: Option<DateTime<Utc>>,
    /// Target's signature over the acknowledgment payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_signature: Option<String>,
    /// When the target acknowledged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_acknowledged_at: Option<DateTime<Utc>>,
}

impl Handshake {
    /// True when both parties have signed.
    pub fn is_complete(&self) -> bool {
        self.owner_signature.is_some() && self.target_signature.is_some()
    }
}

/// Staged access-release phases. A is always read-only; later phases
/// escalate per the owner's grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessPhase {
    /// Read-only access to the granted vault sections.
    A,
    /// Limited operational access.
    B,
    /// Full control.
    C,
}

/// Permissions a beneficiary receives when succession proceeds.
///
/// Configured by the owner at proposal time; the state machine clamps the
/// phase to [`AccessPhase::A`] while the cooling-off window is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessionPermissions {
    /// Vault sections (document kinds) the beneficiary may reach.
    pub vault_access: Vec<String>,
    /// Whether access is read-only at the granted phase.
    pub read_only: bool,
    /// Target phase once succession completes.
    pub phase: AccessPhase,
}

impl Default for SuccessionPermissions {
    fn default() -> Self {
        Self {
            vault_access: Vec::new(),
            read_only: true,
            phase: AccessPhase::A,
        }
    }
}

// ---------------------------------------------------------------------------
// RoleEdge
// ---------------------------------------------------------------------------

/// One edge in the recovery graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEdge {
    /// Edge identifier.
    pub edge_id: EdgeId,
    /// The account that defined this role.
    pub owner: AccountId,
    /// The account assigned to the role. Always a registered account.
    pub target: AccountId,
    /// What the target is to the owner.
    pub role_type: RoleType,
    /// Priority order among edges of the same type (0 = highest).
    pub priority: u32,
    /// Lifecycle status.
    pub status: RoleStatus,
    /// The two-sided acknowledgment.
    pub handshake: Handshake,
    /// What the target receives on succession (beneficiary edges).
    pub succession_permissions: SuccessionPermissions,
    /// What the target is authorized to verify (verifier edges).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_scope: Option<serde_json::Value>,
    /// Free-form note from the owner ("primary beneficiary — spouse").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When both parties had signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// When the edge was revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RoleEdge {
    /// True when the edge is fully acknowledged and in force.
    pub fn is_active(&self) -> bool {
        self.status == RoleStatus::Active
    }
}

// ---------------------------------------------------------------------------
// RecoveryGraph
// ---------------------------------------------------------------------------

/// The set of role edges owned by one account.
///
/// Edges live in a flat id-indexed table; relationships are resolved by
/// account-id lookup, never by holding references to other records. The
/// structural checks (self-reference, duplicates, handshake atomicity)
/// live here; signature verification and account resolution live one
/// layer up in [`crate::engine::SuccessionLedger`], which is the only
/// intended caller of the mutating methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryGraph {
    owner: AccountId,
    edges: HashMap<EdgeId, RoleEdge>,
}

impl RecoveryGraph {
    /// Create an empty graph for an account.
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            edges: HashMap::new(),
        }
    }

    /// The account this graph belongs to.
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    /// Propose a new role edge. The edge is created `Pending` with the
    /// owner's signature recorded; the target's half of the handshake is
    /// absent until [`acknowledge`](Self::acknowledge).
    ///
    /// # Errors
    ///
    /// - [`GraphError::SelfReference`] if `target` is the owner.
    /// - [`GraphError::DuplicateRole`] if a non-revoked edge with the same
    ///   `(owner, target, role_type)` already exists.
    #[allow(clippy::too_many_arguments)]
    pub fn propose(
        &mut self,
        target: AccountId,
        role_type: RoleType,
        priority: u32,
        permissions: SuccessionPermissions,
        verification_scope: Option<serde_json::Value>,
        notes: Option<String>,
        owner_signature: &HeirloomSignature,
        now: DateTime<Utc>,
    ) -> Result<&RoleEdge, GraphError> {
        if target == self.owner {
            return Err(GraphError::SelfReference);
        }
        if self
            .edges
            .values()
            .any(|e| e.target == target && e.role_type == role_type && e.status != RoleStatus::Revoked)
        {
            return Err(GraphError::DuplicateRole(role_type));
        }

        let edge = RoleEdge {
            edge_id: EdgeId::new(),
            owner: self.owner,
            target,
            role_type,
            priority,
            status: RoleStatus::Pending,
            handshake: Handshake {
                owner_signature: Some(owner_signature.to_base64()),
                owner_signed_at: Some(now),
                target_signature: None,
                target_acknowledged_at: None,
            },
            succession_permissions: permissions,
            verification_scope,
            notes,
            created_at: now,
            acknowledged_at: None,
            revoked_at: None,
        };

        let edge_id = edge.edge_id;
        self.edges.insert(edge_id, edge);
        Ok(&self.edges[&edge_id])
    }

    /// Record the target's acknowledgment, completing the handshake.
    ///
    /// The status flip to `Active` and the `acknowledged_at` stamp happen
    /// in the same mutation as the signature store, and only when both
    /// signatures are present — there is no observable state in which the
    /// edge is `Active` with half a handshake.
    ///
    /// # Errors
    ///
    /// [`GraphError::EdgeNotFound`] / [`GraphError::NotPending`].
    pub fn acknowledge(
        &mut self,
        edge_id: EdgeId,
        target_signature: &HeirloomSignature,
        now: DateTime<Utc>,
    ) -> Result<&RoleEdge, GraphError> {
        let edge = self
            .edges
            .get_mut(&edge_id)
            .ok_or(GraphError::EdgeNotFound)?;

        if edge.status != RoleStatus::Pending {
            return Err(GraphError::NotPending(edge.status));
        }

        edge.handshake.target_signature = Some(target_signature.to_base64());
        edge.handshake.target_acknowledged_at = Some(now);

        if edge.handshake.is_complete() {
            edge.status = RoleStatus::Active;
            edge.acknowledged_at = Some(now);
        }

        Ok(&self.edges[&edge_id])
    }

    /// Revoke an edge. Owner-only, terminal, allowed from any non-revoked
    /// state.
    ///
    /// # Errors
    ///
    /// [`GraphError::EdgeNotFound`] / [`GraphError::Forbidden`] /
    /// [`GraphError::AlreadyRevoked`].
    pub fn revoke(
        &mut self,
        edge_id: EdgeId,
        requester: AccountId,
        now: DateTime<Utc>,
    ) -> Result<(), GraphError> {
        let edge = self
            .edges
            .get_mut(&edge_id)
            .ok_or(GraphError::EdgeNotFound)?;

        if requester != edge.owner {
            return Err(GraphError::Forbidden);
        }
        if edge.status == RoleStatus::Revoked {
            return Err(GraphError::AlreadyRevoked);
        }

        edge.status = RoleStatus::Revoked;
        edge.revoked_at = Some(now);
        Ok(())
    }

    /// Layer 3 predicate: does this account have enough acknowledged,
    /// independent verifiers?
    pub fn quorum_met(&self, threshold: usize) -> bool {
        self.active_edges(RoleType::Verifier).len() >= threshold
    }

    /// Look up an edge by id.
    pub fn edge(&self, edge_id: EdgeId) -> Option<&RoleEdge> {
        self.edges.get(&edge_id)
    }

    /// All `Active` edges of a given role, highest priority first
    /// (priority 0 before 1, ties broken by creation time).
    pub fn active_edges(&self, role_type: RoleType) -> Vec<&RoleEdge> {
        let mut edges: Vec<&RoleEdge> = self
            .edges
            .values()
            .filter(|e| e.role_type == role_type && e.is_active())
            .collect();
        edges.sort_by_key(|e| (e.priority, e.created_at));
        edges
    }

    /// True if `target` holds an `Active` edge of the given role.
    pub fn has_active(&self, role_type: RoleType, target: AccountId) -> bool {
        self.edges
            .values()
            .any(|e| e.role_type == role_type && e.target == target && e.is_active())
    }

    /// Iterate over every edge, revoked ones included (audit view).
    pub fn edges(&self) -> impl Iterator<Item = &RoleEdge> {
        self.edges.values()
    }

    /// Number of edges in the table, revoked ones included.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when no edges have ever been proposed.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heirloom_protocol::crypto::keys::HeirloomKeypair;

    fn now() -> DateTime<Utc> {
        "2026-03-01T00:00:00Z".parse().unwrap()
    }

    fn sig() -> HeirloomSignature {
        HeirloomKeypair::generate().sign(b"test")
    }

    fn propose_one(graph: &mut RecoveryGraph, target: AccountId, role: RoleType) -> EdgeId {
        graph
            .propose(
                target,
                role,
                0,
                SuccessionPermissions::default(),
                None,
                None,
                &sig(),
                now(),
            )
            .unwrap()
            .edge_id
    }

    #[test]
    fn propose_creates_pending_edge_with_owner_signature() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        let edge_id = propose_one(&mut graph, target, RoleType::Beneficiary);
        let edge = graph.edge(edge_id).unwrap();

        assert_eq!(edge.status, RoleStatus::Pending);
        assert!(edge.handshake.owner_signature.is_some());
        assert!(edge.handshake.target_signature.is_none());
        assert!(edge.acknowledged_at.is_none());
        assert!(!graph.has_active(RoleType::Beneficiary, target));
    }

    #[test]
    fn self_reference_rejected() {
        let owner = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);
        let result = graph.propose(
            owner,
            RoleType::Guardian,
            0,
            SuccessionPermissions::default(),
            None,
            None,
            &sig(),
            now(),
        );
        assert_eq!(result.unwrap_err(), GraphError::SelfReference);
    }

    #[test]
    fn duplicate_triple_rejected_while_not_revoked() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        propose_one(&mut graph, target, RoleType::Beneficiary);
        let result = graph.propose(
            target,
            RoleType::Beneficiary,
            1,
            SuccessionPermissions::default(),
            None,
            None,
            &sig(),
            now(),
        );
        assert_eq!(
            result.unwrap_err(),
            GraphError::DuplicateRole(RoleType::Beneficiary)
        );
    }

    #[test]
    fn same_target_different_role_is_fine() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        propose_one(&mut graph, target, RoleType::Beneficiary);
        propose_one(&mut graph, target, RoleType::Guardian);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn revoke_then_repropose_is_fine() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        let edge_id = propose_one(&mut graph, target, RoleType::Verifier);
        graph.revoke(edge_id, owner, now()).unwrap();
        // The triple is free again once the old edge is revoked.
        propose_one(&mut graph, target, RoleType::Verifier);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn acknowledge_completes_handshake_atomically() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        let edge_id = propose_one(&mut graph, target, RoleType::Beneficiary);
        let edge = graph.acknowledge(edge_id, &sig(), now()).unwrap();

        assert_eq!(edge.status, RoleStatus::Active);
        assert!(edge.handshake.is_complete());
        assert!(edge.acknowledged_at.is_some());
        assert!(graph.has_active(RoleType::Beneficiary, target));
    }

    #[test]
    fn acknowledging_twice_fails_not_pending() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        let edge_id = propose_one(&mut graph, target, RoleType::Beneficiary);
        graph.acknowledge(edge_id, &sig(), now()).unwrap();
        let result = graph.acknowledge(edge_id, &sig(), now());
        assert_eq!(
            result.unwrap_err(),
            GraphError::NotPending(RoleStatus::Active)
        );
    }

    #[test]
    fn acknowledge_unknown_edge_fails() {
        let mut graph = RecoveryGraph::new(AccountId::new());
        assert_eq!(
            graph.acknowledge(EdgeId::new(), &sig(), now()).unwrap_err(),
            GraphError::EdgeNotFound
        );
    }

    #[test]
    fn revoke_is_owner_only() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let stranger = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        let edge_id = propose_one(&mut graph, target, RoleType::Guardian);
        assert_eq!(
            graph.revoke(edge_id, stranger, now()).unwrap_err(),
            GraphError::Forbidden
        );
        // Not even the target can revoke the edge pointed at them.
        assert_eq!(
            graph.revoke(edge_id, target, now()).unwrap_err(),
            GraphError::Forbidden
        );
        graph.revoke(edge_id, owner, now()).unwrap();
    }

    #[test]
    fn revoke_is_terminal() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        let edge_id = propose_one(&mut graph, target, RoleType::Beneficiary);
        graph.revoke(edge_id, owner, now()).unwrap();

        assert_eq!(
            graph.revoke(edge_id, owner, now()).unwrap_err(),
            GraphError::AlreadyRevoked
        );
        // A revoked edge cannot be resurrected by acknowledgment either.
        assert_eq!(
            graph.acknowledge(edge_id, &sig(), now()).unwrap_err(),
            GraphError::NotPending(RoleStatus::Revoked)
        );
        assert!(graph.edge(edge_id).unwrap().revoked_at.is_some());
    }

    #[test]
    fn quorum_counts_only_active_verifiers() {
        let owner = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        // One acknowledged verifier, one pending, one beneficiary.
        let v1 = propose_one(&mut graph, AccountId::new(), RoleType::Verifier);
        graph.acknowledge(v1, &sig(), now()).unwrap();
        propose_one(&mut graph, AccountId::new(), RoleType::Verifier);
        let b = propose_one(&mut graph, AccountId::new(), RoleType::Beneficiary);
        graph.acknowledge(b, &sig(), now()).unwrap();

        assert!(!graph.quorum_met(2));

        let v3 = propose_one(&mut graph, AccountId::new(), RoleType::Verifier);
        graph.acknowledge(v3, &sig(), now()).unwrap();
        assert!(graph.quorum_met(2));
    }

    #[test]
    fn active_edges_sorted_by_priority() {
        let owner = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);

        let second = AccountId::new();
        let first = AccountId::new();
        let e2 = graph
            .propose(
                second,
                RoleType::Beneficiary,
                1,
                SuccessionPermissions::default(),
                None,
                None,
                &sig(),
                now(),
            )
            .unwrap()
            .edge_id;
        let e1 = graph
            .propose(
                first,
                RoleType::Beneficiary,
                0,
                SuccessionPermissions::default(),
                None,
                None,
                &sig(),
                now(),
            )
            .unwrap()
            .edge_id;
        graph.acknowledge(e1, &sig(), now()).unwrap();
        graph.acknowledge(e2, &sig(), now()).unwrap();

        let ordered: Vec<AccountId> = graph
            .active_edges(RoleType::Beneficiary)
            .iter()
            .map(|e| e.target)
            .collect();
        assert_eq!(ordered, vec![first, second]);
    }

    #[test]
    fn edge_serializes_with_stable_field_names() {
        let owner = AccountId::new();
        let target = AccountId::new();
        let mut graph = RecoveryGraph::new(owner);
        let edge_id = propose_one(&mut graph, target, RoleType::Beneficiary);

        let json = serde_json::to_value(graph.edge(edge_id).unwrap()).unwrap();
        assert_eq!(json["role_type"], "beneficiary");
        assert_eq!(json["status"], "pending");
        assert!(json["handshake"]["owner_signature"].is_string());
        assert!(json["handshake"].get("target_signature").is_none());
    }
}
