//! # Action Payload Digests
//!
//! The bridge between domain actions and the canonical signing layer in
//! `heirloom-protocol`. Each privileged operation has exactly one digest
//! constructor here, and both sides of every operation use it: the client
//! SDK when producing a signature, the [`SuccessionLedger`] when checking
//! one. There is no other way to build a signable message, which is the
//! point — a digest that can only be built one way cannot be built
//! ambiguously.
//!
//! Timestamps enter the digest in RFC 3339 with fixed microsecond
//! precision, so the signer's clock reading and the verifier's parse of
//! it can never disagree about trailing zeros.
//!
//! [`SuccessionLedger`]: crate::engine::SuccessionLedger

use chrono::{DateTime, SecondsFormat, Utc};
use heirloom_protocol::crypto::signing::{CanonicalPayload, SigningContext};
use heirloom_protocol::identity::Did;

use crate::claim::ClaimType;
use crate::graph::{EdgeId, RoleType};

fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Digest an owner signs to propose a role.
pub fn role_proposal(
    owner: &Did,
    target: &Did,
    role_type: RoleType,
    priority: u32,
    at: DateTime<Utc>,
) -> CanonicalPayload {
    CanonicalPayload::new(SigningContext::RolePropose)
        .text(owner.as_str())
        .text(target.as_str())
        .text(role_type.as_str())
        .uint(priority)
        .text(&stamp(at))
}

/// Digest a target signs to acknowledge a pending role.
///
/// Binding the edge id means the acknowledgment cannot be replayed onto a
/// different proposal between the same two accounts.
pub fn role_acknowledgment(edge_id: EdgeId, target: &Did, at: DateTime<Utc>) -> CanonicalPayload {
    CanonicalPayload::new(SigningContext::RoleAcknowledge)
        .text(&edge_id.to_string())
        .text(target.as_str())
        .text(&stamp(at))
}

/// Digest an owner signs to revoke a role.
pub fn role_revocation(edge_id: EdgeId, owner: &Did, at: DateTime<Utc>) -> CanonicalPayload {
    CanonicalPayload::new(SigningContext::RoleRevoke)
        .text(&edge_id.to_string())
        .text(owner.as_str())
        .text(&stamp(at))
}

/// Digest a beneficiary signs to submit a succession claim.
pub fn claim_submission(
    subject: &Did,
    claimant: &Did,
    claim_type: ClaimType,
    certified_docs_ref: &str,
    docs_hash: &str,
    at: DateTime<Utc>,
) -> CanonicalPayload {
    CanonicalPayload::new(SigningContext::ClaimSubmit)
        .text(subject.as_str())
        .text(claimant.as_str())
        .text(claim_type.as_str())
        .text(certified_docs_ref)
        .text(docs_hash)
        .text(&stamp(at))
}

/// Digest the owner or a guardian signs to halt a succession.
pub fn succession_halt(
    subject: &Did,
    halter: &Did,
    reason: &str,
    at: DateTime<Utc>,
) -> CanonicalPayload {
    CanonicalPayload::new(SigningContext::SuccessionHalt)
        .text(subject.as_str())
        .text(halter.as_str())
        .text(reason)
        .text(&stamp(at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use heirloom_protocol::crypto::keys::HeirloomKeypair;
    use heirloom_protocol::crypto::signing::{sign_payload, verify_payload};

    fn did() -> Did {
        Did::from_public_key(&HeirloomKeypair::generate().public_key())
    }

    fn now() -> DateTime<Utc> {
        "2026-02-02T08:30:00Z".parse().unwrap()
    }

    #[test]
    fn proposal_digest_is_deterministic() {
        let owner = did();
        let target = did();
        let a = role_proposal(&owner, &target, RoleType::Beneficiary, 0, now());
        let b = role_proposal(&owner, &target, RoleType::Beneficiary, 0, now());
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn role_type_is_bound_into_proposal() {
        let owner = did();
        let target = did();
        let beneficiary = role_proposal(&owner, &target, RoleType::Beneficiary, 0, now());
        let guardian = role_proposal(&owner, &target, RoleType::Guardian, 0, now());
        assert_ne!(beneficiary.digest(), guardian.digest());
    }

    #[test]
    fn acknowledgment_is_bound_to_edge() {
        let target = did();
        let a = role_acknowledgment(EdgeId::new(), &target, now());
        let b = role_acknowledgment(EdgeId::new(), &target, now());
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn proposal_signature_is_not_a_claim_signature() {
        // The replay scenario that motivates this module: a signature
        // harvested from a routine role proposal must be useless for
        // kicking off a succession.
        let kp = HeirloomKeypair::generate();
        let owner = Did::from_public_key(&kp.public_key());
        let other = did();

        let proposal = role_proposal(&owner, &other, RoleType::Beneficiary, 0, now());
        let claim = claim_submission(&other, &owner, ClaimType::Death, "ref", "hash", now());

        let sig = sign_payload(&kp, &proposal);
        assert!(verify_payload(&kp.public_key(), &proposal, &sig));
        assert!(!verify_payload(&kp.public_key(), &claim, &sig));
    }

    #[test]
    fn timestamp_changes_digest() {
        let subject = did();
        let halter = did();
        let a = succession_halt(&subject, &halter, "fraud", now());
        let b = succession_halt(&subject, &halter, "fraud", now() + chrono::Duration::seconds(1));
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn halt_reason_is_covered_by_signature() {
        let subject = did();
        let halter = did();
        let a = succession_halt(&subject, &halter, "fraud suspected", now());
        let b = succession_halt(&subject, &halter, "changed my mind", now());
        assert_ne!(a.digest(), b.digest());
    }
}
