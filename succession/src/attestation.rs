//! # Attestations
//!
//! Verifiable credentials consumed — not issued — by the succession core.
//!
//! The real asset in this system is the attestation, not the document. A
//! bank officer verifies a passport and signs a credential; a registrar
//! confirms a death and signs a credential. During succession (Layer 3),
//! the state machine treats each attestation as a boolean "valid verifier
//! attestation" input: is it unrevoked, is it unexpired, and does its
//! issuer hold an acknowledged Verifier edge on the subject account?
//!
//! Issuance ceremonies, revocation registries, and credential exchange
//! all belong to external collaborators. What lives here is the record
//! shape and the [`Attestation::is_valid`] predicate the engine gates on.

use chrono::{DateTime, Utc};
use heirloom_protocol::identity::Did;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::account::AccountId;

/// Opaque attestation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestationId(Uuid);

impl AttestationId {
    /// Mint a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttestationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttestationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of credential types attestors can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    /// An institution verified the subject's identity documents.
    IdentityVerification,
    /// A specific vault document was examined and attested.
    DocumentAttestation,
    /// A notary witnessed a signing.
    NotaryWitness,
    /// An insurer attests to valid coverage.
    InsuranceProof,
    /// A beneficiary formally acknowledged their relationship.
    BeneficiaryAcknowledgment,
    /// A registrar or physician verified a death.
    DeathVerification,
    /// A verifier approves an in-progress succession. The credential type
    /// Layer 3 cares about.
    SuccessionApproval,
}

/// Revocation lifecycle of a credential. Issuers can withdraw what they
/// asserted; the quorum gate only ever counts `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationStatus {
    /// In force.
    Active,
    /// Withdrawn by the issuer.
    Revoked,
    /// Past its expiry (recorded by an external sweep; [`Attestation::is_valid`]
    /// checks the timestamp regardless).
    Expired,
    /// Administratively on hold.
    Suspended,
}

/// The cryptographic proof block of a credential.
///
/// Ed25519 signature material in the W3C data-integrity shape; the
/// signature bytes are base64 in `proof_value`. Proof *verification*
/// happens in the attestation service that accepts credentials from
/// issuers — by the time one reaches this crate it has been
/// authenticated, and the engine checks validity and issuer authority,
/// not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Proof suite identifier.
    pub proof_type: String,
    /// When the proof was created.
    pub created: DateTime<Utc>,
    /// The issuer's verification-method URL (`did:key:z...#z...`).
    pub verification_method: String,
    /// Base64-encoded Ed25519 signature.
    pub proof_value: String,
}

/// A verifiable credential about a subject account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attestation {
    /// Attestation identifier.
    pub attestation_id: AttestationId,
    /// DID of the attestor (bank, lawyer, notary, insurer).
    pub issuer_did: Did,
    /// The account this credential is about.
    pub subject: AccountId,
    /// What kind of assertion this is.
    pub credential_type: CredentialType,
    /// The claims being asserted. Shape varies by credential type.
    pub claims: serde_json::Value,
    /// Cryptographic proof from the issuer.
    pub proof: Proof,
    /// Current revocation state.
    pub revocation_status: RevocationStatus,
    /// Why it was revoked, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
    /// Optional expiry. Credentials without one live until revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Attestation {
    /// Create a new attestation in `Active` status.
    pub fn new(
        issuer_did: Did,
        subject: AccountId,
        credential_type: CredentialType,
        claims: serde_json::Value,
        proof: Proof,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            attestation_id: AttestationId::new(),
            issuer_did,
            subject,
            credential_type,
            claims,
            proof,
            revocation_status: RevocationStatus::Active,
            revocation_reason: None,
            issued_at,
            expires_at,
        }
    }

    /// The boolean the quorum gate consumes: unrevoked, and either
    /// unexpiring or not yet expired.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.revocation_status == RevocationStatus::Active
            && self.expires_at.map_or(true, |expiry| now < expiry)
    }

    /// Issuer-side withdrawal. Terminal for quorum purposes.
    pub fn revoke(&mut self, reason: impl Into<String>) {
        self.revocation_status = RevocationStatus::Revoked;
        self.revocation_reason = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heirloom_protocol::crypto::keys::HeirloomKeypair;

    fn now() -> DateTime<Utc> {
        "2026-05-01T00:00:00Z".parse().unwrap()
    }

    fn sample(expires_at: Option<DateTime<Utc>>) -> Attestation {
        let issuer_kp = HeirloomKeypair::generate();
        let issuer_did = Did::from_public_key(&issuer_kp.public_key());
        let proof = Proof {
            proof_type: "Ed25519Signature2018".into(),
            created: now(),
            verification_method: issuer_did.verification_method(),
            proof_value: issuer_kp.sign(b"credential body").to_base64(),
        };
        Attestation::new(
            issuer_did,
            AccountId::new(),
            CredentialType::SuccessionApproval,
            serde_json::json!({ "death_certificate_ref": "reg/2026/0142" }),
            proof,
            now(),
            expires_at,
        )
    }

    #[test]
    fn fresh_attestation_is_valid() {
        assert!(sample(None).is_valid(now()));
    }

    #[test]
    fn revoked_attestation_is_invalid() {
        let mut att = sample(None);
        att.revoke("issuer error");
        assert!(!att.is_valid(now()));
        assert_eq!(att.revocation_status, RevocationStatus::Revoked);
        assert_eq!(att.revocation_reason.as_deref(), Some("issuer error"));
    }

    #[test]
    fn expiry_is_honored() {
        let expiry = now() + chrono::Duration::days(30);
        let att = sample(Some(expiry));
        assert!(att.is_valid(now()));
        assert!(att.is_valid(expiry - chrono::Duration::seconds(1)));
        // now == expires_at is already expired: validity requires now < expiry.
        assert!(!att.is_valid(expiry));
        assert!(!att.is_valid(expiry + chrono::Duration::days(1)));
    }

    #[test]
    fn no_expiry_means_valid_until_revoked() {
        let att = sample(None);
        assert!(att.is_valid(now() + chrono::Duration::days(10_000)));
    }

    #[test]
    fn suspended_is_not_valid() {
        let mut att = sample(None);
        att.revocation_status = RevocationStatus::Suspended;
        assert!(!att.is_valid(now()));
    }

    #[test]
    fn serde_shape() {
        let att = sample(None);
        let json = serde_json::to_value(&att).unwrap();
        assert_eq!(json["credential_type"], "succession_approval");
        assert_eq!(json["revocation_status"], "active");
        assert!(json["issuer_did"].as_str().unwrap().starts_with("did:key:z"));
        assert!(json.get("expires_at").is_none());
    }
}
