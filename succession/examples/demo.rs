//! Terminal walkthrough of the full HEIRLOOM succession lifecycle.
//!
//! Registers a citizen and her recovery circle, builds the graph through
//! real two-sided handshakes, then simulates the clock through all four
//! trigger layers: inactivity watch, a beneficiary claim, verifier
//! quorum with staged release, and a guardian halt inside the
//! cooling-off window.
//!
//! Run with:
//!   cargo run --example demo

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use heirloom_protocol::crypto::content_hash;
use heirloom_protocol::crypto::keys::HeirloomKeypair;
use heirloom_protocol::crypto::signing::sign_payload;

use heirloom_succession::payload;
use heirloom_succession::{
    AccessPhase, Account, Attestation, ClaimType, CredentialType, Proof, RoleType,
    SuccessionClaim, SuccessionLedger, SuccessionPermissions,
};

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

struct Citizen {
    name: &'static str,
    keypair: HeirloomKeypair,
    account: Account,
}

fn register(ledger: &mut SuccessionLedger, name: &'static str, now: DateTime<Utc>) -> Citizen {
    let keypair = HeirloomKeypair::generate();
    let account = ledger
        .create_identity(&keypair.public_key_bytes(), now)
        .expect("registration");
    println!(
        "  {GREEN}+{RESET} {BOLD}{name}{RESET} registered {DIM}{}{RESET}",
        account.did
    );
    Citizen {
        name,
        keypair,
        account,
    }
}

fn establish(
    ledger: &mut SuccessionLedger,
    owner: &Citizen,
    target: &Citizen,
    role_type: RoleType,
    permissions: SuccessionPermissions,
    now: DateTime<Utc>,
) {
    let proposal =
        payload::role_proposal(&owner.account.did, &target.account.did, role_type, 0, now);
    let owner_sig = sign_payload(&owner.keypair, &proposal);
    let edge = ledger
        .propose_role(
            owner.account.id,
            target.account.id,
            role_type,
            0,
            permissions,
            None,
            None,
            &owner_sig,
            now,
        )
        .expect("proposal");

    let acknowledgment = payload::role_acknowledgment(edge.edge_id, &target.account.did, now);
    let target_sig = sign_payload(&target.keypair, &acknowledgment);
    ledger
        .acknowledge_role(edge.edge_id, &target_sig, now)
        .expect("acknowledgment");
    println!(
        "  {GREEN}+{RESET} {} acknowledged as {CYAN}{role_type}{RESET} — handshake complete",
        target.name
    );
}

fn attest(verifier: &Citizen, subject: &Citizen, now: DateTime<Utc>) -> Attestation {
    Attestation::new(
        verifier.account.did.clone(),
        subject.account.id,
        CredentialType::SuccessionApproval,
        serde_json::json!({ "claim_reviewed": true }),
        Proof {
            proof_type: "Ed25519Signature2018".into(),
            created: now,
            verification_method: verifier.account.did.verification_method(),
            proof_value: verifier.keypair.sign(b"succession approval").to_base64(),
        },
        now,
        None,
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let t0: DateTime<Utc> = "2026-01-01T00:00:00Z".parse()?;
    let mut ledger = SuccessionLedger::new();

    println!("\n{BOLD}== Registration =={RESET}");
    let alice = register(&mut ledger, "Alice", t0);
    let bob = register(&mut ledger, "Bob", t0);
    let notary = register(&mut ledger, "Notary", t0);
    let insurer = register(&mut ledger, "Insurer", t0);
    let grace = register(&mut ledger, "Grace", t0);

    println!("\n{BOLD}== Building the recovery graph =={RESET}");
    establish(
        &mut ledger,
        &alice,
        &bob,
        RoleType::Beneficiary,
        SuccessionPermissions {
            vault_access: vec!["passport".into(), "will".into()],
            read_only: true,
            phase: AccessPhase::A,
        },
        t0,
    );
    establish(&mut ledger, &alice, &notary, RoleType::Verifier, Default::default(), t0);
    establish(&mut ledger, &alice, &insurer, RoleType::Verifier, Default::default(), t0);
    establish(&mut ledger, &alice, &grace, RoleType::Guardian, Default::default(), t0);
    println!(
        "  {DIM}verifier quorum available: {}{RESET}",
        ledger.quorum_met(alice.account.id)?
    );

    println!("\n{BOLD}== Layer 1: inactivity =={RESET}");
    let day_91 = t0 + Duration::days(91);
    let status = ledger.sweep_inactivity(alice.account.id, day_91)?;
    println!("  {YELLOW}!{RESET} day 91, no heartbeat from Alice — status: {YELLOW}{status}{RESET}");

    println!("\n{BOLD}== Layer 2: the claim =={RESET}");
    let docs_ref = "vault://certified/death-cert-0142";
    let docs_hash = content_hash(b"sealed death certificate blob");
    let submission = payload::claim_submission(
        &alice.account.did,
        &bob.account.did,
        ClaimType::Death,
        docs_ref,
        &docs_hash,
        day_91,
    );
    let signature = sign_payload(&bob.keypair, &submission);
    ledger.submit_claim(SuccessionClaim::new(
        bob.account.id,
        alice.account.id,
        ClaimType::Death,
        docs_ref,
        docs_hash.as_str(),
        &signature,
        day_91,
    ))?;
    println!(
        "  {YELLOW}!{RESET} Bob submits a signed death claim — status: {YELLOW}{}{RESET}",
        ledger.account(alice.account.id)?.status
    );

    println!("\n{BOLD}== Layer 3: verifier quorum =={RESET}");
    let day_95 = day_91 + Duration::days(4);
    let attestations = [attest(&notary, &alice, day_95), attest(&insurer, &alice, day_95)];
    let grant = ledger.try_release(alice.account.id, &attestations, day_95)?;
    println!(
        "  {GREEN}+{RESET} 2 verifiers attested — phase {:?} released to Bob (read-only: {}, vault: {:?})",
        grant.phase, grant.read_only, grant.vault_access
    );

    println!("\n{BOLD}== Layer 4: the panic freeze =={RESET}");
    let day_120 = day_91 + Duration::days(29);
    let reason = "Alice is alive and on a sailboat";
    let halt_payload =
        payload::succession_halt(&alice.account.did, &grace.account.did, reason, day_120);
    let halt_sig = sign_payload(&grace.keypair, &halt_payload);
    ledger.halt(alice.account.id, grace.account.id, reason, &halt_sig, day_120)?;
    println!(
        "  {RED}x{RESET} Grace halts the succession (\"{reason}\") — status: {RED}{}{RESET}",
        ledger.account(alice.account.id)?.status
    );

    let attempts = ledger.attempts(alice.account.id)?;
    println!(
        "\n{DIM}attempt ledger: {} attempt(s); latest halted by {} ({}){RESET}\n",
        attempts.len(),
        grace.name,
        attempts[0].halted.as_ref().map(|h| h.halter_role.to_string()).unwrap_or_default(),
    );
    Ok(())
}
