// Benchmarks for the HEIRLOOM cryptographic identity layer.
//
// Covers keypair generation, canonical-payload signing and verification,
// DID encode/decode, envelope encryption at several document sizes, and
// Argon2id derivation (with reduced cost parameters — the production
// parameters are intentionally too slow to benchmark in a tight loop).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use heirloom_protocol::crypto::kdf::{derive_key, KdfParams};
use heirloom_protocol::crypto::keys::HeirloomKeypair;
use heirloom_protocol::crypto::signing::{sign_payload, verify_payload, CanonicalPayload, SigningContext};
use heirloom_protocol::crypto::vault::{decrypt_from_vault, encrypt_for_vault, generate_document_key};
use heirloom_protocol::identity::{decode_did, encode_did};

fn bench_keypair_generation(c: &mut Criterion) {
    c.bench_function("ed25519/keypair_generate", |b| {
        b.iter(HeirloomKeypair::generate);
    });
}

fn bench_sign_payload(c: &mut Criterion) {
    let keypair = HeirloomKeypair::generate();
    let payload = CanonicalPayload::new(SigningContext::RolePropose)
        .text("did:key:z6MkOwner")
        .text("did:key:z6MkTarget")
        .text("beneficiary")
        .uint(0);

    c.bench_function("ed25519/sign_payload", |b| {
        b.iter(|| sign_payload(&keypair, &payload));
    });
}

fn bench_verify_payload(c: &mut Criterion) {
    let keypair = HeirloomKeypair::generate();
    let payload = CanonicalPayload::new(SigningContext::ClaimSubmit)
        .text("did:key:z6MkSubject")
        .text("did:key:z6MkClaimant")
        .text("death");
    let signature = sign_payload(&keypair, &payload);
    let public_key = keypair.public_key();

    c.bench_function("ed25519/verify_payload", |b| {
        b.iter(|| verify_payload(&public_key, &payload, &signature));
    });
}

fn bench_did_codec(c: &mut Criterion) {
    let key = HeirloomKeypair::generate().public_key_bytes();
    let did = encode_did(&key).unwrap();

    c.bench_function("did/encode", |b| {
        b.iter(|| encode_did(&key).unwrap());
    });
    c.bench_function("did/decode", |b| {
        b.iter(|| decode_did(did.as_str()).unwrap());
    });
}

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/envelope_roundtrip");
    let key = generate_document_key();

    for size in [1_024usize, 16 * 1_024, 256 * 1_024] {
        let plaintext = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &plaintext, |b, pt| {
            b.iter(|| {
                let (blob, meta) = encrypt_for_vault(pt, &key).unwrap();
                decrypt_from_vault(&blob, &meta, &key).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_kdf(c: &mut Criterion) {
    let params = KdfParams::insecure_fast();
    let salt = [0x42u8; 16];

    c.bench_function("kdf/argon2id_fast_params", |b| {
        b.iter(|| derive_key(b"benchmark passphrase", &salt, &params).unwrap());
    });
}

criterion_group!(
    benches,
    bench_keypair_generation,
    bench_sign_payload,
    bench_verify_payload,
    bench_did_codec,
    bench_envelope,
    bench_kdf,
);
criterion_main!(benches);
