//! # DID Registry Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | Codec | document encode / decode at growing key counts |
//! | Recovery | signer recovery from a signed digest |
//! | Registry | register + add key through the full commit path |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use did_registry::prelude::*;
use k256::ecdsa::SigningKey;
use std::time::Duration;

fn random_key() -> (SigningKey, PublicKey) {
    let signing = SigningKey::random(&mut rand::thread_rng());
    let key = PublicKey::from_verifying_key(signing.verifying_key());
    (signing, key)
}

/// A document with `keys` auth keys, a few contexts and a service.
fn document_with_keys(keys: usize) -> Document {
    let (_, owner) = random_key();
    let did = Did::parse("did:example:bench").expect("valid did");
    let (mut doc, _) = Document::register(did, owner.into(), "https://www.w3.org/ns/did/v1");
    for _ in 0..keys {
        let (_, key) = random_key();
        doc.apply(&Operation::AddNewAuthKey {
            key: key.into(),
            controllers: vec![],
        })
        .expect("fresh key");
    }
    doc.apply(&Operation::AddContext {
        contexts: vec!["c1".into(), "c2".into()],
    })
    .expect("contexts");
    doc.apply(&Operation::AddService {
        service: ServiceEntry::new("hub", "IdentityHub", "https://hub.example.org"),
    })
    .expect("service");
    doc
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for keys in [1usize, 10, 100] {
        let doc = document_with_keys(keys);
        let bytes = doc.to_bytes();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode_document", keys), &doc, |b, doc| {
            b.iter(|| black_box(doc.to_bytes()))
        });
        group.bench_with_input(BenchmarkId::new("decode_document", keys), &bytes, |b, bytes| {
            b.iter(|| black_box(Document::from_bytes(bytes).expect("decodes")))
        });
    }
    group.finish();
}

fn bench_recovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("recovery");
    group.measurement_time(Duration::from_secs(5));

    let (signing, key) = random_key();
    let digest = keccak256(b"benchmark payload");
    let signature = sign_digest(&signing, &digest).expect("signs");
    assert_eq!(
        did_registry::domain::ecdsa::recover_address(&digest, &signature).expect("recovers"),
        key.address()
    );

    group.bench_function("recover_address", |b| {
        b.iter(|| {
            black_box(did_registry::domain::ecdsa::recover_address(
                black_box(&digest),
                black_box(&signature),
            ))
        })
    });
    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    group.bench_function("register_and_add_key", |b| {
        b.iter_with_setup(
            || {
                let (_, owner) = random_key();
                let (_, extra) = random_key();
                let registry = DidRegistryService::with_defaults(InMemorySlotStore::new());
                (registry, owner, extra)
            },
            |(mut registry, owner, extra)| {
                let ctx = CallContext::new(owner.address());
                registry
                    .register(ctx, "did:example:bench", owner.into())
                    .expect("registers");
                registry
                    .add_key(ctx, "did:example:bench", extra, vec![], AuthRequest::Direct)
                    .expect("adds key");
                black_box(registry)
            },
        )
    });

    group.bench_function("get_document", |b| {
        let (_, owner) = random_key();
        let mut registry = DidRegistryService::with_defaults(InMemorySlotStore::new());
        let ctx = CallContext::new(owner.address());
        registry
            .register(ctx, "did:example:bench", owner.into())
            .expect("registers");
        for _ in 0..10 {
            let (_, key) = random_key();
            registry
                .add_new_auth_key(ctx, "did:example:bench", key, vec![], AuthRequest::Direct)
                .expect("adds key");
        }
        b.iter(|| black_box(registry.get_document("did:example:bench").expect("loads")))
    });
    group.finish();
}

criterion_group!(benches, bench_codec, bench_recovery, bench_registry);
criterion_main!(benches);
