//! Benchmarks for hashing and public input derivation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use shield_core::crypto::{next_root, poseidon_hash, to_canonical, FieldElement};
use shield_core::proof::{derive_shield, ShieldPayload};

fn bench_poseidon_arity5(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let inputs: Vec<FieldElement> = (0..5).map(|_| FieldElement::from_u64(rng.gen())).collect();

    c.bench_function("poseidon_arity5", |b| {
        b.iter(|| black_box(poseidon_hash(black_box(&inputs)).unwrap()))
    });
}

fn bench_next_root(c: &mut Criterion) {
    let prior = FieldElement::from_u64(42);
    let leaves = [FieldElement::from_u64(1), FieldElement::from_u64(2), FieldElement::from_u64(3)];

    c.bench_function("next_root_three_leaves", |b| {
        b.iter(|| black_box(next_root(black_box(prior), black_box(&leaves)).unwrap()))
    });
}

fn bench_canonicalize(c: &mut Criterion) {
    let decimal = "7853200120776062878684798364095072458815029376092732009249414926327459813530";

    c.bench_function("canonicalize_decimal", |b| {
        b.iter(|| black_box(to_canonical(black_box(decimal)).unwrap()))
    });
}

fn bench_derive_shield(c: &mut Criterion) {
    let payload = ShieldPayload {
        mint: None,
        old_root: FieldElement::from_u64(7),
        amount: 1000,
        recipient: FieldElement::from_u64(0xabc),
        deposit_id: FieldElement::from_u64(1),
        pool_id: FieldElement::from_u64(9),
        blinding: FieldElement::from_u64(2),
        mint_id: FieldElement::from_u64(5),
    };

    c.bench_function("derive_shield", |b| {
        b.iter(|| black_box(derive_shield(black_box(&payload)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_poseidon_arity5,
    bench_next_root,
    bench_canonicalize,
    bench_derive_shield
);
criterion_main!(benches);
