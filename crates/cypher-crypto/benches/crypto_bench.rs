//! Benchmarks for Cypher cryptographic operations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cypher_crypto::{
    aes::{Aes128, AesKey, RoundKeySchedule},
    prime::generate_probable_prime,
    rsa::{decrypt_byte, encrypt_byte, RsaKeyPair},
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_key_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Key Generation");
    group.sample_size(20);

    for bits in [64u64, 256, 512] {
        group.bench_with_input(BenchmarkId::new("probable_prime", bits), &bits, |b, &bits| {
            let mut rng = StdRng::seed_from_u64(bits);
            b.iter(|| black_box(generate_probable_prime(bits, 40, &mut rng).unwrap()))
        });
    }

    group.bench_function("rsa_keypair_256", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| black_box(RsaKeyPair::generate_with(256, 40, &mut rng).unwrap()))
    });

    group.bench_function("aes_key_legacy", |b| b.iter(|| black_box(AesKey::generate().unwrap())));

    group.bench_function("aes_key_schedule", |b| {
        let key = AesKey::from_u128(0x2b7e151628aed2a6abf7158809cf4f3c);
        b.iter(|| black_box(RoundKeySchedule::expand(&key)))
    });

    group.finish();
}

fn bench_rsa(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSA");
    let mut rng = StdRng::seed_from_u64(11);
    let pair = RsaKeyPair::generate_with(512, 40, &mut rng).unwrap();
    let sealed = encrypt_byte(0x42, &pair.public);

    group.bench_function("encrypt_byte_1024", |b| {
        b.iter(|| black_box(encrypt_byte(0x42, &pair.public)))
    });

    group.bench_function("decrypt_byte_1024", |b| {
        b.iter(|| black_box(decrypt_byte(&sealed, &pair.private)))
    });

    group.finish();
}

fn bench_aes(c: &mut Criterion) {
    let mut group = c.benchmark_group("AES");
    let aes = Aes128::new(&AesKey::from_u128(0x000102030405060708090a0b0c0d0e0f));

    group.bench_function("encrypt_block", |b| {
        b.iter(|| black_box(aes.encrypt_block(black_box(0x00112233445566778899aabbccddeeff))))
    });

    group.bench_function("decrypt_block", |b| {
        b.iter(|| black_box(aes.decrypt_block(black_box(0x69c4e0d86a7b0430d8cdb78070b4c55a))))
    });

    for size in [64usize, 1024, 16384].iter() {
        let data = vec![0x42u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("ecb_encrypt", size), size, |b, _| {
            b.iter(|| black_box(aes.encrypt_ecb(&data).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_key_generation, bench_rsa, bench_aes);

criterion_main!(benches);
