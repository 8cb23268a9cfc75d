//! Benchmarks for plotting and deadline search at the widest lane width
//! compiled into this build.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use poc_core::{NONCE_SIZE, ShabalLanes, Widest, generate_nonces, search_deadlines, shabal256};

fn bench_noncegen(c: &mut Criterion) {
    let lanes = Widest::LANES;
    let mut cache = vec![0u8; lanes * NONCE_SIZE];
    c.bench_function("noncegen_batch", |b| {
        let mut nonce = 0u64;
        b.iter(|| {
            unsafe {
                generate_nonces::<Widest>(
                    cache.as_mut_ptr(),
                    black_box(7_900_104_405_094_198_526),
                    nonce,
                    lanes as u64,
                );
            }
            nonce += lanes as u64;
        })
    });
}

fn bench_deadline_search(c: &mut Criterion) {
    let lanes = Widest::LANES;
    let count = (lanes * 16) as u64;
    let mut cache = vec![0u8; count as usize * NONCE_SIZE];
    unsafe { generate_nonces::<Widest>(cache.as_mut_ptr(), 42, 0, count) };
    let gensig = [0u8; 32];
    c.bench_function("deadline_search", |b| {
        b.iter(|| {
            let mut best = 0u64;
            let mut offset = 0u64;
            unsafe {
                search_deadlines::<Widest>(
                    cache.as_ptr(),
                    black_box(1337),
                    count,
                    &gensig,
                    &mut best,
                    &mut offset,
                );
            }
            (best, offset)
        })
    });
}

fn bench_shabal_block(c: &mut Criterion) {
    let data = [0x5au8; 64];
    c.bench_function("shabal256_block", |b| b.iter(|| shabal256(black_box(&data))));
}

criterion_group!(
    benches,
    bench_noncegen,
    bench_deadline_search,
    bench_shabal_block
);
criterion_main!(benches);
