use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use xxhash_rust::xxh3::xxh3_64;

fn hashing_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("asset_content_hash");

    for size in [1_024usize, 64 * 1024, 1024 * 1024, 8 * 1024 * 1024] {
        let payload = vec![0x5au8; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| xxh3_64(payload));
        });
    }

    group.finish();
}

criterion_group!(benches, hashing_bench);
criterion_main!(benches);
