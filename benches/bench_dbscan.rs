use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pointprep_core::PointCloud;
use pointprep_segmentation::{dbscan, dbscan_filter, DbscanParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Dense blobs on a sparse background, roughly what a plant plot looks like
/// after excess-green filtering.
fn blobs_with_noise(n: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let blobs = 8;
    let per_blob = n * 9 / 10 / blobs;
    let mut pts = Vec::with_capacity(n);
    for b in 0..blobs {
        let cx = (b % 4) as f64 * 10.0;
        let cy = (b / 4) as f64 * 10.0;
        for _ in 0..per_blob {
            pts.push([
                cx + rng.gen_range(-1.5..1.5),
                cy + rng.gen_range(-1.5..1.5),
                rng.gen_range(0.0..2.0),
            ]);
        }
    }
    while pts.len() < n {
        pts.push([
            rng.gen_range(-5.0..45.0),
            rng.gen_range(-5.0..25.0),
            rng.gen_range(0.0..10.0),
        ]);
    }
    PointCloud::from_points(&pts)
}

fn bench_dbscan(c: &mut Criterion) {
    let mut group = c.benchmark_group("dbscan_eps0.3_min20");
    group.sample_size(10);
    for size in [10_000, 100_000] {
        let cloud = blobs_with_noise(size, 42);
        group.bench_with_input(
            BenchmarkId::new("pointprep", size),
            &cloud,
            |b, cloud| b.iter(|| dbscan(cloud, 0.3, 20)),
        );
    }
    group.finish();
}

fn bench_dbscan_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dbscan_filter_limit1000");
    group.sample_size(10);
    let params = DbscanParams {
        eps: 0.3,
        min_points: 20,
        limit: 1000,
    };
    for size in [10_000, 100_000] {
        let cloud = blobs_with_noise(size, 42);
        group.bench_with_input(
            BenchmarkId::new("pointprep", size),
            &cloud,
            |b, cloud| b.iter(|| dbscan_filter(cloud, &params)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_dbscan, bench_dbscan_filter);
criterion_main!(benches);
