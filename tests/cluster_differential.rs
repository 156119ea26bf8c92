//! Differential correctness tests for the kd-tree backed DBSCAN.
//!
//! Compares `dbscan` against a brute-force reference that follows the same
//! rules (core = at least `min_points` other points within `eps`, clusters
//! seeded in index order, border points claimed by the first cluster to reach
//! them), so the labels must match exactly.

use pointprep_core::PointCloud;
use pointprep_segmentation::{dbscan, dbscan_filter, DbscanParams, NOISE};
use rand::prelude::*;
use std::collections::VecDeque;

// ────────────────── Brute-force reference ──────────────────

fn brute_force_dbscan(cloud: &PointCloud, eps: f64, min_points: usize) -> Vec<i32> {
    let n = cloud.len();
    let eps2 = eps * eps;

    let finite: Vec<bool> = (0..n).map(|i| cloud.is_finite_at(i)).collect();
    let neighbors: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            if !finite[i] {
                return Vec::new();
            }
            (0..n)
                .filter(|&j| {
                    if !finite[j] {
                        return false;
                    }
                    let dx = cloud.x[i] - cloud.x[j];
                    let dy = cloud.y[i] - cloud.y[j];
                    let dz = cloud.z[i] - cloud.z[j];
                    dx * dx + dy * dy + dz * dz <= eps2
                })
                .collect()
        })
        .collect();

    let core: Vec<bool> = (0..n)
        .map(|i| finite[i] && neighbors[i].len() - 1 >= min_points)
        .collect();

    let mut labels = vec![NOISE; n];
    let mut next = 0;
    for seed in 0..n {
        if !core[seed] || labels[seed] != NOISE {
            continue;
        }
        labels[seed] = next;
        let mut queue = VecDeque::from([seed]);
        while let Some(p) = queue.pop_front() {
            if !core[p] {
                continue;
            }
            for &q in &neighbors[p] {
                if labels[q] == NOISE {
                    labels[q] = next;
                    queue.push_back(q);
                }
            }
        }
        next += 1;
    }
    labels
}

fn random_cloud(rng: &mut StdRng, n: usize, half: f64) -> PointCloud {
    let x: Vec<f64> = (0..n).map(|_| rng.gen_range(-half..half)).collect();
    let y: Vec<f64> = (0..n).map(|_| rng.gen_range(-half..half)).collect();
    let z: Vec<f64> = (0..n).map(|_| rng.gen_range(-half..half)).collect();
    PointCloud::from_xyz(x, y, z)
}

/// Cluster memberships as sorted index sets, ignoring label numbering.
fn memberships(labels: &[i32]) -> Vec<Vec<usize>> {
    let mut groups: std::collections::BTreeMap<i32, Vec<usize>> = Default::default();
    for (i, &l) in labels.iter().enumerate() {
        if l != NOISE {
            groups.entry(l).or_default().push(i);
        }
    }
    let mut out: Vec<Vec<usize>> = groups.into_values().collect();
    out.sort();
    out
}

// ────────────────── 1. Differential correctness ──────────────────

#[test]
fn differential_random_small_clouds() {
    let mut rng = StdRng::seed_from_u64(42);

    for trial in 0..200 {
        let n = rng.gen_range(2..80);
        let eps = rng.gen_range(0.5..5.0);
        let min_points = rng.gen_range(1..6);
        let cloud = random_cloud(&mut rng, n, 20.0);

        let got = dbscan(&cloud, eps, min_points).unwrap();
        let expected = brute_force_dbscan(&cloud, eps, min_points);

        assert_eq!(
            got.labels, expected,
            "trial {}: n={}, eps={:.2}, min_points={} - labels differ",
            trial, n, eps, min_points
        );
    }
}

#[test]
fn differential_medium_clouds() {
    let mut rng = StdRng::seed_from_u64(99);

    for trial in 0..10 {
        let n = rng.gen_range(500..1500);
        let eps = rng.gen_range(2.0..8.0);
        let min_points = rng.gen_range(2..10);
        let cloud = random_cloud(&mut rng, n, 50.0);

        let got = dbscan(&cloud, eps, min_points).unwrap();
        let expected = brute_force_dbscan(&cloud, eps, min_points);

        assert_eq!(
            got.labels, expected,
            "trial {}: n={}, eps={:.2}, min_points={}",
            trial, n, eps, min_points
        );
    }
}

#[test]
fn differential_with_non_finite_points() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut cloud = random_cloud(&mut rng, 300, 10.0);
    for i in (0..300).step_by(17) {
        cloud.x[i] = f64::NAN;
    }
    cloud.z[5] = f64::INFINITY;

    let got = dbscan(&cloud, 3.0, 3).unwrap();
    assert_eq!(got.labels, brute_force_dbscan(&cloud, 3.0, 3));
    assert_eq!(got.labels[5], NOISE);
    assert_eq!(got.labels[17], NOISE);
}

// ────────────────── 2. Boundary behaviour ──────────────────

#[test]
fn points_exactly_at_eps() {
    // Unit spacing with eps = 1: every neighbour pair sits on the boundary.
    let cloud = PointCloud::from_points(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [3.0, 0.0, 0.0],
    ]);
    let got = dbscan(&cloud, 1.0, 2).unwrap();
    // Interior points have two others at distance 1; the ends are border.
    assert_eq!(got.labels, vec![0, 0, 0, 0]);
}

#[test]
fn points_just_beyond_eps() {
    let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0], [1.0 + 1e-9, 0.0, 0.0]]);
    let got = dbscan(&cloud, 1.0, 1).unwrap();
    assert_eq!(got.labels, vec![NOISE, NOISE]);
}

#[test]
fn very_large_coordinates() {
    let offset = 1.0e6;
    let cloud = PointCloud::from_points(&[
        [offset, offset, offset],
        [offset + 0.5, offset, offset],
        [offset + 1.0, offset, offset],
        [offset + 100.0, offset, offset],
    ]);
    let got = dbscan(&cloud, 0.6, 1).unwrap();
    assert_eq!(got.labels, vec![0, 0, 0, NOISE]);
}

// ────────────────── 3. Invariance ──────────────────

#[test]
fn shuffled_cloud_same_membership_of_cores() {
    // With min_points = 1 every non-isolated point is core, so there are no
    // border ties and membership must not depend on input order.
    let mut rng = StdRng::seed_from_u64(123);
    let n = 400;
    let cloud = random_cloud(&mut rng, n, 15.0);

    let base = dbscan(&cloud, 1.5, 1).unwrap();

    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(&mut rng);
    let shuffled = cloud.select(&perm);
    let got = dbscan(&shuffled, 1.5, 1).unwrap();

    // Map labels back to original indices.
    let mut back = vec![NOISE; n];
    for (new_idx, &orig) in perm.iter().enumerate() {
        back[orig] = got.labels[new_idx];
    }
    assert_eq!(memberships(&back), memberships(&base.labels));
}

#[test]
fn translated_cloud_same_labels() {
    let mut rng = StdRng::seed_from_u64(77);
    let cloud = random_cloud(&mut rng, 500, 10.0);
    let moved = PointCloud::from_xyz(
        cloud.x.iter().map(|v| v + 256.0).collect(),
        cloud.y.iter().map(|v| v - 512.0).collect(),
        cloud.z.iter().map(|v| v + 1024.0).collect(),
    );
    let a = dbscan(&cloud, 1.2, 3).unwrap();
    let b = dbscan(&moved, 1.2, 3).unwrap();
    assert_eq!(memberships(&a.labels), memberships(&b.labels));
}

#[test]
fn duplicate_points_cluster_together() {
    let mut pts = vec![[1.0, 2.0, 3.0]; 5];
    pts.push([50.0, 0.0, 0.0]);
    let cloud = PointCloud::from_points(&pts);
    let got = dbscan(&cloud, 0.1, 4).unwrap();
    assert_eq!(got.labels, vec![0, 0, 0, 0, 0, NOISE]);
}

#[test]
fn determinism_repeated_runs() {
    let mut rng = StdRng::seed_from_u64(2024);
    let cloud = random_cloud(&mut rng, 2000, 20.0);
    let first = dbscan(&cloud, 1.5, 4).unwrap();
    for _ in 0..20 {
        assert_eq!(dbscan(&cloud, 1.5, 4).unwrap(), first);
    }
}

// ────────────────── 4. Retention against the reference ──────────────────

#[test]
fn retention_matches_reference_labels() {
    let mut rng = StdRng::seed_from_u64(31);
    for trial in 0..30 {
        let n = rng.gen_range(50..400);
        let cloud = random_cloud(&mut rng, n, 8.0);
        let params = DbscanParams {
            eps: rng.gen_range(0.8..2.5),
            min_points: rng.gen_range(1..5),
            limit: rng.gen_range(0..40),
        };

        let labels = brute_force_dbscan(&cloud, params.eps, params.min_points);
        let num_clusters = labels.iter().copied().max().map_or(0, |m| (m + 1) as usize);
        let mut sizes = vec![0usize; num_clusters];
        for &l in &labels {
            if l != NOISE {
                sizes[l as usize] += 1;
            }
        }

        let retained: usize = sizes.iter().filter(|&&s| s > params.limit).sum();
        let expected_len = if num_clusters == 0 {
            0
        } else if retained < params.limit {
            sizes.iter().copied().max().unwrap_or(0)
        } else {
            retained
        };

        let sel = dbscan_filter(&cloud, &params).unwrap();
        assert_eq!(sel.cloud.len(), expected_len, "trial {} {:?}", trial, params);
    }
}
