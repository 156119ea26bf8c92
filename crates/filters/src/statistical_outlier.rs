use pointprep_core::error::ensure_positive;
use pointprep_core::{PointCloud, PointCloudError, Result};
use pointprep_spatial::KdTree;
use rayon::prelude::*;

/// Mean distance from each point to its `neighbor_count` nearest neighbours,
/// excluding the point itself. Non-finite points get `f64::INFINITY`.
pub fn mean_neighbor_distances(cloud: &PointCloud, neighbor_count: usize) -> Vec<f64> {
    let tree = KdTree::build(cloud);

    (0..cloud.len())
        .into_par_iter()
        .map(|i| {
            if !cloud.is_finite_at(i) {
                return f64::INFINITY;
            }
            // The query point is its own nearest hit; ask for one extra and
            // drop it.
            let (_, dists) = tree.knn(&cloud.point(i), neighbor_count + 1);
            let neighbor_dists = dists.get(1..).unwrap_or(&[]);
            if neighbor_dists.is_empty() {
                return f64::INFINITY;
            }
            neighbor_dists.iter().sum::<f64>() / neighbor_dists.len() as f64
        })
        .collect()
}

/// Remove points whose mean neighbour distance exceeds `μ + std_ratio·σ`,
/// where `μ` and `σ` are the mean and population standard deviation of the
/// per-point mean distances over the whole cloud.
///
/// Retained points keep their input order.
pub fn statistical_outlier_removal(
    cloud: &PointCloud,
    neighbor_count: usize,
    std_ratio: f64,
) -> Result<PointCloud> {
    if neighbor_count == 0 {
        return Err(PointCloudError::invalid("neighbor_count must be >= 1"));
    }
    ensure_positive("std_ratio", std_ratio)?;
    if neighbor_count >= cloud.len() {
        return Err(PointCloudError::invalid(format!(
            "neighbor_count ({}) must be smaller than the number of points ({})",
            neighbor_count,
            cloud.len()
        )));
    }

    let mean_dists = mean_neighbor_distances(cloud, neighbor_count);

    let finite_dists: Vec<f64> = mean_dists
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .collect();

    if finite_dists.is_empty() {
        log::warn!("no finite points to compute neighbour statistics from");
        return Ok(cloud.empty_like());
    }

    let n = finite_dists.len() as f64;
    let global_mean = finite_dists.iter().sum::<f64>() / n;
    let variance = finite_dists
        .iter()
        .map(|d| (d - global_mean).powi(2))
        .sum::<f64>()
        / n;
    let global_stddev = variance.sqrt();

    let threshold = global_mean + std_ratio * global_stddev;

    let keep: Vec<usize> = (0..cloud.len())
        .filter(|&i| mean_dists[i] <= threshold)
        .collect();

    log::info!(
        "statistical denoising kept {} of {} points (mean {:.6}, std {:.6}, threshold {:.6})",
        keep.len(),
        cloud.len(),
        global_mean,
        global_stddev,
        threshold
    );

    Ok(cloud.select(&keep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn cluster_with_outlier(n: usize) -> PointCloud {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut z = Vec::new();
        for i in 0..n {
            let t = i as f64;
            x.push((t * 0.37).sin() * 0.1);
            y.push((t * 0.73).cos() * 0.1);
            z.push(t * 0.001);
        }
        x.push(100.0);
        y.push(100.0);
        z.push(100.0);
        PointCloud::from_xyz(x, y, z)
    }

    #[test]
    fn sor_removes_the_far_outlier() {
        let n = 20;
        let cloud = cluster_with_outlier(n);
        let result = statistical_outlier_removal(&cloud, n - 1, 0.5).unwrap();

        assert_eq!(result.len(), n);
        for p in result.iter_points() {
            assert!(p[0].abs() <= 0.2, "unexpected x={}", p[0]);
        }
        // Retained points keep their input order.
        assert_eq!(result.x, cloud.x[..n].to_vec());
    }

    #[test]
    fn sor_keeps_inliers() {
        let mut pts = Vec::new();
        for ix in 0..3 {
            for iy in 0..3 {
                for iz in 0..3 {
                    pts.push([ix as f64, iy as f64, iz as f64]);
                }
            }
        }
        let cloud = PointCloud::from_points(&pts);
        let result = statistical_outlier_removal(&cloud, 5, 3.0).unwrap();
        assert_eq!(result.len(), cloud.len());
    }

    #[test]
    fn mean_distances_exclude_self() {
        let cloud = PointCloud::from_xyz(vec![0.0, 1.0, 3.0], vec![0.0; 3], vec![0.0; 3]);
        let d = mean_neighbor_distances(&cloud, 1);
        assert_relative_eq!(d[0], 1.0);
        assert_relative_eq!(d[1], 1.0);
        assert_relative_eq!(d[2], 2.0);
    }

    #[test]
    fn neighbor_count_must_be_below_point_count() {
        let cloud = PointCloud::from_xyz(vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]);
        let err = statistical_outlier_removal(&cloud, 2, 1.0).unwrap_err();
        assert!(matches!(err, PointCloudError::InvalidParameter(_)));
        assert!(statistical_outlier_removal(&cloud, 1, 1.0).is_ok());
    }

    #[test]
    fn zero_neighbors_rejected() {
        let cloud = PointCloud::from_xyz(vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]);
        let err = statistical_outlier_removal(&cloud, 0, 1.0).unwrap_err();
        assert!(matches!(err, PointCloudError::InvalidParameter(_)));
    }

    #[test]
    fn non_positive_std_ratio_rejected() {
        let cloud = cluster_with_outlier(10);
        for ratio in [0.0, -1.0, f64::NAN] {
            let err = statistical_outlier_removal(&cloud, 3, ratio).unwrap_err();
            assert!(matches!(err, PointCloudError::InvalidParameter(_)));
        }
    }

    #[test]
    fn empty_cloud_is_invalid_parameter() {
        let err = statistical_outlier_removal(&PointCloud::new(), 1, 1.0).unwrap_err();
        assert!(matches!(err, PointCloudError::InvalidParameter(_)));
    }

    #[test]
    fn nan_points_are_dropped() {
        let mut cloud = cluster_with_outlier(10);
        cloud.x[3] = f64::NAN;
        let result = statistical_outlier_removal(&cloud, 3, 5.0).unwrap();
        assert!(result.iter_points().all(|p| p[0].is_finite()));
    }

    proptest! {
        #[test]
        fn sor_never_increases_count(
            pts in prop::collection::vec(
                (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0),
                2..200
            ),
            k in 1usize..10,
            std_ratio in 0.5f64..3.0,
        ) {
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            );
            prop_assume!(k < cloud.len());
            let result = statistical_outlier_removal(&cloud, k, std_ratio).unwrap();
            prop_assert!(result.len() <= cloud.len());
            // The smallest mean distance is always below the threshold.
            prop_assert!(!result.is_empty());
        }
    }
}
