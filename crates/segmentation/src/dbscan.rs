use pointprep_core::error::ensure_positive;
use pointprep_core::{PointCloud, PointCloudError, Result};
use pointprep_spatial::KdTree;
use rayon::prelude::*;
use std::collections::VecDeque;

/// Label of points that belong to no cluster.
pub const NOISE: i32 = -1;

/// Per-point cluster labels produced by [`dbscan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabels {
    /// One entry per input point: `0..num_clusters` or [`NOISE`].
    pub labels: Vec<i32>,
    pub num_clusters: usize,
}

impl ClusterLabels {
    /// Point indices of each cluster, indexed by label. Indices inside a
    /// cluster are ascending.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.num_clusters];
        for (i, &label) in self.labels.iter().enumerate() {
            if label != NOISE {
                groups[label as usize].push(i);
            }
        }
        groups
    }

    pub fn noise(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == NOISE)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.num_clusters];
        for &label in &self.labels {
            if label != NOISE {
                sizes[label as usize] += 1;
            }
        }
        sizes
    }
}

/// Density-based clustering (DBSCAN).
///
/// A point is a core point when at least `min_points` *other* points lie
/// within `eps` of it (boundary inclusive). Core points within `eps` of each
/// other share a cluster; a non-core point within `eps` of a core point joins
/// as a border point; everything else is [`NOISE`].
///
/// Clusters are grown breadth-first from the lowest-index unlabelled core
/// point, and labels count up from 0 in that order. A border point reachable
/// from several clusters keeps the label of the first one that reaches it.
/// Points with non-finite coordinates are always noise.
pub fn dbscan(cloud: &PointCloud, eps: f64, min_points: usize) -> Result<ClusterLabels> {
    ensure_positive("eps", eps)?;
    if min_points == 0 {
        return Err(PointCloudError::invalid("min_points must be >= 1"));
    }

    let n = cloud.len();
    let tree = KdTree::build(cloud);

    // Neighbour lists are independent per point; `collect` keeps index order.
    let neighbors: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| tree.radius_search(&cloud.point(i), eps))
        .collect();

    // A finite point always finds itself, so "others" is the hit count minus one.
    let is_core: Vec<bool> = neighbors
        .iter()
        .map(|nb| nb.len().saturating_sub(1) >= min_points)
        .collect();

    let mut labels = vec![NOISE; n];
    let mut num_clusters = 0usize;

    for seed in 0..n {
        if !is_core[seed] || labels[seed] != NOISE {
            continue;
        }

        let label = num_clusters as i32;
        num_clusters += 1;

        let mut queue = VecDeque::new();
        labels[seed] = label;
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            // Border points are labelled but never expanded.
            if !is_core[current] {
                continue;
            }
            for &neighbor in &neighbors[current] {
                if labels[neighbor] == NOISE {
                    labels[neighbor] = label;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    log::debug!(
        "dbscan: {} points, {} core, {} clusters",
        n,
        is_core.iter().filter(|&&c| c).count(),
        num_clusters
    );

    Ok(ClusterLabels {
        labels,
        num_clusters,
    })
}
