use crate::dbscan::{dbscan, ClusterLabels};
use pointprep_core::{PointCloud, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbscanParams {
    /// Neighbourhood radius, in cloud units.
    pub eps: f64,
    /// Minimum number of other points within `eps` for a core point.
    pub min_points: usize,
    /// Clusters must be strictly larger than this to be kept.
    pub limit: usize,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            eps: 1.0,
            min_points: 20,
            limit: 1000,
        }
    }
}

/// How [`dbscan_filter`] arrived at its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retention {
    /// Every cluster larger than `limit`, in label order.
    Retained { clusters: Vec<i32>, points: usize },
    /// The retained total fell below `limit`, so only the largest cluster was
    /// kept.
    FallbackLargest { label: i32, points: usize },
    /// No cluster was found; the output is empty.
    AllNoise,
}

#[derive(Debug, Clone)]
pub struct ClusterSelection {
    pub cloud: PointCloud,
    pub labels: ClusterLabels,
    pub retention: Retention,
}

/// Cluster `cloud` with DBSCAN and keep the clusters that look like real
/// structure.
///
/// Clusters with more than `limit` points are concatenated in label order,
/// each in ascending point order. If that leaves fewer than `limit` points,
/// the result is replaced by the single largest cluster (the lowest label
/// wins a tie), whatever its size. A cloud that is entirely noise yields an
/// empty cloud with [`Retention::AllNoise`].
pub fn dbscan_filter(cloud: &PointCloud, params: &DbscanParams) -> Result<ClusterSelection> {
    let labels = dbscan(cloud, params.eps, params.min_points)?;
    let groups = labels.groups();

    if groups.is_empty() {
        log::warn!("all points are noise, no valid clusters detected");
        return Ok(ClusterSelection {
            cloud: cloud.empty_like(),
            labels,
            retention: Retention::AllNoise,
        });
    }

    log::info!("detected {} valid clusters (excluding noise)", groups.len());

    let mut kept_labels = Vec::new();
    let mut kept_indices = Vec::new();
    let mut largest = 0usize;

    for (label, group) in groups.iter().enumerate() {
        log::debug!("label {}: {} points", label, group.len());

        if group.len() > groups[largest].len() {
            largest = label;
        }

        if group.len() > params.limit {
            log::debug!("  retained (>{})", params.limit);
            kept_labels.push(label as i32);
            kept_indices.extend_from_slice(group);
        }
    }

    if kept_indices.len() < params.limit {
        let group = &groups[largest];
        log::info!(
            "total retained points ({}) < {}, falling back to largest cluster ({} points)",
            kept_indices.len(),
            params.limit,
            group.len()
        );
        return Ok(ClusterSelection {
            cloud: cloud.select(group),
            retention: Retention::FallbackLargest {
                label: largest as i32,
                points: group.len(),
            },
            labels,
        });
    }

    log::info!(
        "retained {} clusters with {} points",
        kept_labels.len(),
        kept_indices.len()
    );

    Ok(ClusterSelection {
        cloud: cloud.select(&kept_indices),
        retention: Retention::Retained {
            clusters: kept_labels,
            points: kept_indices.len(),
        },
        labels,
    })
}
