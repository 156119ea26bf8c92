use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use pointprep_core::PointCloud;
use std::num::NonZero;

/// A KdTree for neighbour queries over a [`PointCloud`].
///
/// Built on kiddo's `ImmutableKdTree`. Only points with finite coordinates
/// are indexed; each stored item is the point's index in the source cloud, so
/// query results refer back to the original cloud directly.
#[derive(Debug, Clone)]
pub struct KdTree {
    tree: ImmutableKdTree<f64, u32, 3, 32>,
    items: Vec<u32>,
    num_indexed: usize,
    num_points: usize,
}

impl KdTree {
    /// Build a KdTree from a PointCloud.
    ///
    /// # Panics
    ///
    /// Panics if the cloud holds more than `u32::MAX` points.
    pub fn build(cloud: &PointCloud) -> Self {
        let n = cloud.len();
        assert!(n <= u32::MAX as usize, "cloud too large for KdTree");

        let finite: Vec<usize> = (0..n).filter(|&i| cloud.is_finite_at(i)).collect();
        let points: Vec<[f64; 3]> = finite.iter().map(|&i| cloud.point(i)).collect();

        let tree = ImmutableKdTree::new_from_slice(&points);

        Self {
            tree,
            num_indexed: points.len(),
            num_points: n,
            items: finite.into_iter().map(|i| i as u32).collect(),
        }
    }

    /// Number of points in the source cloud, indexed or not.
    pub fn len(&self) -> usize {
        self.num_points
    }

    pub fn is_empty(&self) -> bool {
        self.num_indexed == 0
    }

    /// Number of finite points actually stored in the tree.
    pub fn indexed_len(&self) -> usize {
        self.num_indexed
    }

    /// Find the `k` nearest neighbours to `query`.
    ///
    /// Returns `(indices, distances)` with Euclidean (not squared) distances
    /// in ascending order. A query taken from the cloud finds itself first at
    /// distance 0.
    ///
    /// Returns empty if `k == 0`, nothing is indexed, or `query` is not
    /// finite. If `k` exceeds the indexed count, all indexed points are
    /// returned.
    pub fn knn(&self, query: &[f64; 3], k: usize) -> (Vec<usize>, Vec<f64>) {
        let Some(nz_k) = NonZero::new(k) else {
            return (Vec::new(), Vec::new());
        };
        if self.is_empty() || !query.iter().all(|v| v.is_finite()) {
            return (Vec::new(), Vec::new());
        }

        let results = self.tree.nearest_n::<SquaredEuclidean>(query, nz_k);

        let mut indices = Vec::with_capacity(results.len());
        let mut distances = Vec::with_capacity(results.len());
        for nn in results {
            indices.push(self.items[nn.item as usize] as usize);
            distances.push(nn.distance.sqrt());
        }

        (indices, distances)
    }

    /// Find all points with `euclidean_dist <= radius` of `query`, sorted by
    /// index.
    ///
    /// Returns empty if `radius` is not finite and positive, nothing is
    /// indexed, or `query` is not finite.
    pub fn radius_search(&self, query: &[f64; 3], radius: f64) -> Vec<usize> {
        if self.is_empty()
            || radius <= 0.0
            || !radius.is_finite()
            || !query.iter().all(|v| v.is_finite())
        {
            return Vec::new();
        }

        let radius_sq = radius * radius;

        // kiddo's `within_unsorted` compares with strict `<`; widen the query
        // slightly and post-filter with `<=` so boundary points are kept.
        let query_radius_sq = radius_sq + f64::EPSILON * radius_sq.max(1.0);

        let mut indices: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(query, query_radius_sq)
            .into_iter()
            .filter(|nn| nn.distance <= radius_sq)
            .map(|nn| self.items[nn.item as usize] as usize)
            .collect();

        indices.sort_unstable();
        indices
    }
}
