use hashbrown::HashMap;
use pointprep_core::error::ensure_positive;
use pointprep_core::{Colors, Normals, PointCloud, PointCloudError, Result};

type VoxelKey = (i64, i64, i64);

#[derive(Default, Clone, Copy)]
struct VoxelAccum {
    pos: [f64; 3],
    normal: [f64; 3],
    rgb: [f64; 3],
    n: usize,
}

/// Integer cell of `p`, or `None` when a cell index does not fit in `i64`.
#[inline]
fn voxel_key(p: &[f64; 3], voxel_size: f64) -> Option<VoxelKey> {
    // `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
    let cell = |v: f64| {
        let q = (v / voxel_size).floor();
        (q >= i64::MIN as f64 && q < i64::MAX as f64).then_some(q as i64)
    };
    Some((cell(p[0])?, cell(p[1])?, cell(p[2])?))
}

/// Replace the points of every occupied voxel by their centroid.
///
/// Normals and colors, when present, are averaged over the same points;
/// integer colors are rounded back to `u8`. Output is ordered by voxel key,
/// so repeated runs produce identical clouds. Non-finite points are skipped.
/// A finite point whose cell index overflows `i64` is `InvalidParameter`.
pub fn voxel_downsample(cloud: &PointCloud, voxel_size: f64) -> Result<PointCloud> {
    ensure_positive("voxel_size", voxel_size)?;

    let mut bins: HashMap<VoxelKey, VoxelAccum> = HashMap::new();

    for i in 0..cloud.len() {
        if !cloud.is_finite_at(i) {
            continue;
        }
        let p = cloud.point(i);
        let key = voxel_key(&p, voxel_size).ok_or_else(|| {
            PointCloudError::invalid(format!(
                "point {:?} is out of range for voxel_size {}",
                p, voxel_size
            ))
        })?;

        let entry = bins.entry(key).or_default();
        for axis in 0..3 {
            entry.pos[axis] += p[axis];
        }
        if let Some(normals) = &cloud.normals {
            let nrm = normals.get(i);
            for axis in 0..3 {
                entry.normal[axis] += nrm[axis];
            }
        }
        if let Some(colors) = &cloud.colors {
            let rgb = colors.rgb(i);
            for ch in 0..3 {
                entry.rgb[ch] += rgb[ch];
            }
        }
        entry.n += 1;
    }

    let mut voxels: Vec<(VoxelKey, VoxelAccum)> = bins.into_iter().collect();
    voxels.sort_unstable_by_key(|(key, _)| *key);

    let mean = |sum: [f64; 3], n: usize| {
        let denom = n as f64;
        [sum[0] / denom, sum[1] / denom, sum[2] / denom]
    };

    let positions: Vec<[f64; 3]> = voxels.iter().map(|(_, a)| mean(a.pos, a.n)).collect();
    let mut out = PointCloud::from_points(&positions);

    if cloud.normals.is_some() {
        let avg: Vec<[f64; 3]> = voxels.iter().map(|(_, a)| mean(a.normal, a.n)).collect();
        out = out.with_normals(Normals {
            nx: avg.iter().map(|n| n[0]).collect(),
            ny: avg.iter().map(|n| n[1]).collect(),
            nz: avg.iter().map(|n| n[2]).collect(),
        });
    }

    if let Some(colors) = &cloud.colors {
        let avg: Vec<[f64; 3]> = voxels.iter().map(|(_, a)| mean(a.rgb, a.n)).collect();
        out = out.with_colors(Colors::from_rgb(colors.kind(), &avg));
    }

    log::info!(
        "voxel downsampling (size {}) reduced {} points to {}",
        voxel_size,
        cloud.len(),
        out.len()
    );

    Ok(out)
}
