use pointprep_core::error::ensure_finite;
use pointprep_core::{PointCloud, PointCloudError, Result};

/// Per-point excess-green index `2G - R - B`, computed in the stored color
/// scale (0–255 for integer colors, as-is for float colors).
pub fn excess_green_index(cloud: &PointCloud) -> Result<Vec<f64>> {
    let colors = cloud.colors.as_ref().ok_or_else(|| {
        PointCloudError::Schema("excess-green index requires red/green/blue fields".into())
    })?;

    Ok((0..cloud.len())
        .map(|i| {
            let [r, g, b] = colors.rgb(i);
            2.0 * g - r - b
        })
        .collect())
}

/// Keep points whose excess-green index is strictly greater than
/// `threshold`. Colors are copied through untouched, so integer colors stay
/// integer and float colors keep their exact values.
pub fn excess_green_filter(cloud: &PointCloud, threshold: f64) -> Result<PointCloud> {
    ensure_finite("exg threshold", threshold)?;
    let index = excess_green_index(cloud)?;

    let keep: Vec<usize> = index
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > threshold)
        .map(|(i, _)| i)
        .collect();

    log::info!(
        "ExG filtering kept {} of {} points (threshold {})",
        keep.len(),
        cloud.len(),
        threshold
    );

    Ok(cloud.select(&keep))
}
