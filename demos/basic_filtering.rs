use pointprep_core::PointCloud;
use pointprep_filters::{crop_box, statistical_outlier_removal, voxel_downsample, CropBox};

fn main() -> pointprep_core::Result<()> {
    // Create a synthetic point cloud: 1000 random-ish points
    let n = 1000;
    let x: Vec<f64> = (0..n).map(|i| (i as f64 * 0.731) % 10.0).collect();
    let y: Vec<f64> = (0..n).map(|i| (i as f64 * 0.419) % 10.0).collect();
    let z: Vec<f64> = (0..n).map(|i| (i as f64 * 0.257) % 10.0).collect();
    let cloud = PointCloud::from_xyz(x, y, z);
    println!("Original cloud: {} points", cloud.len());

    // Keep the box [2, 8] x [2, 8] x [0, 10]
    let bounds = CropBox::from_min_max([2.0, 2.0, 0.0], [8.0, 8.0, 10.0]);
    let cropped = crop_box(&cloud, &bounds)?;
    println!("After crop {:?} .. {:?}: {} points", bounds.min(), bounds.max(), cropped.len());

    // Drop points whose 10 nearest neighbours are unusually far away
    let denoised = statistical_outlier_removal(&cropped, 10, 2.0)?;
    println!("After statistical denoise (k=10, 2.0 sigma): {} points", denoised.len());

    // Voxel downsample with voxel size 1.0
    let downsampled = voxel_downsample(&denoised, 1.0)?;
    println!("After voxel downsample (size=1.0): {} points", downsampled.len());

    let aabb = downsampled.aabb();
    println!("Bounding box: min={:?}, max={:?}", aabb.min, aabb.max);
    Ok(())
}
