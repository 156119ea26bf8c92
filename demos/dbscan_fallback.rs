use pointprep_core::PointCloud;
use pointprep_segmentation::{dbscan_filter, DbscanParams, Retention};

/// `n` points spread over a cube of side `side` centred on `center`.
fn blob(center: [f64; 3], n: usize, side: f64) -> Vec<[f64; 3]> {
    let per_axis = (n as f64).cbrt().ceil() as usize;
    let step = side / per_axis as f64;
    (0..n)
        .map(|i| {
            let (a, b, c) = (i % per_axis, (i / per_axis) % per_axis, i / (per_axis * per_axis));
            [
                center[0] - side / 2.0 + a as f64 * step,
                center[1] - side / 2.0 + b as f64 * step,
                center[2] - side / 2.0 + c as f64 * step,
            ]
        })
        .collect()
}

fn describe(name: &str, cloud: &PointCloud, params: &DbscanParams) -> pointprep_core::Result<()> {
    let sel = dbscan_filter(cloud, params)?;
    println!(
        "{}: {} clusters, sizes {:?}, {} noise",
        name,
        sel.labels.num_clusters,
        sel.labels.cluster_sizes(),
        sel.labels.noise().len()
    );
    match sel.retention {
        Retention::Retained { clusters, points } => {
            println!("  kept clusters {:?} ({} points)", clusters, points)
        }
        Retention::FallbackLargest { label, points } => println!(
            "  nothing reached the limit of {}, kept largest cluster {} ({} points)",
            params.limit, label, points
        ),
        Retention::AllNoise => println!("  everything is noise, output is empty"),
    }
    Ok(())
}

fn main() -> pointprep_core::Result<()> {
    let params = DbscanParams {
        eps: 1.0,
        min_points: 20,
        limit: 1000,
    };

    // Two plants big enough to keep, plus a weed.
    let mut pts = blob([0.0, 0.0, 0.0], 1500, 4.0);
    pts.extend(blob([20.0, 0.0, 0.0], 1200, 4.0));
    pts.extend(blob([40.0, 0.0, 0.0], 100, 1.5));
    describe("two large plants", &PointCloud::from_points(&pts), &params)?;

    // Seedlings only: every cluster is under the limit, the largest survives.
    let mut pts = blob([0.0, 0.0, 0.0], 300, 2.0);
    pts.extend(blob([20.0, 0.0, 0.0], 500, 2.0));
    describe("seedlings", &PointCloud::from_points(&pts), &params)?;

    // Sparse scatter.
    let pts: Vec<[f64; 3]> = (0..200).map(|i| [i as f64 * 3.0, 0.0, 0.0]).collect();
    describe("scatter", &PointCloud::from_points(&pts), &params)?;

    Ok(())
}
