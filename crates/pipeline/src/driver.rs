use crate::stage::{output_path, Stage};
use crate::visualize::Visualizer;
use pointprep_core::{PointCloud, PointCloudError, Result};
use pointprep_io::{read_ply, write_ply, PlySchema};
use std::path::{Path, PathBuf};

/// Outcome of loading a file, running stages and persisting the result.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub input_path: PathBuf,
    pub input_points: usize,
    pub output_points: usize,
    /// `None` when the result was empty and nothing was written.
    pub output_path: Option<PathBuf>,
}

/// Read a PLY file. A missing path is [`PointCloudError::InputMissing`]; a
/// file without points is [`PointCloudError::EmptyInput`].
pub fn load_input(input: Option<&Path>) -> Result<(PointCloud, PlySchema)> {
    let path = input.ok_or_else(|| PointCloudError::InputMissing("no input file given".into()))?;

    let (cloud, schema) = read_ply(path).map_err(|source| PointCloudError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    if cloud.is_empty() {
        return Err(PointCloudError::EmptyInput(format!(
            "{} contains no points",
            path.display()
        )));
    }

    log::info!("loaded {} points from {}", cloud.len(), path.display());
    Ok((cloud, schema))
}

/// Run `stages` in order, showing each input (with its overlay) and the final
/// result. Stops early once a stage leaves nothing behind.
pub fn apply_stages(
    cloud: &PointCloud,
    stages: &[Stage],
    visualizer: &dyn Visualizer,
) -> Result<PointCloud> {
    let mut current = cloud.clone();
    for stage in stages {
        let overlay = stage.overlay();
        visualizer.show(&current, overlay.as_ref());

        let next = stage.apply(&current)?;
        log::info!(
            "{}: {} -> {} points",
            stage.tag(),
            current.len(),
            next.len()
        );
        current = next;
        if current.is_empty() {
            break;
        }
    }
    visualizer.show(&current, None);
    Ok(current)
}

/// Load `input`, run `stages`, and write the result next to the input as
/// `<stem>_<Tag1>_<Tag2>...<ext>` (or to `output` when given), in the same
/// PLY field types the input used.
///
/// An empty result is not written; the report then has no output path.
pub fn run_pipeline(
    input: Option<&Path>,
    stages: &[Stage],
    output: Option<&Path>,
    visualizer: &dyn Visualizer,
) -> Result<StageReport> {
    if stages.is_empty() {
        return Err(PointCloudError::invalid("no stages to run"));
    }

    let (cloud, schema) = load_input(input)?;
    let input_path = input.map(Path::to_path_buf).unwrap_or_default();

    let result = apply_stages(&cloud, stages, visualizer)?;

    let mut report = StageReport {
        input_path: input_path.clone(),
        input_points: cloud.len(),
        output_points: result.len(),
        output_path: None,
    };

    if result.is_empty() {
        log::warn!("result is empty, nothing written");
        return Ok(report);
    }

    let target = match output {
        Some(path) => path.to_path_buf(),
        None => stages
            .iter()
            .fold(input_path, |path, stage| output_path(&path, &stage.tag())),
    };

    write_ply(&target, &result, &schema).map_err(|source| PointCloudError::Encode {
        path: target.clone(),
        source,
    })?;
    log::info!("saved {} points to {}", result.len(), target.display());

    report.output_path = Some(target);
    Ok(report)
}

/// [`run_pipeline`] for a single stage with the default output name.
pub fn run_stage(
    input: Option<&Path>,
    stage: &Stage,
    visualizer: &dyn Visualizer,
) -> Result<StageReport> {
    run_pipeline(input, std::slice::from_ref(stage), None, visualizer)
}
