use crate::config::PipelineConfig;
use pointprep_core::{PointCloud, Result};
use pointprep_filters::{
    crop_box, excess_green_filter, statistical_outlier_removal, voxel_downsample, CropBox,
    Wireframe,
};
use pointprep_segmentation::{dbscan_filter, DbscanParams};
use std::path::{Path, PathBuf};

/// Which stage to build from a [`PipelineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Crop,
    ExcessGreen,
    Dbscan,
    Denoise,
    Voxel,
}

/// One preprocessing step with its parameters bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Crop(CropBox),
    ExcessGreen { threshold: f64 },
    Dbscan(DbscanParams),
    Denoise { neighbor_count: usize, std_ratio: f64 },
    Voxel { size: f64 },
}

impl Stage {
    pub fn from_config(kind: StageKind, config: &PipelineConfig) -> Self {
        match kind {
            StageKind::Crop => Stage::Crop(config.box_bounds),
            StageKind::ExcessGreen => Stage::ExcessGreen {
                threshold: config.exg_threshold,
            },
            StageKind::Dbscan => Stage::Dbscan(config.dbscan_params()),
            StageKind::Denoise => Stage::Denoise {
                neighbor_count: config.outlier_neighbor_count,
                std_ratio: config.outlier_std_ratio,
            },
            StageKind::Voxel => Stage::Voxel {
                size: config.voxel_size,
            },
        }
    }

    /// Suffix appended to the output file stem.
    pub fn tag(&self) -> String {
        match self {
            Stage::Crop(_) => "Boxrocess".to_string(),
            Stage::ExcessGreen { .. } => "ExGFiltered".to_string(),
            Stage::Dbscan(_) => "DBSCANFiltered".to_string(),
            Stage::Denoise { .. } => "StatDenoised".to_string(),
            Stage::Voxel { size } => {
                let cm = (size * 100.0 * 1e6).round() / 1e6;
                format!("Voxel{:?}cm", cm)
            }
        }
    }

    /// Geometry to draw over the input before the stage runs.
    pub fn overlay(&self) -> Option<Wireframe> {
        match self {
            Stage::Crop(bounds) => Some(bounds.wireframe()),
            _ => None,
        }
    }

    pub fn apply(&self, cloud: &PointCloud) -> Result<PointCloud> {
        match self {
            Stage::Crop(bounds) => crop_box(cloud, bounds),
            Stage::ExcessGreen { threshold } => excess_green_filter(cloud, *threshold),
            Stage::Dbscan(params) => dbscan_filter(cloud, params).map(|sel| sel.cloud),
            Stage::Denoise {
                neighbor_count,
                std_ratio,
            } => statistical_outlier_removal(cloud, *neighbor_count, *std_ratio),
            Stage::Voxel { size } => voxel_downsample(cloud, *size),
        }
    }
}

/// `<dir>/<stem>_<tag>.<ext>` next to `input`.
pub fn output_path(input: &Path, tag: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}_{}.{}", stem, tag, ext.to_string_lossy()),
        None => format!("{}_{}", stem, tag),
    };
    input.with_file_name(name)
}
