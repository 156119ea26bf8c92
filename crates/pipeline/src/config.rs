use pointprep_core::error::{ensure_finite, ensure_positive};
use pointprep_core::{PointCloudError, Result};
use pointprep_filters::CropBox;
use pointprep_segmentation::DbscanParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Parameters for every stage. Missing JSON fields fall back to the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub box_bounds: CropBox,
    pub exg_threshold: f64,
    pub dbscan_eps: f64,
    pub dbscan_min_points: usize,
    pub dbscan_limit: usize,
    pub outlier_neighbor_count: usize,
    pub outlier_std_ratio: f64,
    /// Voxel edge length in cloud units (meters for survey data).
    pub voxel_size: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            box_bounds: CropBox::default(),
            exg_threshold: 40.0,
            dbscan_eps: 1.0,
            dbscan_min_points: 20,
            dbscan_limit: 1000,
            outlier_neighbor_count: 10,
            outlier_std_ratio: 2.0,
            voxel_size: 0.02,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let decode = |source: io::Error| PointCloudError::Decode {
            path: path.to_path_buf(),
            source,
        };
        let text = fs::read_to_string(path).map_err(decode)?;
        let config = Self::from_json_str(&text).map_err(|e| decode(e.into()))?;
        config.validate()?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.box_bounds.validate()?;
        ensure_finite("exg_threshold", self.exg_threshold)?;
        ensure_positive("dbscan_eps", self.dbscan_eps)?;
        if self.dbscan_min_points == 0 {
            return Err(PointCloudError::invalid("dbscan_min_points must be >= 1"));
        }
        if self.outlier_neighbor_count == 0 {
            return Err(PointCloudError::invalid(
                "outlier_neighbor_count must be >= 1",
            ));
        }
        ensure_positive("outlier_std_ratio", self.outlier_std_ratio)?;
        ensure_positive("voxel_size", self.voxel_size)
    }

    pub fn dbscan_params(&self) -> DbscanParams {
        DbscanParams {
            eps: self.dbscan_eps,
            min_points: self.dbscan_min_points,
            limit: self.dbscan_limit,
        }
    }
}
