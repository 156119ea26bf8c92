//! Point-cloud preprocessing stages and the pipeline that chains them.
//!
//! The individual crates can be used directly; this crate re-exports them
//! under one roof.

#![forbid(unsafe_code)]

pub use pointprep_core as core;
pub use pointprep_filters as filters;
pub use pointprep_io as io;
pub use pointprep_pipeline as pipeline;
pub use pointprep_segmentation as segmentation;
pub use pointprep_spatial as spatial;

pub use pointprep_core::{PointCloud, PointCloudError, Result};
