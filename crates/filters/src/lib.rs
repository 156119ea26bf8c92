#![forbid(unsafe_code)]

pub mod color_index;
pub mod crop_box;
pub mod statistical_outlier;
pub mod voxel_downsample;

pub use color_index::{excess_green_filter, excess_green_index};
pub use crop_box::{crop_box, CropBox, Wireframe};
pub use statistical_outlier::{mean_neighbor_distances, statistical_outlier_removal};
pub use voxel_downsample::voxel_downsample;
