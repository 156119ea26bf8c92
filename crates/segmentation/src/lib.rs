#![forbid(unsafe_code)]

pub mod cluster_filter;
pub mod dbscan;

pub use cluster_filter::{dbscan_filter, ClusterSelection, DbscanParams, Retention};
pub use dbscan::{dbscan, ClusterLabels, NOISE};
