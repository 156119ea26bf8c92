#![forbid(unsafe_code)]

pub mod bbox;
pub mod cloud;
pub mod error;

pub use bbox::Aabb;
pub use cloud::{ColorKind, Colors, Normals, PointCloud};
pub use error::{PointCloudError, Result};
