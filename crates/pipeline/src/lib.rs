#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod stage;
pub mod visualize;

pub use config::PipelineConfig;
pub use driver::{apply_stages, load_input, run_pipeline, run_stage, StageReport};
pub use stage::{output_path, Stage, StageKind};
pub use visualize::{LogVisualizer, NoopVisualizer, Visualizer};
