use pointprep_core::{Aabb, PointCloud};
use pointprep_filters::Wireframe;

/// Somewhere to show a cloud between stages. Calls must not block the
/// pipeline on user interaction.
pub trait Visualizer {
    fn show(&self, cloud: &PointCloud, overlay: Option<&Wireframe>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisualizer;

impl Visualizer for NoopVisualizer {
    fn show(&self, _cloud: &PointCloud, _overlay: Option<&Wireframe>) {}
}

/// Logs a one-line summary of each cloud.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogVisualizer;

fn describe_bounds(bounds: &Aabb) -> String {
    match bounds.center() {
        Some(center) => format!(
            "bounds {:?} .. {:?}, center {:?}, extent {:?}",
            bounds.min,
            bounds.max,
            center,
            bounds.extent()
        ),
        None => "no finite bounds".to_string(),
    }
}

impl Visualizer for LogVisualizer {
    fn show(&self, cloud: &PointCloud, overlay: Option<&Wireframe>) {
        log::info!("view: {} points, {}", cloud.len(), describe_bounds(&cloud.aabb()));
        if let Some(frame) = overlay {
            log::info!("view: box overlay {}", describe_bounds(&frame.bounds()));
        }
    }
}
