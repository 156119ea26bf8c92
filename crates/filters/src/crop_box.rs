use pointprep_core::error::ensure_finite;
use pointprep_core::{Aabb, PointCloud, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned crop region.
///
/// The bounds follow the convention `x ∈ [-xl, xr]`, `y ∈ [-yl, yr]`,
/// `z ∈ [zd, zu]`: the lower x/y bounds are stored negated, the z bounds are
/// not. Use [`CropBox::from_min_max`] to build one from plain corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub xl: f64,
    pub xr: f64,
    pub yl: f64,
    pub yr: f64,
    pub zd: f64,
    pub zu: f64,
}

/// Line geometry for drawing a [`CropBox`]: 8 corners and 12 edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Wireframe {
    pub vertices: Vec<[f64; 3]>,
    pub edges: Vec<[usize; 2]>,
}

const BOX_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

impl CropBox {
    pub fn new(xl: f64, xr: f64, yl: f64, yr: f64, zd: f64, zu: f64) -> Self {
        Self {
            xl,
            xr,
            yl,
            yr,
            zd,
            zu,
        }
    }

    pub fn from_min_max(min: [f64; 3], max: [f64; 3]) -> Self {
        Self::new(-min[0], max[0], -min[1], max[1], min[2], max[2])
    }

    pub fn min(&self) -> [f64; 3] {
        [-self.xl, -self.yl, self.zd]
    }

    pub fn max(&self) -> [f64; 3] {
        [self.xr, self.yr, self.zu]
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("box xl", self.xl)?;
        ensure_finite("box xr", self.xr)?;
        ensure_finite("box yl", self.yl)?;
        ensure_finite("box yr", self.yr)?;
        ensure_finite("box zd", self.zd)?;
        ensure_finite("box zu", self.zu)
    }

    /// Inclusive on all six faces. Non-finite points are outside.
    #[inline]
    pub fn contains(&self, p: &[f64; 3]) -> bool {
        p[0] >= -self.xl
            && p[0] <= self.xr
            && p[1] >= -self.yl
            && p[1] <= self.yr
            && p[2] >= self.zd
            && p[2] <= self.zu
    }

    /// Bottom face (z = zd) counter-clockwise, then the top face, then the
    /// four vertical edges.
    pub fn wireframe(&self) -> Wireframe {
        let [x0, y0, z0] = self.min();
        let [x1, y1, z1] = self.max();
        Wireframe {
            vertices: vec![
                [x0, y0, z0],
                [x1, y0, z0],
                [x1, y1, z0],
                [x0, y1, z0],
                [x0, y0, z1],
                [x1, y0, z1],
                [x1, y1, z1],
                [x0, y1, z1],
            ],
            edges: BOX_EDGES.to_vec(),
        }
    }
}

impl Wireframe {
    /// Bounds of the drawn corners.
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for v in &self.vertices {
            aabb.expand_with_point(*v);
        }
        aabb
    }
}

impl Default for CropBox {
    fn default() -> Self {
        Self::new(15.0, 15.0, 15.0, 15.0, 20.0, 50.0)
    }
}

/// Keep the points inside `bounds`, in their original order and with every
/// attribute unchanged.
pub fn crop_box(cloud: &PointCloud, bounds: &CropBox) -> Result<PointCloud> {
    bounds.validate()?;

    let keep: Vec<usize> = (0..cloud.len())
        .filter(|&i| bounds.contains(&cloud.point(i)))
        .collect();

    log::info!(
        "box crop kept {} of {} points (min={:?}, max={:?})",
        keep.len(),
        cloud.len(),
        bounds.min(),
        bounds.max()
    );

    Ok(cloud.select(&keep))
}
