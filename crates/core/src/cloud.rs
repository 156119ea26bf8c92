use crate::Aabb;

/// Columnar point set. All columns share one length, and the presence and
/// numeric type of normals/colors apply to every point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub normals: Option<Normals>,
    pub colors: Option<Colors>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normals {
    pub nx: Vec<f64>,
    pub ny: Vec<f64>,
    pub nz: Vec<f64>,
}

/// Per-point RGB, kept in whichever representation it was loaded with so
/// that a save writes back the same field types.
#[derive(Debug, Clone, PartialEq)]
pub enum Colors {
    /// Integer channels in `0..=255`.
    U8 { r: Vec<u8>, g: Vec<u8>, b: Vec<u8> },
    F32 { r: Vec<f32>, g: Vec<f32>, b: Vec<f32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    U8,
    F32,
}

impl Normals {
    pub fn len(&self) -> usize {
        self.nx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nx.is_empty()
    }

    pub fn get(&self, i: usize) -> [f64; 3] {
        [self.nx[i], self.ny[i], self.nz[i]]
    }

    fn select(&self, indices: &[usize]) -> Self {
        Self {
            nx: indices.iter().map(|&idx| self.nx[idx]).collect(),
            ny: indices.iter().map(|&idx| self.ny[idx]).collect(),
            nz: indices.iter().map(|&idx| self.nz[idx]).collect(),
        }
    }
}

impl Colors {
    pub fn kind(&self) -> ColorKind {
        match self {
            Colors::U8 { .. } => ColorKind::U8,
            Colors::F32 { .. } => ColorKind::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Colors::U8 { r, .. } => r.len(),
            Colors::F32 { r, .. } => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channel values of point `i` widened to `f64`, in the stored scale.
    pub fn rgb(&self, i: usize) -> [f64; 3] {
        match self {
            Colors::U8 { r, g, b } => [r[i] as f64, g[i] as f64, b[i] as f64],
            Colors::F32 { r, g, b } => [r[i] as f64, g[i] as f64, b[i] as f64],
        }
    }

    /// Build a column of the given kind from `f64` channel values.
    ///
    /// `U8` values are rounded and clamped to `0..=255`.
    pub fn from_rgb(kind: ColorKind, rgb: &[[f64; 3]]) -> Self {
        match kind {
            ColorKind::U8 => {
                let to_u8 = |v: f64| v.round().clamp(0.0, 255.0) as u8;
                Colors::U8 {
                    r: rgb.iter().map(|c| to_u8(c[0])).collect(),
                    g: rgb.iter().map(|c| to_u8(c[1])).collect(),
                    b: rgb.iter().map(|c| to_u8(c[2])).collect(),
                }
            }
            ColorKind::F32 => Colors::F32 {
                r: rgb.iter().map(|c| c[0] as f32).collect(),
                g: rgb.iter().map(|c| c[1] as f32).collect(),
                b: rgb.iter().map(|c| c[2] as f32).collect(),
            },
        }
    }

    fn select(&self, indices: &[usize]) -> Self {
        match self {
            Colors::U8 { r, g, b } => Colors::U8 {
                r: indices.iter().map(|&idx| r[idx]).collect(),
                g: indices.iter().map(|&idx| g[idx]).collect(),
                b: indices.iter().map(|&idx| b[idx]).collect(),
            },
            Colors::F32 { r, g, b } => Colors::F32 {
                r: indices.iter().map(|&idx| r[idx]).collect(),
                g: indices.iter().map(|&idx| g[idx]).collect(),
                b: indices.iter().map(|&idx| b[idx]).collect(),
            },
        }
    }
}

impl PointCloud {
    pub fn new() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            normals: None,
            colors: None,
        }
    }

    pub fn from_xyz(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        assert_eq!(x.len(), z.len(), "x and z must have same length");

        Self {
            x,
            y,
            z,
            normals: None,
            colors: None,
        }
    }

    pub fn from_points(points: &[[f64; 3]]) -> Self {
        Self::from_xyz(
            points.iter().map(|p| p[0]).collect(),
            points.iter().map(|p| p[1]).collect(),
            points.iter().map(|p| p[2]).collect(),
        )
    }

    /// Attach normals. Panics if the column lengths differ from the cloud.
    pub fn with_normals(mut self, normals: Normals) -> Self {
        assert_eq!(normals.nx.len(), self.len(), "nx length mismatch");
        assert_eq!(normals.ny.len(), self.len(), "ny length mismatch");
        assert_eq!(normals.nz.len(), self.len(), "nz length mismatch");
        self.normals = Some(normals);
        self
    }

    /// Attach colors. Panics if the column lengths differ from the cloud.
    pub fn with_colors(mut self, colors: Colors) -> Self {
        let lens = match &colors {
            Colors::U8 { r, g, b } => [r.len(), g.len(), b.len()],
            Colors::F32 { r, g, b } => [r.len(), g.len(), b.len()],
        };
        assert!(
            lens.iter().all(|&l| l == self.len()),
            "color column length mismatch"
        );
        self.colors = Some(colors);
        self
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        debug_assert_eq!(self.x.len(), self.z.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_xyz(&self.x, &self.y, &self.z)
    }

    pub fn point(&self, i: usize) -> [f64; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    pub fn is_finite_at(&self, i: usize) -> bool {
        self.x[i].is_finite() && self.y[i].is_finite() && self.z[i].is_finite()
    }

    pub fn iter_points(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((x, y), z)| [*x, *y, *z])
    }

    /// New cloud with the points at `indices`, in that order, carrying every
    /// attribute along. An empty index list yields an empty cloud that keeps
    /// this cloud's attribute schema.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut x = Vec::with_capacity(indices.len());
        let mut y = Vec::with_capacity(indices.len());
        let mut z = Vec::with_capacity(indices.len());

        for &idx in indices {
            assert!(idx < self.len(), "index out of bounds in select");
            x.push(self.x[idx]);
            y.push(self.y[idx]);
            z.push(self.z[idx]);
        }

        Self {
            x,
            y,
            z,
            normals: self.normals.as_ref().map(|n| n.select(indices)),
            colors: self.colors.as_ref().map(|c| c.select(indices)),
        }
    }

    /// Select the points whose `mask` entry is `true`, preserving order.
    pub fn select_mask(&self, mask: &[bool]) -> Self {
        assert_eq!(mask.len(), self.len(), "mask length must match cloud");
        let keep: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.select(&keep)
    }

    /// Empty cloud with the same attribute schema as `self`.
    pub fn empty_like(&self) -> Self {
        self.select(&[])
    }

    /// Whether `other` carries the same attribute presence and color type.
    pub fn same_schema(&self, other: &PointCloud) -> bool {
        self.normals.is_some() == other.normals.is_some()
            && self.colors.as_ref().map(Colors::kind) == other.colors.as_ref().map(Colors::kind)
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}
