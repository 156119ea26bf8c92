use pointprep_core::{ColorKind, Colors, Normals, PointCloud};
use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyEncoding {
    Ascii,
    BinaryLittleEndian,
}

/// Scalar property type as declared in a PLY header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Char,
    Uchar,
    Short,
    Ushort,
    Int,
    Uint,
    Float,
    Double,
}

impl ScalarType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => ScalarType::Char,
            "uchar" | "uint8" => ScalarType::Uchar,
            "short" | "int16" => ScalarType::Short,
            "ushort" | "uint16" => ScalarType::Ushort,
            "int" | "int32" => ScalarType::Int,
            "uint" | "uint32" => ScalarType::Uint,
            "float" | "float32" => ScalarType::Float,
            "double" | "float64" => ScalarType::Double,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::Uchar => "uchar",
            ScalarType::Short => "short",
            ScalarType::Ushort => "ushort",
            ScalarType::Int => "int",
            ScalarType::Uint => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            ScalarType::Char | ScalarType::Uchar => 1,
            ScalarType::Short | ScalarType::Ushort => 2,
            ScalarType::Int | ScalarType::Uint | ScalarType::Float => 4,
            ScalarType::Double => 8,
        }
    }

    /// Decode one little-endian value. `bytes` must hold at least
    /// `byte_size()` bytes.
    fn read_le(self, bytes: &[u8]) -> f64 {
        match self {
            ScalarType::Char => bytes[0] as i8 as f64,
            ScalarType::Uchar => bytes[0] as f64,
            ScalarType::Short => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ScalarType::Ushort => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ScalarType::Int => {
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ScalarType::Uint => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ScalarType::Float => {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ScalarType::Double => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }

    fn parse_ascii(self, token: &str) -> io::Result<f64> {
        let parsed = match self {
            ScalarType::Float => token.parse::<f32>().map(f64::from).map_err(|e| e.to_string()),
            ScalarType::Double => token.parse::<f64>().map_err(|e| e.to_string()),
            _ => token.parse::<i64>().map(|v| v as f64).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse {} value {:?}: {}", self.name(), token, e),
            )
        })
    }

    fn is_float(self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::Double)
    }
}

/// Field layout of a PLY vertex element, kept so a processed cloud can be
/// written back with the same numeric types it was read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlySchema {
    pub encoding: PlyEncoding,
    pub position: ScalarType,
    pub normal: Option<ScalarType>,
    pub color: Option<ScalarType>,
}

impl PlySchema {
    /// Binary schema matching the attributes present on `cloud`: double
    /// positions, float normals, colors in the cloud's representation.
    pub fn for_cloud(cloud: &PointCloud) -> Self {
        Self {
            encoding: PlyEncoding::BinaryLittleEndian,
            position: ScalarType::Double,
            normal: cloud.normals.as_ref().map(|_| ScalarType::Float),
            color: cloud.colors.as_ref().map(|c| color_scalar(c.kind())),
        }
    }

    pub fn with_encoding(mut self, encoding: PlyEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

fn color_scalar(kind: ColorKind) -> ScalarType {
    match kind {
        ColorKind::U8 => ScalarType::Uchar,
        ColorKind::F32 => ScalarType::Float,
    }
}

/// Positions and normals can only be written as `float` or `double`.
fn float_scalar(t: ScalarType) -> ScalarType {
    if t.is_float() {
        t
    } else {
        ScalarType::Float
    }
}

struct PlyHeader {
    encoding: PlyEncoding,
    vertex_count: usize,
    property_names: Vec<String>,
    property_types: Vec<ScalarType>,
    header_end_offset: usize,
}

impl PlyHeader {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.property_names.iter().position(|n| n == name)
    }

    fn stride(&self) -> usize {
        self.property_types.iter().map(|t| t.byte_size()).sum()
    }

    fn offsets(&self) -> Vec<usize> {
        self.property_types
            .iter()
            .scan(0usize, |acc, t| {
                let off = *acc;
                *acc += t.byte_size();
                Some(off)
            })
            .collect()
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn unsupported(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, msg.into())
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_ply_header(data: &[u8]) -> io::Result<PlyHeader> {
    let marker = b"end_header";
    let header_end =
        find_bytes(data, marker).ok_or_else(|| invalid("missing end_header in PLY file"))?;
    let line_end = data[header_end..]
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| invalid("end_header line is not terminated"))?;
    let header_end_offset = header_end + line_end + 1;

    let header_text = std::str::from_utf8(&data[..header_end])
        .map_err(|_| invalid("PLY header not valid UTF-8"))?;

    let mut lines = header_text.lines().map(str::trim);
    if lines.next() != Some("ply") {
        return Err(invalid("file does not start with 'ply'"));
    }

    let mut encoding = None;
    let mut vertex_count = None;
    let mut property_names = Vec::new();
    let mut property_types = Vec::new();
    let mut in_vertex_element = false;
    let mut seen_element = false;

    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["format", "ascii", ..] => encoding = Some(PlyEncoding::Ascii),
            ["format", "binary_little_endian", ..] => {
                encoding = Some(PlyEncoding::BinaryLittleEndian)
            }
            ["format", other, ..] => {
                return Err(unsupported(format!("unsupported PLY format: {}", other)))
            }
            ["element", "vertex", count] => {
                if seen_element {
                    return Err(unsupported("vertex must be the first PLY element"));
                }
                seen_element = true;
                in_vertex_element = true;
                vertex_count = Some(
                    count
                        .parse::<usize>()
                        .map_err(|e| invalid(format!("invalid vertex count: {}", e)))?,
                );
            }
            ["element", ..] => {
                seen_element = true;
                in_vertex_element = false;
            }
            ["property", "list", ..] if in_vertex_element => {
                return Err(unsupported("list properties on vertices are not supported"));
            }
            ["property", ty, name] if in_vertex_element => {
                let ty = ScalarType::parse(ty)
                    .ok_or_else(|| unsupported(format!("unsupported property type: {}", ty)))?;
                property_types.push(ty);
                property_names.push((*name).to_string());
            }
            _ => {}
        }
    }

    Ok(PlyHeader {
        encoding: encoding.ok_or_else(|| invalid("PLY format line missing"))?,
        vertex_count: vertex_count.ok_or_else(|| invalid("PLY file has no vertex element"))?,
        property_names,
        property_types,
        header_end_offset,
    })
}

/// Look up a triple of properties; `None` unless all three are present.
fn triple(header: &PlyHeader, names: [&str; 3]) -> Option<[usize; 3]> {
    Some([
        header.index_of(names[0])?,
        header.index_of(names[1])?,
        header.index_of(names[2])?,
    ])
}

/// Shared scalar type of a property triple.
fn triple_type(header: &PlyHeader, idx: [usize; 3], what: &str) -> io::Result<ScalarType> {
    let t = header.property_types[idx[0]];
    if idx.iter().any(|&i| header.property_types[i] != t) {
        return Err(unsupported(format!("{} properties have mixed types", what)));
    }
    Ok(t)
}

/// Read every vertex row into `f64` values, one `Vec` per row.
fn read_rows(data: &[u8], header: &PlyHeader) -> io::Result<Vec<Vec<f64>>> {
    let body = &data[header.header_end_offset..];
    let n_props = header.property_names.len();

    match header.encoding {
        PlyEncoding::Ascii => {
            let body =
                std::str::from_utf8(body).map_err(|_| invalid("PLY body not valid UTF-8"))?;
            // One vertex per non-empty line, so the body length caps it.
            let mut rows = Vec::with_capacity(header.vertex_count.min(body.len()));
            for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
                if rows.len() >= header.vertex_count {
                    break;
                }
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < n_props {
                    return Err(invalid(format!(
                        "vertex line has {} fields, expected {}",
                        parts.len(),
                        n_props
                    )));
                }
                let row = header
                    .property_types
                    .iter()
                    .zip(&parts)
                    .map(|(ty, token)| ty.parse_ascii(token))
                    .collect::<io::Result<Vec<f64>>>()?;
                rows.push(row);
            }
            if rows.len() < header.vertex_count {
                return Err(invalid(format!(
                    "PLY body has {} vertices, header declares {}",
                    rows.len(),
                    header.vertex_count
                )));
            }
            Ok(rows)
        }
        PlyEncoding::BinaryLittleEndian => {
            let stride = header.stride();
            let needed = header.vertex_count.checked_mul(stride).ok_or_else(|| {
                invalid(format!(
                    "PLY vertex count {} with {}-byte records overflows",
                    header.vertex_count, stride
                ))
            })?;
            if body.len() < needed {
                return Err(invalid(format!(
                    "PLY binary body too short: need {} bytes, got {}",
                    needed,
                    body.len()
                )));
            }
            let offsets = header.offsets();
            let mut rows = Vec::with_capacity(header.vertex_count);
            for record in body[..needed].chunks_exact(stride.max(1)).take(header.vertex_count) {
                rows.push(
                    header
                        .property_types
                        .iter()
                        .zip(&offsets)
                        .map(|(ty, &off)| ty.read_le(&record[off..]))
                        .collect(),
                );
            }
            Ok(rows)
        }
    }
}

/// Read a PLY file, returning the cloud and the schema it was stored with.
///
/// Only `x/y/z`, `nx/ny/nz` and `red/green/blue` are read; other vertex
/// properties and other elements are skipped. Colors must be `uchar` or
/// `float`.
pub fn read_ply(path: impl AsRef<Path>) -> io::Result<(PointCloud, PlySchema)> {
    let data = fs::read(&path)?;
    let header = parse_ply_header(&data)?;

    let pos_idx = triple(&header, ["x", "y", "z"])
        .ok_or_else(|| invalid("PLY file missing required x, y, z properties"))?;
    let normal_idx = triple(&header, ["nx", "ny", "nz"]);
    let color_idx = triple(&header, ["red", "green", "blue"]);

    let position_type = triple_type(&header, pos_idx, "position")?;
    let normal_type = normal_idx
        .map(|idx| triple_type(&header, idx, "normal"))
        .transpose()?;
    let color_type = color_idx
        .map(|idx| triple_type(&header, idx, "color"))
        .transpose()?;
    if let Some(t) = color_type {
        if t != ScalarType::Uchar && t != ScalarType::Float {
            return Err(unsupported(format!(
                "color properties must be uchar or float, got {}",
                t.name()
            )));
        }
    }

    let rows = read_rows(&data, &header)?;
    let column = |idx: usize| -> Vec<f64> { rows.iter().map(|r| r[idx]).collect() };

    let mut cloud = PointCloud::from_xyz(column(pos_idx[0]), column(pos_idx[1]), column(pos_idx[2]));

    if let Some(idx) = normal_idx {
        cloud = cloud.with_normals(Normals {
            nx: column(idx[0]),
            ny: column(idx[1]),
            nz: column(idx[2]),
        });
    }

    if let (Some(idx), Some(t)) = (color_idx, color_type) {
        let colors = if t == ScalarType::Uchar {
            let channel = |i: usize| rows.iter().map(|r| r[i] as u8).collect();
            Colors::U8 {
                r: channel(idx[0]),
                g: channel(idx[1]),
                b: channel(idx[2]),
            }
        } else {
            let channel = |i: usize| rows.iter().map(|r| r[i] as f32).collect();
            Colors::F32 {
                r: channel(idx[0]),
                g: channel(idx[1]),
                b: channel(idx[2]),
            }
        };
        cloud = cloud.with_colors(colors);
    }

    log::debug!(
        "read {} vertices from {} ({:?}, position {})",
        cloud.len(),
        path.as_ref().display(),
        header.encoding,
        position_type.name()
    );

    Ok((
        cloud,
        PlySchema {
            encoding: header.encoding,
            position: position_type,
            normal: normal_type,
            color: color_type,
        },
    ))
}

fn write_scalar(w: &mut impl io::Write, encoding: PlyEncoding, ty: ScalarType, v: f64) -> io::Result<()> {
    match (encoding, ty) {
        (PlyEncoding::Ascii, ScalarType::Double) => write!(w, "{}", v),
        (PlyEncoding::Ascii, ScalarType::Uchar) => write!(w, "{}", v as u8),
        (PlyEncoding::Ascii, _) => write!(w, "{}", v as f32),
        (PlyEncoding::BinaryLittleEndian, ScalarType::Double) => w.write_all(&v.to_le_bytes()),
        (PlyEncoding::BinaryLittleEndian, ScalarType::Uchar) => w.write_all(&[v as u8]),
        (PlyEncoding::BinaryLittleEndian, _) => w.write_all(&(v as f32).to_le_bytes()),
    }
}

/// Write `cloud` as PLY using the field types and encoding in `schema`.
///
/// Positions and normals use the schema's type (`float` or `double`; integer
/// types fall back to `float`). Colors are written in the cloud's own
/// representation so `uchar` and `float` values survive unchanged.
pub fn write_ply(path: impl AsRef<Path>, cloud: &PointCloud, schema: &PlySchema) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);

    let position = float_scalar(schema.position);
    let normal = float_scalar(schema.normal.unwrap_or(ScalarType::Float));
    let color = cloud.colors.as_ref().map(|c| color_scalar(c.kind()));

    w.write_all(b"ply\n")?;
    match schema.encoding {
        PlyEncoding::Ascii => w.write_all(b"format ascii 1.0\n")?,
        PlyEncoding::BinaryLittleEndian => w.write_all(b"format binary_little_endian 1.0\n")?,
    }
    writeln!(w, "element vertex {}", cloud.len())?;
    for name in ["x", "y", "z"] {
        writeln!(w, "property {} {}", position.name(), name)?;
    }
    if cloud.normals.is_some() {
        for name in ["nx", "ny", "nz"] {
            writeln!(w, "property {} {}", normal.name(), name)?;
        }
    }
    if let Some(color) = color {
        for name in ["red", "green", "blue"] {
            writeln!(w, "property {} {}", color.name(), name)?;
        }
    }
    w.write_all(b"end_header\n")?;

    let enc = schema.encoding;
    let sep = |w: &mut BufWriter<fs::File>| -> io::Result<()> {
        if enc == PlyEncoding::Ascii {
            w.write_all(b" ")?;
        }
        Ok(())
    };

    for i in 0..cloud.len() {
        let mut values: Vec<(ScalarType, f64)> = Vec::with_capacity(9);
        for v in cloud.point(i) {
            values.push((position, v));
        }
        if let Some(normals) = &cloud.normals {
            for v in normals.get(i) {
                values.push((normal, v));
            }
        }
        if let (Some(colors), Some(color)) = (&cloud.colors, color) {
            for v in colors.rgb(i) {
                values.push((color, v));
            }
        }

        for (k, (ty, v)) in values.into_iter().enumerate() {
            if k > 0 {
                sep(&mut w)?;
            }
            write_scalar(&mut w, enc, ty, v)?;
        }
        if enc == PlyEncoding::Ascii {
            w.write_all(b"\n")?;
        }
    }

    w.flush()
}
