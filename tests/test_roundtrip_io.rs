use pointprep_core::{Colors, Normals, PointCloud};
use pointprep_filters::{crop_box, CropBox};
use pointprep_io::{read_ply, write_ply, PlyEncoding, PlySchema, ScalarType};
use tempfile::TempDir;

fn colored_cloud() -> PointCloud {
    PointCloud::from_xyz(
        vec![1.0, 2.0, 3.0],
        vec![4.0, 5.0, 6.0],
        vec![7.0, 8.0, 9.0],
    )
    .with_normals(Normals {
        nx: vec![0.0, 0.6, 1.0],
        ny: vec![0.0, 0.8, 0.0],
        nz: vec![1.0, 0.0, 0.0],
    })
    .with_colors(Colors::U8 {
        r: vec![0, 128, 255],
        g: vec![10, 20, 30],
        b: vec![255, 254, 253],
    })
}

#[test]
fn ply_write_then_read_roundtrip_both_encodings() {
    let dir = TempDir::new().unwrap();
    let cloud = colored_cloud();

    for (name, encoding) in [
        ("ascii.ply", PlyEncoding::Ascii),
        ("binary.ply", PlyEncoding::BinaryLittleEndian),
    ] {
        let path = dir.path().join(name);
        let schema = PlySchema::for_cloud(&cloud).with_encoding(encoding);
        write_ply(&path, &cloud, &schema).unwrap();

        let (loaded, read_schema) = read_ply(&path).unwrap();
        assert_eq!(read_schema, schema, "{}", name);
        assert_eq!(loaded.x, cloud.x);
        assert_eq!(loaded.colors, cloud.colors);
        let normals = loaded.normals.as_ref().unwrap();
        for i in 0..cloud.len() {
            let expected = cloud.normals.as_ref().unwrap().get(i);
            let got = normals.get(i);
            for axis in 0..3 {
                // Normals are stored as float.
                assert!((got[axis] - expected[axis]).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn ply_empty_cloud_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.ply");
    let cloud = PointCloud::new();

    write_ply(&path, &cloud, &PlySchema::for_cloud(&cloud)).unwrap();
    let (loaded, _) = read_ply(&path).unwrap();
    assert_eq!(loaded.len(), 0);
}

#[test]
fn filtered_cloud_keeps_source_field_types() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.ply");
    let cloud = PointCloud::from_points(&[[0.5, 0.5, 0.5], [9.0, 9.0, 9.0]]).with_colors(
        Colors::F32 {
            r: vec![0.25, 0.5],
            g: vec![0.75, 1.0],
            b: vec![0.125, 0.0],
        },
    );
    let schema = PlySchema {
        encoding: PlyEncoding::Ascii,
        position: ScalarType::Float,
        normal: None,
        color: Some(ScalarType::Float),
    };
    write_ply(&source, &cloud, &schema).unwrap();

    let (loaded, loaded_schema) = read_ply(&source).unwrap();
    let cropped = crop_box(&loaded, &CropBox::from_min_max([0.0; 3], [1.0; 3])).unwrap();

    let target = dir.path().join("source_Boxrocess.ply");
    write_ply(&target, &cropped, &loaded_schema).unwrap();
    let (saved, saved_schema) = read_ply(&target).unwrap();

    assert_eq!(saved_schema, schema);
    assert_eq!(saved.point(0), [0.5, 0.5, 0.5]);
    assert_eq!(
        saved.colors,
        Some(Colors::F32 {
            r: vec![0.25],
            g: vec![0.75],
            b: vec![0.125],
        })
    );
}

#[test]
fn read_sample_ply_if_present() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = std::path::Path::new(manifest_dir).join("data/sample.ply");
    if path.exists() {
        let (cloud, _) = read_ply(&path).unwrap();
        assert!(!cloud.is_empty(), "sample.ply should have points");
    }
}
