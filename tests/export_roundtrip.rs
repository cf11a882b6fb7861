// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Round-trip export/import tests

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Vector3;
use tempfile::NamedTempFile;
use yombool::geometry::analytics::{signed_volume, surface_area};
use yombool::geometry::Primitive;
use yombool::io::{ingest, MeshSerializer, StlEncoding, StlIngestion, StlSerializer};
use yombool::{Brush, Material};

fn roundtrip(encoding: StlEncoding, brush: &Brush) -> Result<yombool::Mesh> {
    let file = NamedTempFile::with_suffix(".stl")?;
    let bytes = StlSerializer::new(encoding).serialize(brush)?;
    std::fs::write(file.path(), &bytes)?;

    let read_back = std::fs::read(file.path())?;
    Ok(ingest(&StlIngestion, &read_back)?)
}

#[test]
fn test_binary_roundtrip_keeps_triangles() -> Result<()> {
    let brush = Brush::new(Primitive::sphere(5.0, 24).to_mesh(), Material::new(0x3366cc));
    let mesh = roundtrip(StlEncoding::Binary, &brush)?;

    assert_eq!(mesh.triangle_count(), brush.mesh().triangle_count());
    assert_relative_eq!(
        signed_volume(&mesh),
        signed_volume(brush.mesh()),
        max_relative = 1e-5
    );
    Ok(())
}

#[test]
fn test_ascii_roundtrip_keeps_triangles() -> Result<()> {
    let brush = Brush::new(
        Primitive::cylinder(8.0, 3.0, 20).to_mesh(),
        Material::new(0xff8800),
    );
    let mesh = roundtrip(StlEncoding::Ascii, &brush)?;

    assert_eq!(mesh.triangle_count(), brush.mesh().triangle_count());
    assert_relative_eq!(
        surface_area(&mesh),
        surface_area(brush.mesh()),
        max_relative = 1e-5
    );
    Ok(())
}

#[test]
fn test_reingested_mesh_has_uvs_and_normals() -> Result<()> {
    let brush = Brush::new(
        Primitive::cube(Vector3::new(4.0, 4.0, 4.0), true).to_mesh(),
        Material::new(0),
    );
    let mesh = roundtrip(StlEncoding::Binary, &brush)?;

    assert!(mesh.vertices.iter().all(|v| v.uv.x == 0.0 && v.uv.y == 0.0));
    assert!(mesh
        .vertices
        .iter()
        .all(|v| (v.normal.norm() - 1.0).abs() < 1e-5));
    Ok(())
}
