// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! STL ingestion and serialization

use crate::brush::Brush;
use crate::geometry::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty mesh: no triangles found")]
    EmptyMesh,
    #[error("Mesh has no UV attribute")]
    MissingUvs,
    #[error("Malformed {attribute} buffer: {len} values, expected {expected}")]
    MalformedBuffer {
        attribute: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("Non-finite coordinate in triangle {triangle}")]
    NonFinite { triangle: usize },
}

/// Triangle data as produced by a parser, before it becomes a [`Mesh`].
///
/// Buffers are flat and non-indexed: every three vertices form a triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    /// 3 floats per vertex
    pub positions: Vec<f32>,
    /// 3 floats per vertex
    pub normals: Vec<f32>,
    /// 2 floats per vertex, when the source format carries texture coordinates
    pub uvs: Option<Vec<f32>>,
}

impl RawMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    /// Synthesize a zero-filled UV buffer when none is present.
    /// Returns true if one was added.
    pub fn ensure_uvs(&mut self) -> bool {
        if self.uvs.is_some() {
            return false;
        }
        self.uvs = Some(vec![0.0; 2 * self.vertex_count()]);
        true
    }

    /// Convert into a [`Mesh`]. UVs must be present.
    pub fn into_mesh(self) -> Result<Mesh, IngestError> {
        let vertex_count = self.vertex_count();
        if self.positions.len() % 9 != 0 {
            return Err(IngestError::MalformedBuffer {
                attribute: "position",
                len: self.positions.len(),
                expected: self.positions.len() - self.positions.len() % 9,
            });
        }
        if self.normals.len() != self.positions.len() {
            return Err(IngestError::MalformedBuffer {
                attribute: "normal",
                len: self.normals.len(),
                expected: self.positions.len(),
            });
        }
        if let Some(index) = self.positions.iter().position(|c| !c.is_finite()) {
            return Err(IngestError::NonFinite {
                triangle: index / 9,
            });
        }
        let uvs = self.uvs.ok_or(IngestError::MissingUvs)?;
        if uvs.len() != 2 * vertex_count {
            return Err(IngestError::MalformedBuffer {
                attribute: "uv",
                len: uvs.len(),
                expected: 2 * vertex_count,
            });
        }

        let mut mesh = Mesh::with_capacity(vertex_count, vertex_count / 3);
        for ((p, n), uv) in self
            .positions
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
            .zip(uvs.chunks_exact(2))
        {
            mesh.add_vertex(Vertex::with_uv(
                Point3::new(p[0] as f64, p[1] as f64, p[2] as f64),
                Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64),
                Vector2::new(uv[0] as f64, uv[1] as f64),
            ));
        }
        for first in (0..vertex_count).step_by(3) {
            mesh.add_triangle(Triangle::new([first, first + 1, first + 2]));
        }

        Ok(mesh)
    }
}

/// Parses raw file contents into triangle data
pub trait GeometryIngestion {
    fn parse(&self, bytes: &[u8]) -> Result<RawMesh, IngestError>;
}

/// Binary and ASCII STL parser
#[derive(Debug, Clone, Copy, Default)]
pub struct StlIngestion;

impl GeometryIngestion for StlIngestion {
    fn parse(&self, bytes: &[u8]) -> Result<RawMesh, IngestError> {
        let mut reader = Cursor::new(bytes);
        let stl = stl_io::read_stl(&mut reader).map_err(|e| IngestError::Parse(e.to_string()))?;

        if stl.faces.is_empty() {
            return Err(IngestError::EmptyMesh);
        }

        let mut raw = RawMesh {
            positions: Vec::with_capacity(stl.faces.len() * 9),
            normals: Vec::with_capacity(stl.faces.len() * 9),
            uvs: None,
        };

        for face in &stl.faces {
            for &index in &face.vertices {
                let vertex = stl.vertices[index];
                raw.positions.extend_from_slice(&[vertex[0], vertex[1], vertex[2]]);
                raw.normals
                    .extend_from_slice(&[face.normal[0], face.normal[1], face.normal[2]]);
            }
        }

        debug!(triangles = raw.triangle_count(), "parsed STL");
        Ok(raw)
    }
}

/// Parse, complete missing UVs and build a [`Mesh`]
pub fn ingest(ingestion: &dyn GeometryIngestion, bytes: &[u8]) -> Result<Mesh, IngestError> {
    let mut raw = ingestion.parse(bytes)?;
    if raw.ensure_uvs() {
        debug!(vertices = raw.vertex_count(), "synthesized zero UVs");
    }
    raw.into_mesh()
}

/// STL flavour written by [`StlSerializer`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlEncoding {
    #[default]
    Binary,
    Ascii,
}

/// Encodes a brush's mesh into file contents
pub trait MeshSerializer {
    fn serialize(&self, brush: &Brush) -> std::io::Result<Vec<u8>>;

    /// File extension, without the dot
    fn extension(&self) -> &'static str {
        "stl"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StlSerializer {
    pub encoding: StlEncoding,
}

impl StlSerializer {
    pub fn new(encoding: StlEncoding) -> Self {
        Self { encoding }
    }

    pub fn binary() -> Self {
        Self::new(StlEncoding::Binary)
    }
}

impl MeshSerializer for StlSerializer {
    fn serialize(&self, brush: &Brush) -> std::io::Result<Vec<u8>> {
        match self.encoding {
            StlEncoding::Binary => write_stl_binary(brush.mesh()),
            StlEncoding::Ascii => write_stl_ascii(brush.mesh()),
        }
    }
}

fn write_stl_binary(mesh: &Mesh) -> std::io::Result<Vec<u8>> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let to_stl = |p: &Point3<f64>| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]);

    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let [v0, v1, v2] = mesh.corners(tri);
            let normal = mesh.face_normal(tri);

            StlTriangle {
                normal: Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: [to_stl(&v0.position), to_stl(&v1.position), to_stl(&v2.position)],
            }
        })
        .collect();

    let mut bytes = Vec::with_capacity(84 + 50 * triangles.len());
    stl_io::write_stl(&mut bytes, triangles.iter())?;
    Ok(bytes)
}

fn write_stl_ascii(mesh: &Mesh) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();

    writeln!(out, "solid mesh")?;

    for tri in &mesh.triangles {
        let normal = mesh.face_normal(tri);
        writeln!(out, "  facet normal {} {} {}", normal.x, normal.y, normal.z)?;
        writeln!(out, "    outer loop")?;
        for v in mesh.corners(tri) {
            writeln!(
                out,
                "      vertex {} {} {}",
                v.position.x, v.position.y, v.position.z
            )?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }

    writeln!(out, "endsolid mesh")?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::Material;
    use crate::geometry::Primitive;

    fn cube_brush() -> Brush {
        Brush::new(
            Primitive::cube(Vector3::new(10.0, 10.0, 10.0), false).to_mesh(),
            Material::new(0xffffff),
        )
    }

    #[test]
    fn test_binary_layout() {
        let bytes = StlSerializer::binary().serialize(&cube_brush()).unwrap();
        assert_eq!(bytes.len(), 84 + 12 * 50);
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 12);
    }

    #[test]
    fn test_binary_reingests() {
        let bytes = StlSerializer::binary().serialize(&cube_brush()).unwrap();
        let mesh = ingest(&StlIngestion, &bytes).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_ascii_reingests() {
        let bytes = StlSerializer::new(StlEncoding::Ascii)
            .serialize(&cube_brush())
            .unwrap();
        assert!(bytes.starts_with(b"solid mesh"));
        let mesh = ingest(&StlIngestion, &bytes).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_stl_has_no_uvs_until_completed() {
        let bytes = StlSerializer::binary().serialize(&cube_brush()).unwrap();
        let mut raw = StlIngestion.parse(&bytes).unwrap();
        assert!(raw.uvs.is_none());
        assert!(matches!(raw.clone().into_mesh(), Err(IngestError::MissingUvs)));

        assert!(raw.ensure_uvs());
        assert_eq!(raw.uvs.as_ref().map(Vec::len), Some(2 * raw.vertex_count()));
        assert!(raw.uvs.as_ref().unwrap().iter().all(|&uv| uv == 0.0));
        assert!(!raw.ensure_uvs());
    }

    #[test]
    fn test_existing_uvs_are_kept() {
        let mut raw = RawMesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            uvs: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
        };
        assert!(!raw.ensure_uvs());
        let mesh = raw.into_mesh().unwrap();
        assert_eq!(mesh.vertices[1].uv, Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_truncated_input_is_a_parse_error() {
        assert!(matches!(
            StlIngestion.parse(b"not an stl"),
            Err(IngestError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_facets_is_empty_mesh() {
        let mut bytes = vec![0u8; 80];
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            StlIngestion.parse(&bytes),
            Err(IngestError::EmptyMesh)
        ));
    }

    #[test]
    fn test_non_finite_position_is_rejected() {
        let mut bytes = StlSerializer::binary().serialize(&cube_brush()).unwrap();
        // first vertex of the second facet
        bytes[146..150].copy_from_slice(&f32::NAN.to_le_bytes());
        assert!(matches!(
            ingest(&StlIngestion, &bytes),
            Err(IngestError::NonFinite { triangle: 1 })
        ));

        let raw = RawMesh {
            positions: vec![0.0, 0.0, 0.0, f32::INFINITY, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0; 9],
            uvs: Some(vec![0.0; 6]),
        };
        assert!(matches!(
            raw.into_mesh(),
            Err(IngestError::NonFinite { triangle: 0 })
        ));
    }

    #[test]
    fn test_malformed_uv_buffer() {
        let raw = RawMesh {
            positions: vec![0.0; 9],
            normals: vec![0.0; 9],
            uvs: Some(vec![0.0; 4]),
        };
        assert!(matches!(
            raw.into_mesh(),
            Err(IngestError::MalformedBuffer { attribute: "uv", len: 4, expected: 6 })
        ));
    }
}
