// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Mesh representation and utilities

use super::BoundingBox;
use nalgebra::{Matrix4, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
    pub uv: Vector2<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal,
            uv: Vector2::zeros(),
        }
    }

    pub fn with_uv(position: Point3<f64>, normal: Vector3<f64>, uv: Vector2<f64>) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Linear interpolation of every attribute towards `other`
    pub fn interpolate(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal.lerp(&other.normal, t),
            uv: self.uv.lerp(&other.uv, t),
        }
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        // Transform normal (use inverse transpose for normals)
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        self.normal = normal_matrix
            .transform_vector(&self.normal)
            .try_normalize(f64::EPSILON)
            .unwrap_or(self.normal);
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangular mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    /// Translate all vertices by an offset
    pub fn translate(&mut self, offset: Vector3<f64>) {
        self.transform(&Matrix4::new_translation(&offset));
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The three corner vertices of a triangle
    pub fn corners(&self, triangle: &Triangle) -> [&Vertex; 3] {
        [
            &self.vertices[triangle.indices[0]],
            &self.vertices[triangle.indices[1]],
            &self.vertices[triangle.indices[2]],
        ]
    }

    /// Unit normal of a triangle from its winding, or zero for degenerate faces
    pub fn face_normal(&self, triangle: &Triangle) -> Vector3<f64> {
        let [a, b, c] = self.corners(triangle);
        (b.position - a.position)
            .cross(&(c.position - a.position))
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let a = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, 0.0), normal));
        let b = mesh.add_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0), normal));
        let c = mesh.add_vertex(Vertex::new(Point3::new(0.0, 1.0, 0.0), normal));
        mesh.add_triangle(Triangle::new([a, b, c]));
        mesh
    }

    #[test]
    fn test_face_normal_follows_winding() {
        let mesh = single_triangle();
        let normal = mesh.face_normal(&mesh.triangles[0]);
        assert_relative_eq!(normal, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_interpolate_all_attributes() {
        let a = Vertex::with_uv(Point3::origin(), Vector3::x(), Vector2::new(0.0, 0.0));
        let b = Vertex::with_uv(Point3::new(2.0, 0.0, 0.0), Vector3::x(), Vector2::new(1.0, 1.0));

        let mid = a.interpolate(&b, 0.5);
        assert_relative_eq!(mid.position, Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(mid.uv, Vector2::new(0.5, 0.5));
    }

    #[test]
    fn test_translate_moves_bounding_box() {
        let mut mesh = single_triangle();
        mesh.translate(Vector3::new(5.0, 0.0, 0.0));
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.min.x, 5.0);
        assert_relative_eq!(bbox.max.x, 6.0);
    }
}
