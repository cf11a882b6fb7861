// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Geometric primitives generator
//!
//! All generators produce closed, outward-wound meshes so they can be fed
//! straight into the boolean evaluator.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector2, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, segments: u32 },
    Cylinder { h: f64, r: f64, segments: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn sphere(r: f64, segments: u32) -> Self {
        Self::Sphere {
            r,
            segments: Self::segments_or_default(segments),
        }
    }

    pub fn cylinder(h: f64, r: f64, segments: u32) -> Self {
        Self::Cylinder {
            h,
            r,
            segments: Self::segments_or_default(segments),
        }
    }

    fn segments_or_default(segments: u32) -> u32 {
        if segments >= 3 {
            segments
        } else {
            32
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, segments } => generate_sphere_mesh(*r, *segments),
            Self::Cylinder { h, r, segments } => generate_cylinder_mesh(*h, *r, *segments),
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::with_capacity(36, 12);

    let min = if center {
        Point3::from(-size / 2.0)
    } else {
        Point3::origin()
    };
    let max = min + size;

    // 8 vertices of the cube
    let positions = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    // 6 faces, each with its normal
    let faces = [
        // Front (z+)
        ([4, 5, 6], Vector3::new(0.0, 0.0, 1.0)),
        ([4, 6, 7], Vector3::new(0.0, 0.0, 1.0)),
        // Back (z-)
        ([1, 0, 3], Vector3::new(0.0, 0.0, -1.0)),
        ([1, 3, 2], Vector3::new(0.0, 0.0, -1.0)),
        // Right (x+)
        ([5, 1, 2], Vector3::new(1.0, 0.0, 0.0)),
        ([5, 2, 6], Vector3::new(1.0, 0.0, 0.0)),
        // Left (x-)
        ([0, 4, 7], Vector3::new(-1.0, 0.0, 0.0)),
        ([0, 7, 3], Vector3::new(-1.0, 0.0, 0.0)),
        // Top (y+)
        ([7, 6, 2], Vector3::new(0.0, 1.0, 0.0)),
        ([7, 2, 3], Vector3::new(0.0, 1.0, 0.0)),
        // Bottom (y-)
        ([0, 1, 5], Vector3::new(0.0, -1.0, 0.0)),
        ([0, 5, 4], Vector3::new(0.0, -1.0, 0.0)),
    ];

    for (indices, normal) in faces {
        let v0 = mesh.add_vertex(Vertex::new(positions[indices[0]], normal));
        let v1 = mesh.add_vertex(Vertex::new(positions[indices[1]], normal));
        let v2 = mesh.add_vertex(Vertex::new(positions[indices[2]], normal));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }

    mesh
}

fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    let stacks = segments as usize;
    let slices = segments as usize;

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            let x = r * theta.cos();
            let z = r * theta.sin();

            let position = Point3::new(x, y, z);
            let normal = Vector3::new(x, y, z).normalize();
            let uv = Vector2::new(j as f64 / slices as f64, i as f64 / stacks as f64);
            mesh.add_vertex(Vertex::with_uv(position, normal, uv));
        }
    }

    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;

            // Pole rows collapse one of the two triangles to a point
            if i != 0 {
                mesh.add_triangle(Triangle::new([first, first + 1, second]));
            }
            if i != stacks - 1 {
                mesh.add_triangle(Triangle::new([second, first + 1, second + 1]));
            }
        }
    }

    mesh
}

fn generate_cylinder_mesh(height: f64, radius: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    let segments = segments as usize;

    let bottom_center = mesh.add_vertex(Vertex::new(
        Point3::new(0.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, -1.0),
    ));
    let top_center = mesh.add_vertex(Vertex::new(
        Point3::new(0.0, 0.0, height),
        Vector3::new(0.0, 0.0, 1.0),
    ));

    let mut bottom = Vec::with_capacity(segments);
    let mut top = Vec::with_capacity(segments);

    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        let radial = Vector3::new(cos, sin, 0.0);

        bottom.push(mesh.add_vertex(Vertex::new(
            Point3::new(radius * cos, radius * sin, 0.0),
            radial,
        )));
        top.push(mesh.add_vertex(Vertex::new(
            Point3::new(radius * cos, radius * sin, height),
            radial,
        )));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;

        mesh.add_triangle(Triangle::new([bottom_center, bottom[next], bottom[i]]));
        mesh.add_triangle(Triangle::new([top_center, top[i], top[next]]));

        mesh.add_triangle(Triangle::new([bottom[i], bottom[next], top[i]]));
        mesh.add_triangle(Triangle::new([top[i], bottom[next], top[next]]));
    }

    mesh
}
