// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Geometry analytics and statistics

use super::Mesh;
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Total volume in cubic units
    pub volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    pub vertex_count: usize,
    pub triangle_count: usize,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            vertex_count: 0,
            triangle_count: 0,
        }
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    if mesh.vertices.is_empty() || mesh.triangles.is_empty() {
        return GeometryStats::empty();
    }

    let bbox = mesh.bounding_box();

    GeometryStats {
        volume: signed_volume(mesh).abs(),
        surface_area: surface_area(mesh),
        bbox: [
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z,
        ],
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
    }
}

/// Signed volume from the divergence theorem; positive for outward winding
pub fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|tri| {
            let [a, b, c] = mesh.corners(tri);
            a.position.coords.dot(&b.position.coords.cross(&c.position.coords)) / 6.0
        })
        .sum()
}

/// Total surface area
pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|tri| {
            let [a, b, c] = mesh.corners(tri);
            (b.position - a.position)
                .cross(&(c.position - a.position))
                .norm()
                / 2.0
        })
        .sum()
}
