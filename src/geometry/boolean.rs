// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Boolean operations on triangle meshes

use super::csg::{csg_difference, csg_intersection, csg_union};
use super::Mesh;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BooleanOp::Union => "union",
            BooleanOp::Difference => "difference",
            BooleanOp::Intersection => "intersection",
        };
        f.write_str(name)
    }
}

/// Perform boolean operation between two meshes
pub fn perform_boolean_operation(mesh_a: &Mesh, mesh_b: &Mesh, op: BooleanOp) -> Mesh {
    match op {
        BooleanOp::Union => csg_union(mesh_a, mesh_b),
        BooleanOp::Difference => csg_difference(mesh_a, mesh_b),
        BooleanOp::Intersection => csg_intersection(mesh_a, mesh_b),
    }
}

impl Mesh {
    /// Perform boolean operation with another mesh
    pub fn boolean_operation(&self, other: &Mesh, op: BooleanOp) -> Mesh {
        perform_boolean_operation(self, other, op)
    }

    /// True when every vertex coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .all(|v| v.position.coords.iter().all(|c| c.is_finite()))
    }
}
