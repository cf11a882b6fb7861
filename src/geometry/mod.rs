// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Geometry module - mesh representation and operations

pub mod analytics;
mod bbox;
mod boolean;
mod csg;
mod mesh;
mod primitives;

pub use analytics::{analyze, GeometryStats};
pub use bbox::BoundingBox;
pub use boolean::{perform_boolean_operation, BooleanOp};
pub use csg::{csg_difference, csg_intersection, csg_union};
pub use mesh::{Mesh, Triangle, Vertex};
pub use primitives::Primitive;
