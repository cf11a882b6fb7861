// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Brushes: solids made of a shared triangle mesh and a material tag,
//! and the boolean evaluator that combines them.

use crate::geometry::{perform_boolean_operation, BooleanOp, Mesh};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Material tag: a 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Material {
    pub color: u32,
}

impl Material {
    pub const MAX_COLOR: u32 = 0xFF_FF_FF;

    pub fn new(color: u32) -> Self {
        Self {
            color: color & Self::MAX_COLOR,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.color)
    }
}

/// Source of fresh material tags
#[derive(Debug, Clone)]
pub struct Palette {
    rng: StdRng,
}

impl Palette {
    /// Reproducible palette, for scripted sessions and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn next_material(&mut self) -> Material {
        Material::new(self.rng.gen_range(0..=Material::MAX_COLOR))
    }

    /// A fresh material guaranteed to differ from `avoid`
    pub fn next_material_excluding(&mut self, avoid: Material) -> Material {
        loop {
            let material = self.next_material();
            if material != avoid {
                return material;
            }
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// A solid operated on by the boolean evaluator.
///
/// The mesh is shared and never mutated; only the material may be reassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    mesh: Arc<Mesh>,
    material: Material,
}

impl Brush {
    pub fn new(mesh: Mesh, material: Material) -> Self {
        Self {
            mesh: Arc::new(mesh),
            material,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("{operand} brush contains non-finite vertex coordinates")]
    NonFiniteInput { operand: &'static str },
}

/// Computes the solid resulting from a boolean operation on two brushes.
///
/// Implementations must be pure: the same inputs always give the same result.
pub trait BooleanEvaluator {
    fn evaluate(&self, a: &Brush, b: &Brush, op: BooleanOp) -> Result<Brush, EvaluationError>;
}

/// BSP-tree evaluator. The result carries the material of the left operand.
#[derive(Debug, Clone, Copy, Default)]
pub struct BspEvaluator;

impl BooleanEvaluator for BspEvaluator {
    fn evaluate(&self, a: &Brush, b: &Brush, op: BooleanOp) -> Result<Brush, EvaluationError> {
        if !a.mesh().is_finite() {
            return Err(EvaluationError::NonFiniteInput { operand: "left" });
        }
        if !b.mesh().is_finite() {
            return Err(EvaluationError::NonFiniteInput { operand: "right" });
        }

        let start = Instant::now();
        let mesh = perform_boolean_operation(a.mesh(), b.mesh(), op);
        debug!(
            %op,
            left = a.mesh().triangle_count(),
            right = b.mesh().triangle_count(),
            result = mesh.triangle_count(),
            elapsed = ?start.elapsed(),
            "boolean evaluation finished"
        );

        Ok(Brush::new(mesh, a.material()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[test]
    fn test_seeded_palette_is_reproducible() {
        let mut first = Palette::seeded(7);
        let mut second = Palette::seeded(7);
        for _ in 0..8 {
            assert_eq!(first.next_material(), second.next_material());
        }
    }

    #[test]
    fn test_next_material_excluding() {
        let mut palette = Palette::seeded(1);
        let avoid = palette.clone().next_material();
        assert_ne!(palette.next_material_excluding(avoid), avoid);
    }

    #[test]
    fn test_material_display() {
        assert_eq!(Material::new(0x0a0b0c).to_string(), "#0a0b0c");
        assert_eq!(Material::new(0x1_000_000).color, 0);
    }

    #[test]
    fn test_evaluator_keeps_left_material() {
        let cube = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), false).to_mesh();
        let a = Brush::new(cube.clone(), Material::new(0x112233));
        let b = Brush::new(cube, Material::new(0x445566));

        let result = BspEvaluator.evaluate(&a, &b, BooleanOp::Union).unwrap();
        assert_eq!(result.material(), a.material());
    }

    #[test]
    fn test_evaluator_rejects_non_finite_input() {
        let mut broken = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        broken.vertices[2].position.z = f64::INFINITY;
        let a = Brush::new(broken, Material::new(0));
        let b = Brush::new(Mesh::empty(), Material::new(1));

        assert_eq!(
            BspEvaluator.evaluate(&a, &b, BooleanOp::Difference),
            Err(EvaluationError::NonFiniteInput { operand: "left" })
        );
    }
}
