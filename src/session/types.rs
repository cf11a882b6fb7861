// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Session value types

use crate::geometry::BooleanOp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation requested by the user for the next loaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Intersect,
}

impl From<Operation> for BooleanOp {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Add => BooleanOp::Union,
            Operation::Subtract => BooleanOp::Difference,
            Operation::Intersect => BooleanOp::Intersection,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Intersect => "intersect",
        };
        f.write_str(name)
    }
}

/// Operation captured between choosing an action and a file arriving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub operation: Operation,
    /// Only ever set together with [`Operation::Subtract`]
    pub cut: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No mesh loaded yet
    Empty,
    /// A current solid exists; `cut_piece` is set while a cut-off piece is held
    Populated { cut_piece: bool },
}

/// Signal for the controls after a session call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSignal {
    /// Subtract, intersect, cut and save may be enabled
    pub primary_enabled: bool,
    /// Play the completion cue and confirm to the user
    pub notify_completion: bool,
}

/// What a successful geometry submission did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// First mesh adopted as the current solid, no evaluation
    Seeded,
    /// Boolean operation applied to the current solid
    Applied(Operation),
    /// Current solid split into remainder and cut-off piece
    Cut,
}

impl Outcome {
    pub fn signal(&self) -> ControlSignal {
        ControlSignal {
            primary_enabled: true,
            notify_completion: !matches!(self, Outcome::Seeded),
        }
    }
}
