// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Yombool
//!
//! Builds a solid by loading meshes one after another and combining each
//! with the current solid through union, subtraction or intersection. A cut
//! splits the current solid into two pieces exported as separate files.

pub mod brush;
pub mod cli;
pub mod config;
pub mod controller;
pub mod export;
pub mod geometry;
pub mod io;
pub mod session;

pub use brush::{BooleanEvaluator, Brush, BspEvaluator, Material, Palette};
pub use config::AppConfig;
pub use controller::{Control, ControlPanel, Controller, Notifier};
pub use export::{ExportAssembler, ExportedFile};
pub use geometry::{BooleanOp, Mesh, Primitive};
pub use session::{Operation, Outcome, Session, SessionError, SessionState};
