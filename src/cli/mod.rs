// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Terminal front end: scripted runs, interactive shell and reporting

pub mod reporter;
pub mod script;
pub mod shell;

pub use reporter::{Reporter, SessionReport, TerminalNotifier};
pub use script::{execute, run_steps, Step, StepReport};
pub use shell::Shell;

use crate::brush::{BspEvaluator, Palette};
use crate::config::AppConfig;
use crate::controller::{Controller, Notifier};
use crate::export::ExportAssembler;
use crate::io::{DirectorySink, StlIngestion, StlSerializer};
use crate::session::Session;

/// Controller wired to STL files and the configured output directory
pub fn controller_from_config<N: Notifier>(config: &AppConfig, notifier: N) -> Controller<N> {
    let palette = config.color_seed.map(Palette::seeded).unwrap_or_default();

    Controller::new(
        Session::with_evaluator(BspEvaluator, palette),
        Box::new(StlIngestion),
        Box::new(StlSerializer::new(config.encoding)),
        ExportAssembler::new(config.output_stem.clone()),
        Box::new(DirectorySink::new(config.output_dir.clone())),
        notifier,
    )
}
