// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Scripted sessions: a list of steps replayed against a controller

use super::reporter::{Reporter, SessionReport};
use crate::brush::BooleanEvaluator;
use crate::controller::{Control, Controller, ControllerError, Notifier, Pressed};
use crate::session::Outcome;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Press an operation control, then load `file` for it
    Load { control: Control, file: PathBuf },
    Save,
    Cancel,
    Status,
}

impl Step {
    /// Build a step from a verb and its optional argument
    pub fn from_parts(verb: &str, arg: Option<&str>) -> Result<Self, String> {
        let control: Control = match verb.to_ascii_lowercase().as_str() {
            "cancel" => return Self::no_arg(Step::Cancel, verb, arg),
            "status" => return Self::no_arg(Step::Status, verb, arg),
            other => other.parse()?,
        };

        match (control, arg) {
            (Control::Save, _) => Self::no_arg(Step::Save, verb, arg),
            (control, Some(file)) if !file.is_empty() => Ok(Step::Load {
                control,
                file: PathBuf::from(file),
            }),
            (control, _) => Err(format!("'{}' needs a file, e.g. {}:part.stl", control, control)),
        }
    }

    fn no_arg(step: Step, verb: &str, arg: Option<&str>) -> Result<Self, String> {
        match arg {
            None => Ok(step),
            Some(_) => Err(format!("'{}' takes no file", verb)),
        }
    }
}

impl FromStr for Step {
    type Err = String;

    /// `add:FILE`, `subtract:FILE`, `intersect:FILE`, `cut:FILE`, `save`,
    /// `cancel`, `status`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((verb, file)) => Self::from_parts(verb, Some(file)),
            None => Self::from_parts(s, None),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Load { control, file } => write!(f, "{}:{}", control, file.display()),
            Step::Save => f.write_str("save"),
            Step::Cancel => f.write_str("cancel"),
            Step::Status => f.write_str("status"),
        }
    }
}

/// What a step did
#[derive(Debug, Clone)]
pub enum StepReport {
    Loaded { file: String, outcome: Option<Outcome> },
    Saved(Vec<PathBuf>),
    Cancelled,
    Status(SessionReport),
}

/// Press `control` and feed it the contents of `file`, like a user picking
/// the file in a dialog
pub fn load_file<N: Notifier, E: BooleanEvaluator>(
    controller: &mut Controller<N, E>,
    control: Control,
    file: &Path,
) -> Result<Option<Outcome>, ControllerError> {
    controller.press(control)?;
    deliver_file(controller, file)
}

/// Hand the contents of `file` to a controller that is awaiting one
pub fn deliver_file<N: Notifier, E: BooleanEvaluator>(
    controller: &mut Controller<N, E>,
    file: &Path,
) -> Result<Option<Outcome>, ControllerError> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    match std::fs::read(file) {
        Ok(bytes) => controller.file_loaded(&name, &bytes),
        Err(err) => {
            debug!(file = %file.display(), %err, "file unreadable");
            controller.load_failed(&name);
            Err(ControllerError::Load {
                name,
                reason: err.to_string(),
            })
        }
    }
}

/// Run one step, printing its result
pub fn execute<N: Notifier, E: BooleanEvaluator>(
    controller: &mut Controller<N, E>,
    step: &Step,
) -> Result<StepReport, ControllerError> {
    debug!(%step, "executing step");
    let report = match step {
        Step::Load { control, file } => {
            let start = Instant::now();
            let outcome = load_file(controller, *control, file)?;
            let name = file.display().to_string();
            if let Some(outcome) = &outcome {
                Reporter::report_outcome(&name, outcome, start.elapsed());
            }
            StepReport::Loaded { file: name, outcome }
        }
        Step::Save => match controller.press(Control::Save)? {
            Pressed::Saved(paths) => {
                Reporter::report_saved(&paths);
                StepReport::Saved(paths)
            }
            Pressed::AwaitingFile(_) => StepReport::Saved(Vec::new()),
        },
        Step::Cancel => {
            controller.dialog_cancelled();
            StepReport::Cancelled
        }
        Step::Status => {
            let report = SessionReport::capture(controller.session(), &controller.controls());
            Reporter::report_status(&report);
            StepReport::Status(report)
        }
    };
    Ok(report)
}

/// Run all steps in order. Stops at the first failure unless `keep_going`,
/// and returns the number of failed steps.
pub fn run_steps<N: Notifier, E: BooleanEvaluator>(
    controller: &mut Controller<N, E>,
    steps: &[Step],
    keep_going: bool,
) -> Result<usize, ControllerError> {
    let mut failures = 0;
    for step in steps {
        if let Err(err) = execute(controller, step) {
            if !keep_going {
                return Err(err);
            }
            if !err.is_notified() {
                Reporter::report_warning(&format!("step '{}' failed: {}", step, err));
            }
            failures += 1;
        }
    }
    Ok(failures)
}
