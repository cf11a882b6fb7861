// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Controller: the five user controls, their enablement, and the wiring
//! between a chosen action, the file that arrives for it and the session.

use crate::brush::{BooleanEvaluator, BspEvaluator};
use crate::export::{ExportAssembler, ExportError};
use crate::io::{ingest, FileSink, GeometryIngestion, IngestError, MeshSerializer};
use crate::session::{Operation, Outcome, PendingRequest, Session, SessionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Message shown after every successful operation except the first mesh
pub const COMPLETION_MESSAGE: &str = "Operation done.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Add,
    Subtract,
    Intersect,
    Cut,
    Save,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Add,
        Control::Subtract,
        Control::Intersect,
        Control::Cut,
        Control::Save,
    ];

    /// Session request issued by this control; `None` for save
    pub fn request(self) -> Option<(Operation, bool)> {
        match self {
            Control::Add => Some((Operation::Add, false)),
            Control::Subtract => Some((Operation::Subtract, false)),
            Control::Intersect => Some((Operation::Intersect, false)),
            Control::Cut => Some((Operation::Subtract, true)),
            Control::Save => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Control::Add => "add",
            Control::Subtract => "subtract",
            Control::Intersect => "intersect",
            Control::Cut => "cut",
            Control::Save => "save",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Control {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" | "union" => Ok(Control::Add),
            "subtract" | "sub" | "difference" => Ok(Control::Subtract),
            "intersect" | "intersection" => Ok(Control::Intersect),
            "cut" => Ok(Control::Cut),
            "save" | "export" => Ok(Control::Save),
            other => Err(format!("Unknown control: {}", other)),
        }
    }
}

/// Enabled flag per control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPanel {
    pub add: bool,
    pub subtract: bool,
    pub intersect: bool,
    pub cut: bool,
    pub save: bool,
}

impl ControlPanel {
    /// Panel of a fresh session: only add is available
    pub fn initial() -> Self {
        Self::for_solid(false)
    }

    /// Add is always on; the rest follow whether a current solid exists
    pub fn for_solid(has_solid: bool) -> Self {
        Self {
            add: true,
            subtract: has_solid,
            intersect: has_solid,
            cut: has_solid,
            save: has_solid,
        }
    }

    pub fn disabled() -> Self {
        Self {
            add: false,
            subtract: false,
            intersect: false,
            cut: false,
            save: false,
        }
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        match control {
            Control::Add => self.add,
            Control::Subtract => self.subtract,
            Control::Intersect => self.intersect,
            Control::Cut => self.cut,
            Control::Save => self.save,
        }
    }

    pub fn enabled(&self) -> Vec<Control> {
        Control::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::initial()
    }
}

/// User-facing feedback channel
pub trait Notifier {
    /// A non-seed operation finished: play the cue and confirm
    fn completion(&mut self);

    /// Blocking error message for the user
    fn error(&mut self, message: &str);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn completion(&mut self) {
        info!("{}", COMPLETION_MESSAGE);
    }

    fn error(&mut self, message: &str) {
        warn!("{}", message);
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("control '{0}' is disabled")]
    Disabled(Control),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Error loading file {name}: {reason}")]
    Load { name: String, reason: String },
    #[error("Error parsing file {name}: {source}")]
    Ingest {
        name: String,
        #[source]
        source: IngestError,
    },
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Failed to save {name}: {reason}")]
    Sink { name: String, reason: String },
}

impl ControllerError {
    /// True when the notifier already told the user about this failure
    pub fn is_notified(&self) -> bool {
        matches!(
            self,
            ControllerError::Load { .. }
                | ControllerError::Ingest { .. }
                | ControllerError::Sink { .. }
        )
    }
}

/// Result of pressing a control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pressed {
    /// An operation is pending; a file must be provided next
    AwaitingFile(PendingRequest),
    /// Export written; paths in save order
    Saved(Vec<PathBuf>),
}

/// Drives a [`Session`] the way a user interface would.
///
/// Pressing an operation control records the request and disables every
/// control until a file arrives or the file dialog is dismissed.
pub struct Controller<N: Notifier, E: BooleanEvaluator = BspEvaluator> {
    session: Session<E>,
    ingestion: Box<dyn GeometryIngestion>,
    serializer: Box<dyn MeshSerializer>,
    assembler: ExportAssembler,
    sink: Box<dyn FileSink>,
    notifier: N,
    panel: ControlPanel,
    panel_before_request: Option<ControlPanel>,
}

impl<N: Notifier, E: BooleanEvaluator> Controller<N, E> {
    pub fn new(
        session: Session<E>,
        ingestion: Box<dyn GeometryIngestion>,
        serializer: Box<dyn MeshSerializer>,
        assembler: ExportAssembler,
        sink: Box<dyn FileSink>,
        notifier: N,
    ) -> Self {
        let panel = ControlPanel::for_solid(session.is_populated());
        Self {
            session,
            ingestion,
            serializer,
            assembler,
            sink,
            notifier,
            panel,
            panel_before_request: None,
        }
    }

    pub fn controls(&self) -> ControlPanel {
        self.panel
    }

    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Press a control. Operation controls open the (virtual) file dialog;
    /// save exports the current solid(s) into the sink.
    pub fn press(&mut self, control: Control) -> Result<Pressed, ControllerError> {
        if !self.panel.is_enabled(control) {
            debug!(%control, "ignored press on disabled control");
            return Err(ControllerError::Disabled(control));
        }

        match control.request() {
            Some((operation, cut)) => {
                self.session.request_operation(operation, cut)?;
                self.panel_before_request = Some(self.panel);
                self.panel = ControlPanel::disabled();
                Ok(Pressed::AwaitingFile(PendingRequest { operation, cut }))
            }
            None => self.save().map(Pressed::Saved),
        }
    }

    /// The file dialog closed without a file
    pub fn dialog_cancelled(&mut self) {
        if let Some(request) = self.session.cancel_request() {
            debug!(?request, "file dialog dismissed");
        }
        self.restore_panel();
    }

    /// The chosen file could not be read at all
    pub fn load_failed(&mut self, name: &str) {
        self.session.cancel_request();
        self.restore_panel();
        self.notifier.error(&format!("Error loading file {}", name));
    }

    /// Contents of the chosen file arrived.
    ///
    /// Returns `Ok(None)` when nothing was waiting for a file.
    pub fn file_loaded(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<Option<Outcome>, ControllerError> {
        if self.session.pending().is_none() {
            debug!(file = name, "dropping file with no pending request");
            return Ok(None);
        }
        self.panel = ControlPanel::disabled();

        let mesh = match ingest(self.ingestion.as_ref(), bytes) {
            Ok(mesh) => mesh,
            Err(source) => {
                self.session.cancel_request();
                self.restore_panel();
                self.notifier.error(&format!("Error parsing file {}", name));
                return Err(ControllerError::Ingest {
                    name: name.to_string(),
                    source,
                });
            }
        };

        info!(
            file = name,
            triangles = mesh.triangle_count(),
            "geometry loaded"
        );
        let result = self.session.submit_geometry(mesh);
        self.panel_before_request = None;
        self.panel = ControlPanel::for_solid(self.session.is_populated());

        let outcome = result?;
        if outcome.signal().notify_completion {
            self.notifier.completion();
        }
        Ok(Some(outcome))
    }

    fn save(&mut self) -> Result<Vec<PathBuf>, ControllerError> {
        let files = self
            .assembler
            .export_current(&mut self.session, self.serializer.as_ref())?;

        let mut paths = Vec::with_capacity(files.len());
        for file in &files {
            match self.sink.save(&file.name, &file.bytes) {
                Ok(path) => paths.push(path),
                Err(err) => {
                    let reason = format!("{:#}", err);
                    warn!(file = %file.name, %reason, "save failed");
                    self.notifier.error(&format!("Error saving file {}", file.name));
                    return Err(ControllerError::Sink {
                        name: file.name.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(paths)
    }

    fn restore_panel(&mut self) {
        self.panel = self
            .panel_before_request
            .take()
            .unwrap_or_else(|| ControlPanel::for_solid(self.session.is_populated()));
    }
}
