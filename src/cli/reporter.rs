// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! CLI output reporter with colored formatting

use crate::brush::{BooleanEvaluator, Brush};
use crate::controller::{Control, ControlPanel, Notifier, COMPLETION_MESSAGE};
use crate::geometry::{analyze, GeometryStats};
use crate::session::{Outcome, PendingRequest, Session, SessionState};
use colored::*;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Snapshot of one solid for status output
#[derive(Debug, Clone, Serialize)]
pub struct SolidReport {
    pub material: String,
    /// Bounding box extents
    pub size: [f64; 3],
    pub stats: GeometryStats,
}

impl SolidReport {
    fn from_brush(brush: &Brush) -> Self {
        let size = brush.mesh().bounding_box().size();
        Self {
            material: brush.material().to_string(),
            size: [size.x, size.y, size.z],
            stats: analyze(brush.mesh()),
        }
    }
}

/// Snapshot of the session and controls for status output
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub state: SessionState,
    pub pending: Option<PendingRequest>,
    pub primary: Option<SolidReport>,
    pub secondary: Option<SolidReport>,
    pub enabled_controls: Vec<Control>,
}

impl SessionReport {
    pub fn capture<E: BooleanEvaluator>(session: &Session<E>, panel: &ControlPanel) -> Self {
        Self {
            state: session.state(),
            pending: session.pending(),
            primary: session.primary().map(SolidReport::from_brush),
            secondary: session.secondary().map(SolidReport::from_brush),
            enabled_controls: panel.enabled(),
        }
    }
}

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report the result of loading a file into the session
    pub fn report_outcome(file: &str, outcome: &Outcome, duration: Duration) {
        let action = match outcome {
            Outcome::Seeded => "seeded".to_string(),
            Outcome::Applied(op) => format!("{} applied", op),
            Outcome::Cut => "cut into two pieces".to_string(),
        };
        println!(
            "{} {} {} {}",
            "▸".bright_blue(),
            file.cyan(),
            action.bold(),
            format!("({})", Self::format_duration(duration)).bright_black()
        );
    }

    pub fn report_saved(paths: &[PathBuf]) {
        if paths.is_empty() {
            Self::report_info("Nothing to save");
            return;
        }
        for path in paths {
            println!("{} {}", "Saved".green(), path.display().to_string().cyan());
        }
    }

    pub fn report_status(report: &SessionReport) {
        println!("\n{}", "━".repeat(60).bright_black());
        let state = match report.state {
            SessionState::Empty => "empty".yellow(),
            SessionState::Populated { cut_piece: false } => "populated".green(),
            SessionState::Populated { cut_piece: true } => "populated, cut piece held".green(),
        };
        println!("{} {}", "Session:".bold(), state);

        if let Some(pending) = &report.pending {
            let cut = if pending.cut { " (cut)" } else { "" };
            println!(
                "  {} {}{}",
                "Pending:".bright_black(),
                pending.operation.to_string().yellow(),
                cut
            );
        }
        if let Some(primary) = &report.primary {
            Self::print_solid("Current", primary);
        }
        if let Some(secondary) = &report.secondary {
            Self::print_solid("Cut piece", secondary);
        }

        let controls: Vec<&str> = report.enabled_controls.iter().map(|c| c.name()).collect();
        println!(
            "  {} {}",
            "Controls:".bright_black(),
            controls.join(", ").cyan()
        );
        println!("{}", "━".repeat(60).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn print_solid(label: &str, solid: &SolidReport) {
        println!(
            "  {} {} {} triangles, {:.2} x {:.2} x {:.2}, volume {:.3}, area {:.3}",
            format!("{}:", label).bright_black(),
            solid.material.magenta(),
            solid.stats.triangle_count.to_string().cyan(),
            solid.size[0],
            solid.size[1],
            solid.size[2],
            solid.stats.volume,
            solid.stats.surface_area
        );
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}

/// Notifier printing through [`Reporter`], optionally ringing the bell
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    bell: bool,
}

impl TerminalNotifier {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }
}

impl Notifier for TerminalNotifier {
    fn completion(&mut self) {
        if self.bell {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
        Reporter::success(COMPLETION_MESSAGE);
    }

    fn error(&mut self, message: &str) {
        Reporter::report_error(message);
    }
}
