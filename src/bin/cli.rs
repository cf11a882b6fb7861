// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Yombool CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::Vector3;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use yombool::cli::{
    controller_from_config, run_steps, Reporter, SessionReport, Shell, Step, TerminalNotifier,
};
use yombool::io::{MeshSerializer, StlSerializer};
use yombool::{AppConfig, Brush, Palette, Primitive};

#[derive(Parser)]
#[command(name = "yombool")]
#[command(about = "Build solids by combining STL meshes with boolean operations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./yombool.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for saved files
    #[arg(long, global = true, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay steps: add:FILE, subtract:FILE, intersect:FILE, cut:FILE, save, cancel, status
    Run {
        #[arg(required = true, value_name = "STEP")]
        steps: Vec<Step>,

        /// Continue after a failed step
        #[arg(long)]
        keep_going: bool,

        /// Print the final session status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session
    Shell,

    /// Write a primitive solid as STL, handy as input for a session
    Primitive {
        shape: Shape,

        /// Edge length, or diameter for round shapes
        #[arg(long, default_value = "10")]
        size: f64,

        /// Segments around round shapes
        #[arg(long, default_value = "32")]
        segments: u32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum Shape {
    Cube,
    Sphere,
    Cylinder,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(out) = &cli.out {
        config.output_dir = out.clone();
    }
    init_tracing(&config, cli.verbose);

    match &cli.command {
        Commands::Run {
            steps,
            keep_going,
            json,
        } => run_command(&config, steps, *keep_going, *json),
        Commands::Shell => shell_command(&config),
        Commands::Primitive {
            shape,
            size,
            segments,
            output,
        } => primitive_command(&config, *shape, *size, *segments, output),
        Commands::Version => {
            println!("Yombool v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(config: &AppConfig, verbose: bool) {
    let default_filter = if verbose {
        "yombool=debug".to_string()
    } else {
        config.log_filter.clone()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_command(config: &AppConfig, steps: &[Step], keep_going: bool, json: bool) -> Result<()> {
    let mut controller = controller_from_config(config, TerminalNotifier::new(config.bell));

    let failures = match run_steps(&mut controller, steps, keep_going) {
        Ok(failures) => failures,
        Err(err) => {
            if !err.is_notified() {
                Reporter::report_error(&err.to_string());
            }
            bail!("run stopped: {}", err);
        }
    };

    if json {
        let report = SessionReport::capture(controller.session(), &controller.controls());
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if failures > 0 {
        bail!("{} of {} steps failed", failures, steps.len());
    }
    Ok(())
}

fn shell_command(config: &AppConfig) -> Result<()> {
    let mut controller = controller_from_config(config, TerminalNotifier::new(config.bell));
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();

    Shell::new(stdin.lock(), interactive).run(&mut controller)
}

fn primitive_command(
    config: &AppConfig,
    shape: Shape,
    size: f64,
    segments: u32,
    output: &Path,
) -> Result<()> {
    if !(size.is_finite() && size > 0.0) {
        bail!("size must be a positive number, got {}", size);
    }

    let primitive = match shape {
        Shape::Cube => Primitive::cube(Vector3::new(size, size, size), true),
        Shape::Sphere => Primitive::sphere(size / 2.0, segments),
        Shape::Cylinder => Primitive::cylinder(size, size / 2.0, segments),
    };
    let mesh = primitive.to_mesh();
    let triangles = mesh.triangle_count();

    let mut palette = config.color_seed.map(Palette::seeded).unwrap_or_default();
    let brush = Brush::new(mesh, palette.next_material());
    let bytes = StlSerializer::new(config.encoding)
        .serialize(&brush)
        .context("Failed to encode STL")?;
    std::fs::write(output, bytes)
        .with_context(|| format!("Failed to write file: {:?}", output))?;

    Reporter::success(&format!(
        "Wrote {} ({} triangles)",
        output.display(),
        triangles
    ));
    Ok(())
}
