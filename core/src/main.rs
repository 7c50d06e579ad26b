//! NAVCOMPARE: compare a test navigation trajectory against a reference.
//!
//! Both trajectories are whitespace-delimited text logs with one sample per line:
//!
//! ```text
//! time lat lon alt vn ve vd qw qx qy qz bias_x bias_y bias_z gyro_x gyro_y gyro_z
//! ```
//!
//! Latitude and longitude are in radians. Lines starting with `#` or `%` are comments.
//!
//! - `analyze`: print per-trajectory summaries, the position error summary and the verdicts.
//! - `export`: write the per-sample derived series (Euler angles, local position, errors,
//!   angle of attack) as CSV.
//! - `replay`: run the playback loop headlessly and log every frame.
//! - `template`: write a default configuration file (TOML/JSON/YAML by extension).

mod common;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::{ensure_parent_dir, init_logger, validate_input_file};
use log::{info, warn};
use navcompare::analysis::DerivedRecord;
use navcompare::camera::CameraInput;
use navcompare::config::NavCompareConfig;
use navcompare::session::Session;
use navcompare::view::{Frame, FrameSink};
use std::path::PathBuf;

const LONG_ABOUT: &str = "Compare a test navigation trajectory against a reference trajectory.

Reads two text logs of navigation samples, reports position error statistics and physical \
plausibility checks, exports derived per-sample series, and can replay both trajectories \
through the same playback and chase camera logic used by interactive viewers.";

#[derive(Parser)]
#[command(author, version, about = "Compare navigation trajectories against a reference.", long_about = LONG_ABOUT)]
struct Cli {
    /// Configuration file (TOML/JSON/YAML); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log file path (if not specified, logs to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    #[command(name = "analyze", about = "Print summaries, error statistics and verdicts")]
    Analyze(AnalyzeArgs),
    #[command(name = "export", about = "Write the per-sample derived series as CSV")]
    Export(ExportArgs),
    #[command(
        name = "replay",
        about = "Replay both trajectories headlessly",
        long_about = "Press play and run rendering ticks until playback pauses at the end of the test trajectory (or the frame limit is reached). Each frame's index, time, readout and camera pose are logged at info level. An optional horizontal drag is injected every frame to exercise the chase camera."
    )]
    Replay(ReplayArgs),
    #[command(name = "template", about = "Generate a template configuration file")]
    Template(TemplateArgs),
}

#[derive(Args, Clone, Debug)]
struct InputArgs {
    /// Reference trajectory log
    #[arg(short, long, value_parser)]
    reference: PathBuf,
    /// Test trajectory log
    #[arg(short, long, value_parser)]
    test: PathBuf,
}

#[derive(Args, Clone, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Also write the full report as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Output CSV file path
    #[arg(short, long, value_parser)]
    output: PathBuf,
}

#[derive(Args, Clone, Debug)]
struct ReplayArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Maximum number of rendering ticks
    #[arg(long)]
    frames: Option<usize>,
    /// Horizontal drag in pixels injected every tick
    #[arg(long, default_value_t = 0.0)]
    orbit: f64,
}

#[derive(Args, Clone, Debug)]
struct TemplateArgs {
    /// Output configuration file path
    #[arg(short, long, value_parser)]
    output: PathBuf,
}

/// Logs every frame it receives.
#[derive(Default)]
struct LogSink {
    frames: usize,
}

impl FrameSink for LogSink {
    fn present(&mut self, frame: &Frame) {
        self.frames += 1;
        info!("{} | {}", frame.readout, frame.camera);
    }
}

fn open_session(input: &InputArgs, config: NavCompareConfig) -> Result<Session> {
    validate_input_file(&input.reference)?;
    validate_input_file(&input.test)?;
    Session::from_files(&input.reference, &input.test, config).context("loading trajectories")
}

fn run_analyze(args: &AnalyzeArgs, config: NavCompareConfig) -> Result<()> {
    let session = open_session(&args.input, config)?;
    let report = session.analyze()?;
    println!("{report}");
    if let Some(path) = &args.json {
        ensure_parent_dir(path)?;
        report.to_json(path)?;
        info!("Wrote report to {}", path.display());
    }
    Ok(())
}

fn run_export(args: &ExportArgs, config: NavCompareConfig) -> Result<()> {
    let session = open_session(&args.input, config)?;
    let records = session.derived_records()?;
    ensure_parent_dir(&args.output)?;
    DerivedRecord::to_csv(&records, &args.output)?;
    info!(
        "Wrote {} derived records to {}",
        records.len(),
        args.output.display()
    );
    Ok(())
}

fn run_replay(args: &ReplayArgs, config: NavCompareConfig) -> Result<()> {
    let mut session = open_session(&args.input, config)?;
    let mut sink = LogSink::default();
    let limit = args.frames.unwrap_or(usize::MAX);
    if !session.toggle_play().is_playing() {
        warn!("Test trajectory is empty; nothing to replay");
        return Ok(());
    }
    session.camera_input(&CameraInput::PointerDown { x: 0.0, y: 0.0 });
    let mut tick = 0;
    while tick < limit {
        if args.orbit != 0.0 {
            session.camera_input(&CameraInput::PointerMove {
                x: (tick + 1) as f64 * args.orbit,
                y: 0.0,
            });
        }
        let timestamp = tick as f64 / 60.0;
        session.on_frame(timestamp, &mut [&mut sink]);
        tick += 1;
        if !session.playback().is_playing() {
            break;
        }
    }
    session.camera_input(&CameraInput::PointerUp);
    info!("Replayed {} frames; final camera {}", sink.frames, session.camera());
    Ok(())
}

fn create_config_file(args: &TemplateArgs) -> Result<()> {
    ensure_parent_dir(&args.output)?;
    NavCompareConfig::default().to_file(&args.output)?;
    println!("Wrote default configuration to {}", args.output.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.log_level, cli.log_file.as_ref())?;

    let config = match &cli.config {
        Some(path) => NavCompareConfig::from_file(path)
            .with_context(|| format!("reading configuration '{}'", path.display()))?,
        None => NavCompareConfig::default(),
    };

    match &cli.command {
        Command::Analyze(args) => run_analyze(args, config),
        Command::Export(args) => run_export(args, config),
        Command::Replay(args) => run_replay(args, config),
        Command::Template(args) => create_config_file(args),
    }
}
