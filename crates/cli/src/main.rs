use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use stabilizer_core::compositing::domain::border_policy::BorderPolicy;
use stabilizer_core::compositing::infrastructure::warp_crop_compositor::WarpCropCompositor;
use stabilizer_core::motion::domain::feature_tracking_config::FeatureTrackingConfig;
use stabilizer_core::motion::infrastructure::optical_flow_motion_estimator::OpticalFlowMotionEstimator;
use stabilizer_core::pipeline::infrastructure::stabilization_worker::{self, WorkerMessage};
use stabilizer_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use stabilizer_core::pipeline::stabilization_config::StabilizationConfig;
use stabilizer_core::pipeline::stabilize_video_use_case::StabilizeVideoUseCase;
use stabilizer_core::shared::constants::CROP_RATIO;
use stabilizer_core::trajectory::domain::smoothing_strength::SmoothingStrength;
use stabilizer_core::video::domain::output_path::{default_output_path, is_video};
use stabilizer_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use stabilizer_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Two-pass stabilization for shaky handheld video.
#[derive(Parser)]
#[command(name = "stabilize")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Output file (defaults to stabilized_output.<ext> next to the input).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Smoothing strength: low, medium or high.
    #[arg(long, default_value = "medium")]
    strength: String,

    /// Fill for pixels warped in from outside the frame: replicate or black.
    #[arg(long, default_value = "replicate")]
    border: String,

    /// Maximum corners tracked between consecutive frames.
    #[arg(long, default_value = "200")]
    max_corners: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));
    if output == cli.input {
        return Err("Output must not overwrite the input file".into());
    }

    let strength = SmoothingStrength::from_label(&cli.strength);
    log::info!(
        "Stabilizing {} with {strength} smoothing (radius {})",
        cli.input.display(),
        strength.radius()
    );

    let use_case = build_use_case(&cli, strength);
    let (rx, _cancel) = stabilization_worker::spawn(use_case, cli.input.clone(), output);

    for message in rx.iter() {
        match message {
            WorkerMessage::Progress(pct) => eprint!("\rStabilizing... {pct}%"),
            WorkerMessage::Done(path) => {
                eprintln!();
                log::info!("Output written to {}", path.display());
                return Ok(());
            }
            WorkerMessage::Failed(cause) => {
                eprintln!();
                return Err(cause.into());
            }
            WorkerMessage::Cancelled => {
                eprintln!();
                return Err("Stabilization cancelled".into());
            }
        }
    }

    Err("Stabilization worker exited without a result".into())
}

fn build_use_case(cli: &Cli, strength: SmoothingStrength) -> StabilizeVideoUseCase {
    let tracking = FeatureTrackingConfig {
        max_corners: cli.max_corners,
        ..FeatureTrackingConfig::default()
    };
    let config = StabilizationConfig::with_strength(strength);
    let compositor = WarpCropCompositor::new(CROP_RATIO, parse_border(&cli.border));

    StabilizeVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        Box::new(OpticalFlowMotionEstimator::new(tracking)),
        Box::new(compositor),
        config,
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !is_video(&cli.input) {
        log::warn!(
            "{} has no recognized video extension, trying anyway",
            cli.input.display()
        );
    }
    if cli.max_corners < 2 {
        return Err(format!("Max corners must be at least 2, got {}", cli.max_corners).into());
    }
    let border = cli.border.to_lowercase();
    if border != "replicate" && border != "black" {
        return Err(format!(
            "Border must be 'replicate' or 'black', got '{}'",
            cli.border
        )
        .into());
    }
    if let Some(output) = &cli.output {
        ensure_parent_exists(output)?;
    }
    Ok(())
}

fn ensure_parent_exists(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            Err(format!("Output directory not found: {}", dir.display()).into())
        }
        _ => Ok(()),
    }
}

fn parse_border(border: &str) -> BorderPolicy {
    if border.eq_ignore_ascii_case("black") {
        BorderPolicy::Black
    } else {
        BorderPolicy::Replicate
    }
}
