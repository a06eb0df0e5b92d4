//! `survey-align`: align surveyed points to design geometry from JSON files.

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use survey_align::io::{AlignConfig, AlignReport};
use survey_align::AlignInput;

#[cfg(not(feature = "tracing"))]
use log::{error, info, LevelFilter};
#[cfg(feature = "tracing")]
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(
    name = "survey-align",
    version,
    about = "Fit a rigid transform from surveyed points onto labeled design vertices"
)]
struct Cli {
    /// Input JSON with `surveyed`, `references` and optional `annotations`.
    /// Overrides `input_path` from the config file.
    input: Option<PathBuf>,

    /// JSON config (`input_path`, `output_path`, `params`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report path (default: `survey_align_report.json`).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for the outlier filter.
    #[arg(long)]
    seed: Option<u64>,

    /// Annotation association distance.
    #[arg(long)]
    annotation_threshold: Option<f64>,

    /// Outlier residual threshold.
    #[arg(long)]
    residual_threshold: Option<f64>,

    /// Outlier filter trial limit.
    #[arg(long)]
    max_trials: Option<usize>,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines (with the `tracing` feature).
    #[arg(long)]
    json_log: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<AlignConfig, Box<dyn std::error::Error>> {
        let mut cfg = match &self.config {
            Some(path) => AlignConfig::load_json(path)?,
            None => AlignConfig::default(),
        };
        if let Some(input) = &self.input {
            cfg.input_path = Some(input.to_string_lossy().into_owned());
        }
        if let Some(output) = &self.output {
            cfg.output_path = Some(output.to_string_lossy().into_owned());
        }
        if let Some(seed) = self.seed {
            cfg.params.outlier.seed = Some(seed);
        }
        if let Some(threshold) = self.annotation_threshold {
            cfg.params.mapping.annotation_threshold = threshold;
        }
        if let Some(threshold) = self.residual_threshold {
            cfg.params.outlier.residual_threshold = threshold;
        }
        if let Some(max_trials) = self.max_trials {
            cfg.params.outlier.max_trials = max_trials;
        }
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&cli) {
        eprintln!("failed to initialize logging: {err}");
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let level = LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Info);
    survey_align::core::init_with_level(level)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("RUST_LOG").is_none() {
        if let Ok(level) = log::LevelFilter::from_str(&cli.log_level) {
            std::env::set_var("RUST_LOG", level.as_str().to_lowercase());
        }
    }
    // The subscriber also bridges `log` records from the library crates.
    survey_align::core::init_tracing(cli.json_log);
    Ok(())
}

/// Returns `Ok(false)` when the pipeline failed but the report was written.
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let cfg = cli.resolve_config()?;
    let input_path = cfg
        .input_path
        .as_ref()
        .map(PathBuf::from)
        .ok_or("no input file: pass INPUT or set input_path in --config")?;

    let input = AlignInput::load_json(&input_path)?;
    info!(
        "loaded {} surveyed points, {} reference sets, {} annotations",
        input.surveyed.len(),
        input.references.len(),
        input.annotations.len()
    );

    let aligner = cfg.build_aligner();
    let outcome = aligner.align(&input);
    let report = AlignReport::from_outcome(&input, Some(&input_path), &outcome);

    let output_path = cfg.output_path();
    report.write_json(&output_path)?;
    info!("wrote report JSON to {}", output_path.display());

    if let Some(reason) = &report.error {
        error!("alignment failed: {reason}");
    }
    Ok(report.is_success())
}
