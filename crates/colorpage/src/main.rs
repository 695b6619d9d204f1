//! colorpage: turn a photograph into a printable coloring page.
//!
//! Loads an image, fits it to the working width, runs the sketch
//! pipeline and writes the line art as PNG. Optionally dumps every
//! intermediate stage and prints per-stage diagnostics.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin colorpage -- [OPTIONS] <INPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use colorpage_io::{MAX_WORKING_WIDTH, download_filename, load_image, png_data_url, save_png};
use colorpage_pipeline::diagnostics::{Clock, PipelineDiagnostics, transform_with_diagnostics};
use colorpage_pipeline::{
    PixelBuffer, SketchConfig, StageId, StagedResult, transform, transform_staged,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Turn a photograph into clean black-and-white line art.
#[derive(Parser)]
#[command(name = "colorpage", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Output PNG path. Defaults to `<stem>-coloring-page.png` next to
    /// the input, unless `--data-url` is given.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Line thickness (1-50). Out-of-range values are clamped.
    #[arg(long, allow_hyphen_values = true, value_parser = parse_thickness)]
    thickness: Option<i32>,

    /// Background cleanliness (0-100). Out-of-range values are clamped.
    #[arg(long, allow_hyphen_values = true)]
    cleanliness: Option<f64>,

    /// Scale wider images down to this many pixels. 0 keeps full size.
    #[arg(long, default_value_t = MAX_WORKING_WIDTH)]
    max_width: u32,

    /// Read a `SketchConfig` from a JSON file.
    ///
    /// `--thickness` and `--cleanliness` override values from the file.
    #[arg(long, conflicts_with = "config_json")]
    config: Option<PathBuf>,

    /// Sketch config as a JSON string, e.g. `{"thickness":6}`.
    ///
    /// `--thickness` and `--cleanliness` override values from the JSON.
    #[arg(long)]
    config_json: Option<String>,

    /// Print the result as a `data:image/png;base64,...` URL.
    #[arg(long)]
    data_url: bool,

    /// Write every intermediate stage as PNG into this directory.
    #[arg(long)]
    stages: Option<PathBuf>,

    /// Print per-stage timing and pixel statistics.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a table.
    #[arg(long, requires = "diagnostics")]
    json: bool,

    /// Number of diagnostic runs for averaging.
    #[arg(long, default_value_t = 1, requires = "diagnostics", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colorpage=info,colorpage_io=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = config_from_cli(cli)?;

    let source = load_image(&cli.input, cli.max_width)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    tracing::info!(
        input = %cli.input.display(),
        dimensions = %source.dimensions(),
        thickness = config.thickness,
        cleanliness = config.cleanliness,
        "processing image",
    );

    let output = render(cli, &source, &config)?;

    if cli.data_url {
        println!("{}", png_data_url(&output)?);
    }

    if let Some(path) = output_path(cli) {
        save_png(&path, &output)?;
        tracing::info!(output = %path.display(), "coloring page written");
    }

    Ok(())
}

/// Produce the line art, writing stage PNGs and printing diagnostics as
/// requested.
fn render(cli: &Cli, source: &PixelBuffer, config: &SketchConfig) -> anyhow::Result<PixelBuffer> {
    if cli.diagnostics {
        if let Some(ref dir) = cli.stages {
            write_stages(dir, &transform_staged(source, config)?)?;
        }
        return run_diagnostics(cli, source, config);
    }

    if let Some(ref dir) = cli.stages {
        let staged = transform_staged(source, config)?;
        write_stages(dir, &staged)?;
        return Ok(staged.output);
    }

    Ok(transform(source, config)?)
}

/// Parse `--thickness`, accepting any number and saturating to `i32`.
fn parse_thickness(arg: &str) -> Result<i32, String> {
    let value: f64 = arg
        .trim()
        .parse()
        .map_err(|_| format!("`{arg}` is not a number"))?;
    if value.is_nan() {
        return Err(format!("`{arg}` is not a number"));
    }
    Ok(SketchConfig::saturating_thickness(value))
}

/// Build a [`SketchConfig`] from the config source and override flags.
fn config_from_cli(cli: &Cli) -> anyhow::Result<SketchConfig> {
    let mut config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).context("parsing --config-json")?
    } else if let Some(ref path) = cli.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?
    } else {
        SketchConfig::default()
    };

    if let Some(thickness) = cli.thickness {
        config.thickness = thickness;
    }
    if let Some(cleanliness) = cli.cleanliness {
        config.cleanliness = cleanliness;
    }
    Ok(config)
}

/// Where to write the PNG, if anywhere.
fn output_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(ref path) = cli.output {
        return Some(path.clone());
    }
    if cli.data_url {
        return None;
    }
    let name = cli
        .input
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    Some(cli.input.with_file_name(download_filename(name)))
}

/// Write `NN-<stage>.png` for every stage into `dir`.
fn write_stages(dir: &Path, staged: &StagedResult) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (index, id) in StageId::ALL.into_iter().enumerate() {
        let path = dir.join(format!("{index:02}-{}.png", id.slug()));
        save_png(&path, staged.stage(id))?;
    }
    tracing::info!(dir = %dir.display(), count = StageId::ALL.len(), "stages written");
    Ok(())
}

/// Run the timed pipeline `cli.runs` times, print the diagnostics and
/// return the image from the last run.
fn run_diagnostics(
    cli: &Cli,
    source: &PixelBuffer,
    config: &SketchConfig,
) -> anyhow::Result<PixelBuffer> {
    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    let mut output = None;

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (image, diagnostics) = transform_with_diagnostics(source, config, &StdClock)?;
        if cli.json {
            let json = serde_json::to_string_pretty(&diagnostics)
                .context("serializing diagnostics")?;
            println!("{json}");
        } else {
            println!("{}", diagnostics.report());
        }

        all_diagnostics.push(diagnostics);
        output = Some(image);
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    output.context("no diagnostic runs were performed")
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    if all_diagnostics.is_empty() {
        return;
    }

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let runs = all_diagnostics.len() as f64;
    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / runs;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_count = all_diagnostics[0].stages().len();
    for index in 0..stage_count {
        let name = all_diagnostics[0].stages()[index].0;
        let total: f64 = all_diagnostics
            .iter()
            .map(|d| d.stages()[index].1.duration.as_secs_f64() * 1000.0)
            .sum();
        println!("{name:<24} {:>10.3}ms", total / runs);
    }
}
