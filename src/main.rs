//! dedupifyr - Find duplicate and near-duplicate images.
//!
//! Usage:
//!   dedupifyr <DIR>                  Compare every image in a directory
//!   dedupifyr <IMAGE>,<DIR>          Compare one image against a directory
//!   dedupifyr <IMAGE>,<IMAGE>        Compare two images pixel by pixel
//!   dedupifyr --help                 Show help

use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dedupifyr_analyze::{DetectionProgress, Detector};
use dedupifyr_core::{
    ComparisonKind, ComparisonOptions, ComparisonRequest, DeDupifyrResult, RawOptions,
};

#[derive(Parser)]
#[command(
    name = "dedupifyr",
    version,
    about = "Find duplicate and near-duplicate images",
    long_about = "dedupifyr compares images by content fingerprint or by decoded pixels.\n\n\
                  Pass a directory to compare every image in it, `IMAGE,DIR` to compare \
                  one image against a directory, or `IMAGE,IMAGE` to compare two images."
)]
struct Cli {
    /// What to compare: `DIR`, `IMAGE,DIR` or `IMAGE,IMAGE`
    input: String,

    /// Force the comparison kind (all, pair, single) instead of inferring it
    #[arg(short, long)]
    kind: Option<String>,

    /// Directory level: top or all
    #[arg(short, long)]
    level: Option<String>,

    /// Minimum similarity in percent (0-100) to report a duplicate
    #[arg(short, long)]
    bias: Option<String>,

    /// Pixel tolerance: equal, fuzzy, loose, or a radius 0-255
    #[arg(short, long)]
    strictness: Option<String>,

    /// Fingerprint comparator: positional or edit-distance
    #[arg(short, long)]
    metric: Option<String>,

    /// Claim handling in directory runs: lenient or strict
    #[arg(short, long)]
    dedup: Option<String>,

    /// Comma-separated image extensions to consider
    #[arg(short, long)]
    extensions: Option<String>,

    /// Worker threads (0 uses every core)
    #[arg(short, long)]
    threads: Option<String>,

    /// TOML file with default options; command-line flags win
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Print phase changes to stderr
    #[arg(short, long)]
    progress: bool,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    /// Flags given on the command line, by option name.
    fn flags(&self) -> Vec<(&'static str, &str)> {
        [
            ("level", &self.level),
            ("bias", &self.bias),
            ("strictness", &self.strictness),
            ("metric", &self.metric),
            ("dedup", &self.dedup),
            ("extensions", &self.extensions),
            ("threads", &self.threads),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = load_options(&cli)?;
    let request = match cli.kind.as_deref() {
        Some(tag) => ComparisonRequest::parse_as(tag, &cli.input),
        None => ComparisonRequest::parse(&cli.input),
    }
    .wrap_err("Invalid comparison request")?;

    debug!(request = %request.describe(), ?options, "starting detection");
    eprintln!("Comparing {}...", request.describe());

    let detector = Detector::new(options);
    let reporter = cli.progress.then(|| spawn_progress_printer(&detector));

    let outcome = detector.run(&request);
    drop(detector);
    if let Some(handle) = reporter {
        let _ = handle.join();
    }
    let results = outcome.wrap_err("Detection failed")?;

    match cli.format {
        OutputFormat::Text => print_report(&request, &results),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Options file (if any) overlaid with command-line flags.
fn load_options(cli: &Cli) -> Result<ComparisonOptions> {
    let file = match &cli.config {
        Some(path) => read_config(path)?,
        None => RawOptions::default(),
    };

    let mut flags = RawOptions::default();
    for (name, value) in cli.flags() {
        flags
            .set(name, value)
            .wrap_err_with(|| format!("Invalid --{name}"))?;
    }

    file.merge(flags)
        .resolve(None)
        .wrap_err("Invalid comparison options")
}

fn read_config(path: &Path) -> Result<RawOptions> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).wrap_err_with(|| format!("Invalid config {}", path.display()))
}

fn spawn_progress_printer(detector: &Detector) -> thread::JoinHandle<()> {
    let mut rx = detector.subscribe();
    thread::spawn(move || {
        loop {
            match rx.blocking_recv() {
                Ok(update) => print_progress(&update),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_progress(update: &DetectionProgress) {
    eprintln!(
        "  [{:>7.2}s] {:?}: {} images, {} comparisons, {} duplicates",
        update.elapsed.as_secs_f64(),
        update.phase,
        update.images_built,
        update.comparisons,
        update.duplicates_found
    );
}

fn print_report(request: &ComparisonRequest, results: &[DeDupifyrResult]) {
    println!();
    println!("{}", "─".repeat(70));
    println!(" Duplicate Image Report");
    println!("{}", "─".repeat(70));
    println!();

    if request.kind == ComparisonKind::Pair {
        for result in results {
            match result.duplicates.first() {
                Some(target) => println!(
                    " {} and {} are {:.2}% similar",
                    result.source.path.display(),
                    target.image.path.display(),
                    target.percent()
                ),
                None => println!(" {} was compared with itself", result.source.path.display()),
            }
        }
        return;
    }

    let with_duplicates: Vec<_> = results.iter().filter(|r| r.has_duplicates()).collect();
    if with_duplicates.is_empty() {
        println!(" No duplicate images found.");
        return;
    }

    let total: usize = with_duplicates.iter().map(|r| r.duplicate_count()).sum();
    println!(
        " Found {} image(s) with {} duplicate(s)",
        with_duplicates.len(),
        total
    );
    println!();

    for (i, result) in with_duplicates.iter().enumerate() {
        println!(" {}. {}", i + 1, result.source.path.display());
        for duplicate in &result.duplicates {
            println!(
                "    {:>7.2}%  {}",
                duplicate.percent(),
                duplicate.image.path.display()
            );
        }
        println!();
    }
}
