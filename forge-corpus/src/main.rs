//! forge-corpus - speech corpus curation tool
//!
//! Subcommands:
//! - `organize`: classify raw recordings and move them to canonical paths
//! - `sample`: draw speaker-balanced, normalized evaluation sets per label
//! - `basic`: per-file header, size, normalization and conversion utilities
//! - `config`: write a fully populated default configuration

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use forge_common::config::{load_toml_config, resolve_output_root, write_toml_config, ConfigFileResolver};
use forge_common::logging::init_tracing;
use forge_corpus::build_info;
use forge_corpus::config::CorpusConfig;
use forge_corpus::models::write_report;
use forge_corpus::services::{
    BalancedSampler, CorpusOrganizer, MetadataClassifier, PcmParams, PeakNormalizer, SampleFilters,
};
use forge_corpus::workflow::{self, BasicOperation, BasicOptions, SampleOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory name under the user config dir
const APP_DIR: &str = "audioforge";

/// Command-line arguments for forge-corpus
#[derive(Parser, Debug)]
#[command(name = "forge-corpus")]
#[command(about = "Speech corpus curation: canonical organization and balanced sampling")]
#[command(version)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file (default: FORGE_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify every WAV under a tree and move it to its canonical path
    Organize(OrganizeArgs),
    /// Draw a speaker-balanced, normalized subset for each label
    Sample(SampleArgs),
    /// Run a basic per-file operation
    Basic(BasicArgs),
    /// Configuration file management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct OrganizeArgs {
    /// Input file or directory
    #[arg(short, long)]
    input: PathBuf,

    /// Output root (default: FORGE_OUTPUT_ROOT, config, then ./OUTPUT)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only log the planned moves
    #[arg(long)]
    preview: bool,

    /// Reject files whose canonical name is malformed
    #[arg(long)]
    strict_naming: bool,

    /// Write a JSON run report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Organized corpus root containing one directory per label
    #[arg(short, long)]
    input: PathBuf,

    /// Label list file (one per line) or a single literal label
    #[arg(short = 'c', long = "commands")]
    commands: String,

    /// Maximum files per label (default from config)
    #[arg(short = 'n', long)]
    max: Option<usize>,

    /// Output root for versioned sets
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep only paths matching this pattern (repeatable, all must match)
    #[arg(long = "include")]
    include: Vec<String>,

    /// Drop paths matching this pattern (repeatable)
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Normalization peak in (0, 1]
    #[arg(long)]
    peak: Option<f32>,

    /// Select and log only; write nothing
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON run report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BasicArgs {
    /// Input file or directory
    #[arg(short, long)]
    input: PathBuf,

    /// Operation to run
    #[arg(short = 'f', long = "function", value_enum)]
    function: BasicOperation,

    /// Output root for operations that write files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// `norm` target peak in (0, 1]
    #[arg(long, default_value_t = 1.0)]
    peak: f32,

    /// `mono` channel index
    #[arg(long, default_value_t = 0)]
    channel: u16,

    /// `pcm-to-wav` / `repair-header` sample rate
    #[arg(long, default_value_t = 16_000)]
    sample_rate: u32,

    /// `pcm-to-wav` / `repair-header` channel count
    #[arg(long, default_value_t = 1)]
    channels: u16,

    /// `pcm-to-wav` / `repair-header` bits per sample
    #[arg(long, default_value_t = 16)]
    bits: u16,

    /// Write a JSON run report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Write the default configuration to this path
    #[arg(long, value_name = "PATH")]
    init: Option<PathBuf>,
}

/// Lowercase the subcommand so `Organize` and `ORGANIZE` parse
fn normalized_args() -> Vec<String> {
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(first) = args.get_mut(1) {
        if !first.starts_with('-') {
            *first = first.to_lowercase();
        }
    }
    args
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalized_args());

    if let Command::Config(args) = &cli.command {
        return run_config(args);
    }

    let resolver = ConfigFileResolver::new(APP_DIR);
    let config_path = resolver.resolve(cli.config.as_deref());
    let mut config: CorpusConfig =
        load_toml_config(config_path.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.logging, cli.debug).context("Failed to initialize logging")?;

    info!("Starting {}", build_info::banner());
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    match cli.command {
        Command::Organize(args) => {
            if args.strict_naming {
                config.classification.strict_naming = true;
            }
            run_organize(&config, args)
        }
        Command::Sample(args) => run_sample(&config, args),
        Command::Basic(args) => run_basic(&config, args),
        Command::Config(_) => Ok(()),
    }
}

fn output_root(cli: Option<&Path>, config: &CorpusConfig) -> PathBuf {
    resolve_output_root(cli, config.output_root.as_deref())
}

fn save_report<T: Serialize>(report: &T, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        write_report(report, path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn run_organize(config: &CorpusConfig, args: OrganizeArgs) -> Result<()> {
    let output_root = output_root(args.output.as_deref(), config);
    let classifier =
        MetadataClassifier::from_config(config).context("Invalid classification rules")?;

    let report = workflow::run_organize(
        &classifier,
        &CorpusOrganizer::new(),
        &args.input,
        &output_root,
        args.preview,
    );

    save_report(&report, args.report.as_deref())
}

fn run_sample(config: &CorpusConfig, args: SampleArgs) -> Result<()> {
    let sampler_config = &config.sampler;
    let peak = args.peak.unwrap_or(sampler_config.target_peak);
    if !(peak > 0.0 && peak <= 1.0) {
        bail!("Normalization peak {} is outside (0, 1]", peak);
    }

    let include = [sampler_config.include_patterns.clone(), args.include].concat();
    let exclude = [sampler_config.exclude_patterns.clone(), args.exclude].concat();
    let filters = SampleFilters::new(&include, &exclude)?;

    let labels = workflow::read_labels(&args.commands)
        .with_context(|| format!("Failed to read labels from {}", args.commands))?;
    if labels.is_empty() {
        bail!("No labels given in '{}'", args.commands);
    }

    let options = SampleOptions {
        corpus_root: args.input,
        output_root: output_root(args.output.as_deref(), config),
        max_per_label: args.max.unwrap_or(sampler_config.max_per_label),
        dry_run: args.dry_run,
    };

    let sampler = BalancedSampler::new(Box::new(PeakNormalizer), peak, &sampler_config.version_tag);
    let report = workflow::run_sample(&sampler, &filters, &labels, &options);

    save_report(&report, args.report.as_deref())
}

fn run_basic(config: &CorpusConfig, args: BasicArgs) -> Result<()> {
    let options = BasicOptions {
        output_root: output_root(args.output.as_deref(), config),
        input: args.input,
        peak: args.peak,
        channel: args.channel,
        pcm: PcmParams {
            sample_rate: args.sample_rate,
            channels: args.channels,
            bits_per_sample: args.bits,
        },
    };

    let report = workflow::run_basic(args.function, &options)
        .with_context(|| format!("{} failed", args.function.name()))?;

    save_report(&report, args.report.as_deref())
}

fn run_config(args: &ConfigArgs) -> Result<()> {
    let Some(path) = &args.init else {
        bail!("Nothing to do: pass --init <PATH>");
    };
    write_toml_config(&CorpusConfig::default(), path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
