pub mod classify;
pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod io_utils;
pub mod loader;
pub mod profiler;
pub mod quality;
pub mod report;
pub mod stats;
pub mod summary;
pub mod table;
pub mod yaml_provider;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::ProfilerConfig;
use crate::domain::PatternLibrary;

pub use crate::dataset::{Column, Dataset};
pub use crate::domain::{DomainDetectionResult, detect_domain};
pub use crate::error::{AnalysisError, PatternConfigError, ProfileError};
pub use crate::profiler::{DatasetProfile, profile};
pub use crate::quality::{QualityReport, score_quality};
pub use crate::report::{AnalysisReport, analyze, analyze_with};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tabular_profiler", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => handle_profile(&args),
        Commands::Patterns(args) => handle_patterns(&args),
    }
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => ProfilerConfig::load(path)?,
        None => ProfilerConfig::default(),
    };
    let custom_library = match &args.patterns {
        Some(path) => Some(PatternLibrary::load(path)?),
        None => None,
    };
    let library = match &custom_library {
        Some(library) => library,
        None => PatternLibrary::builtin(),
    };

    let dataset = loader::load_csv(&args.input, args.delimiter)?;
    let report = analyze_with(&dataset, &config, library)
        .with_context(|| format!("Analyzing {:?}", args.input))?;

    let rendered = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&report).context("Serializing analysis report")? + "\n"
        }
        OutputFormat::Table => summary::render(&report),
    };
    let mut writer = io_utils::open_output(args.output.as_deref())?;
    writer
        .write_all(rendered.as_bytes())
        .context("Writing analysis report")?;
    writer.flush().context("Flushing analysis report")?;
    if let Some(path) = &args.output {
        info!("Analysis report written to {path:?}");
    }
    Ok(())
}

fn handle_patterns(args: &cli::PatternsArgs) -> Result<()> {
    if let Some(path) = &args.validate {
        let library = PatternLibrary::load(path)?;
        info!(
            "{:?} is valid: {} pattern(s), tie-break {:?}",
            path,
            library.patterns().len(),
            library.tie_break()
        );
        println!("OK: {} domain pattern(s)", library.patterns().len());
        return Ok(());
    }
    let library = PatternLibrary::builtin();
    match &args.output {
        Some(path) if !io_utils::is_dash(path) => {
            library.save(path)?;
            info!("Built-in domain patterns written to {path:?}");
        }
        _ => {
            let yaml = yaml_provider::to_string(library)?;
            print!("{yaml}");
        }
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
