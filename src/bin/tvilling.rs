//! tvilling CLI: clone detection over Swift-like and C-family sources.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use tvilling::core::config::{
    AnalysisConfig, BaselineMode, DetectionThresholds, OutputFormat, YamlConfig, STARTER_CONFIG,
};
use tvilling::core::results::{AnalysisResults, CloneGroup, CloneType};
use tvilling::io::baseline::BaselineStore;
use tvilling::io::discovery::SourceFileDiscovery;
use tvilling::io::reports::{
    DiagnosticReporter, HtmlReporter, JsonReporter, Reporter, TextReporter,
};
use tvilling::AnalysisPipeline;

const EXIT_SUCCESS: i32 = 0;
const EXIT_CLONES_DETECTED: i32 = 1;
const EXIT_CONFIGURATION_ERROR: i32 = 2;
const EXIT_ANALYSIS_ERROR: i32 = 3;

const DEFAULT_CONFIG_FILE: &str = ".tvilling.yml";

#[derive(Debug, Parser)]
#[command(
    name = "tvilling",
    version,
    about = "Detects Type 1-4 code clones across source files"
)]
struct Cli {
    /// Paths (files or directories) to analyze
    paths: Vec<String>,

    /// Minimum token count for clone detection
    #[arg(long = "min-tokens")]
    minimum_token_count: Option<usize>,

    /// Minimum line count for clone detection
    #[arg(long = "min-lines")]
    minimum_line_count: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Generate a baseline file from the current clones
    #[arg(long)]
    baseline_generate: bool,

    /// Update the baseline file with the current clones
    #[arg(long)]
    baseline_update: bool,

    /// Baseline file path; implies compare mode when given alone
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum duplication percentage (0-100) before failing
    #[arg(long)]
    max_duplication: Option<f64>,

    /// Type-3 similarity threshold in percent
    #[arg(long)]
    type3_similarity: Option<u32>,

    /// Type-3 minimum tile size
    #[arg(long)]
    type3_tile_size: Option<usize>,

    /// Type-3 candidate filter threshold in percent
    #[arg(long)]
    type3_candidate_threshold: Option<u32>,

    /// Type-4 semantic similarity threshold in percent
    #[arg(long)]
    type4_similarity: Option<u32>,

    /// Clone types to detect: comma-separated ranks or "all"
    #[arg(long)]
    types: Option<String>,

    /// Exclude files matching a glob pattern (repeatable)
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Inline suppression tag
    #[arg(long)]
    suppression_tag: Option<String>,

    /// Ignore clones whose fragments are all in the same file
    #[arg(long)]
    ignore_same_file: bool,

    /// Ignore Type-3 and Type-4 clones
    #[arg(long)]
    ignore_structural: bool,

    /// Enable cross-language detection (Swift + Objective-C/C)
    #[arg(long)]
    cross_language: bool,

    /// Token cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Write a starter configuration file and exit
    #[arg(long)]
    init: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if cli.init {
        std::process::exit(handle_init());
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(EXIT_CONFIGURATION_ERROR);
        }
    };

    match run_analysis(config).await {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(EXIT_ANALYSIS_ERROR);
        }
    }
}

fn handle_init() -> i32 {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("error: {DEFAULT_CONFIG_FILE} already exists.");
        return EXIT_CONFIGURATION_ERROR;
    }

    match fs::write(path, STARTER_CONFIG) {
        Ok(()) => {
            println!("Created {DEFAULT_CONFIG_FILE}");
            EXIT_SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error}");
            EXIT_ANALYSIS_ERROR
        }
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<AnalysisConfig> {
    let yaml = match &cli.config {
        Some(path) => Some(YamlConfig::load(path)?),
        None => YamlConfig::load_if_exists(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    let yaml = yaml.unwrap_or_default();

    let defaults = AnalysisConfig::default();

    let paths = if cli.paths.is_empty() {
        yaml.paths.clone().unwrap_or_default()
    } else {
        cli.paths.clone()
    };

    let enabled_clone_types = match &cli.types {
        Some(spec) => parse_clone_types(spec)?,
        None => yaml
            .clone_types()?
            .unwrap_or_else(|| CloneType::ALL.into_iter().collect()),
    };

    let baseline_mode = if cli.baseline_generate {
        BaselineMode::Generate
    } else if cli.baseline_update {
        BaselineMode::Update
    } else if cli.baseline.is_some() {
        BaselineMode::Compare
    } else {
        BaselineMode::None
    };

    let output_format = cli
        .format
        .or_else(|| match yaml.output_format.as_deref() {
            Some("text") => Some(OutputFormat::Text),
            Some("json") => Some(OutputFormat::Json),
            Some("html") => Some(OutputFormat::Html),
            Some("diagnostic") | Some("xcode") => Some(OutputFormat::Diagnostic),
            _ => None,
        })
        .unwrap_or(defaults.output_format);

    let mut exclude_patterns = cli.exclude.clone();
    exclude_patterns.extend(yaml.exclude.clone().unwrap_or_default());

    let config = AnalysisConfig {
        paths,
        minimum_token_count: cli
            .minimum_token_count
            .or(yaml.minimum_token_count)
            .unwrap_or(defaults.minimum_token_count),
        minimum_line_count: cli
            .minimum_line_count
            .or(yaml.minimum_line_count)
            .unwrap_or(defaults.minimum_line_count),
        output_format,
        output_file: cli.output.clone(),
        baseline_mode,
        baseline_file: cli
            .baseline
            .clone()
            .unwrap_or(defaults.baseline_file),
        max_duplication: cli.max_duplication.or(yaml.max_duplication),
        thresholds: DetectionThresholds {
            type3_similarity: cli
                .type3_similarity
                .or(yaml.type3_similarity)
                .unwrap_or(defaults.thresholds.type3_similarity),
            type3_tile_size: cli
                .type3_tile_size
                .or(yaml.type3_tile_size)
                .unwrap_or(defaults.thresholds.type3_tile_size),
            type3_candidate_threshold: cli
                .type3_candidate_threshold
                .or(yaml.type3_candidate_threshold)
                .unwrap_or(defaults.thresholds.type3_candidate_threshold),
            type4_similarity: cli
                .type4_similarity
                .or(yaml.type4_similarity)
                .unwrap_or(defaults.thresholds.type4_similarity),
        },
        cross_language_enabled: cli.cross_language || yaml.cross_language_enabled.unwrap_or(false),
        exclude_patterns,
        suppression_tag: cli
            .suppression_tag
            .clone()
            .or(yaml.inline_suppression_tag.clone())
            .unwrap_or(defaults.suppression_tag),
        enabled_clone_types,
        ignore_same_file: cli.ignore_same_file || yaml.ignore_same_file.unwrap_or(false),
        ignore_structural: cli.ignore_structural || yaml.ignore_structural.unwrap_or(false),
        cache_directory: cli.cache_dir.clone().unwrap_or(defaults.cache_directory),
    };

    config.validate()?;
    Ok(config)
}

fn parse_clone_types(spec: &str) -> anyhow::Result<BTreeSet<CloneType>> {
    if spec.trim() == "all" {
        return Ok(CloneType::ALL.into_iter().collect());
    }

    let mut types = BTreeSet::new();

    for part in spec.split(',') {
        let rank: u8 = part
            .trim()
            .parse()
            .with_context(|| format!("invalid clone type '{part}'"))?;

        let clone_type = CloneType::from_rank(rank)
            .with_context(|| format!("unknown clone type {rank}"))?;
        types.insert(clone_type);
    }

    anyhow::ensure!(!types.is_empty(), "no clone types selected");
    Ok(types)
}

async fn run_analysis(config: AnalysisConfig) -> anyhow::Result<i32> {
    let discovery = SourceFileDiscovery::new(config.cross_language_enabled, &config.exclude_patterns)?;
    let files = discovery.find_source_files(&config.paths)?;

    if files.is_empty() {
        eprintln!("error: No source files found in the specified paths.");
        return Ok(EXIT_CONFIGURATION_ERROR);
    }

    let spinner = if config.output_format == OutputFormat::Text {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Analyzing {} files...", files.len()));
        spinner.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(spinner)
    } else {
        None
    };

    let pipeline = AnalysisPipeline::new(&config);
    let started = Instant::now();
    let outcome = pipeline.analyze(&files).await;
    let execution_time = started.elapsed();

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let pipeline_result = outcome?;
    let clone_groups = filter_clone_groups(pipeline_result.clone_groups, &config);

    let results = AnalysisResults {
        clone_groups,
        files_analyzed: files.len(),
        execution_time,
        total_tokens: pipeline_result.total_tokens,
        minimum_token_count: config.minimum_token_count,
        minimum_line_count: config.minimum_line_count,
    };

    match config.baseline_mode {
        BaselineMode::Generate => handle_baseline_save(&results, &config, "generated"),
        BaselineMode::Update => handle_baseline_save(&results, &config, "updated"),
        BaselineMode::Compare => handle_baseline_compare(results, &config),
        BaselineMode::None => Ok(handle_report(&results, &config)),
    }
}

fn filter_clone_groups(clone_groups: Vec<CloneGroup>, config: &AnalysisConfig) -> Vec<CloneGroup> {
    clone_groups
        .into_iter()
        .filter(|group| !(config.ignore_same_file && group.is_same_file()))
        .filter(|group| !(config.ignore_structural && group.is_structural()))
        .collect()
}

fn handle_baseline_save(
    results: &AnalysisResults,
    config: &AnalysisConfig,
    action: &str,
) -> anyhow::Result<i32> {
    let store = BaselineStore::new();
    let entries = store.entries_from_clone_groups(&results.clone_groups);
    store.save(&entries, &config.baseline_file)?;

    println!(
        "Baseline {action} with {} clone(s) at {}",
        entries.len(),
        config.baseline_file.display()
    );
    Ok(EXIT_SUCCESS)
}

fn handle_baseline_compare(
    results: AnalysisResults,
    config: &AnalysisConfig,
) -> anyhow::Result<i32> {
    let store = BaselineStore::new();
    let baseline = store.load(&config.baseline_file)?;
    let new_clones = store.filter_new_clones(&results.clone_groups, &baseline);

    let filtered = AnalysisResults {
        clone_groups: new_clones,
        ..results
    };

    Ok(handle_report(&filtered, config))
}

fn handle_report(results: &AnalysisResults, config: &AnalysisConfig) -> i32 {
    let reporter: Box<dyn Reporter> = match config.output_format {
        OutputFormat::Text => Box::new(TextReporter),
        OutputFormat::Json => Box::new(JsonReporter),
        OutputFormat::Html => Box::new(HtmlReporter::new()),
        OutputFormat::Diagnostic => Box::new(DiagnosticReporter),
    };

    let output = reporter.report(results);

    if config.output_format == OutputFormat::Diagnostic {
        // diagnostics go to stdout for the editor; the output path only
        // receives a marker file
        println!("{output}");
        write_marker_file(config.output_file.as_deref());
        return EXIT_SUCCESS;
    }

    write_output(&output, config.output_file.as_deref());

    if let Some(threshold) = config.max_duplication {
        let percentage = tvilling::core::results::duplication_percentage(
            results.duplicated_tokens(),
            results.total_tokens,
        );

        return if percentage > threshold {
            EXIT_CLONES_DETECTED
        } else {
            EXIT_SUCCESS
        };
    }

    if results.clone_groups.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_CLONES_DETECTED
    }
}

fn write_output(output: &str, path: Option<&Path>) {
    match path {
        Some(path) => {
            if let Err(error) = fs::write(path, output) {
                eprintln!("error: could not write {}: {error}", path.display());
            }
        }
        None => println!("{output}"),
    }
}

fn write_marker_file(path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let _ = fs::write(path, b"");
}
