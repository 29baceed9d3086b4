//! datarecon - Key-based reconciliation of tabular data

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use termcolor::ColorChoice;

use datarecon::batch::{run_batch, BatchReport, PairStatus};
use datarecon::config::{JobConfig, OutputFormat, ReadOptions, ReconOptions};
use datarecon::diff::reconcile_with;
use datarecon::mapping::{suggest_mapping_with, suggest_primary_key, ColumnMapping, MappingStrategy};
use datarecon::model::Dataset;
use datarecon::output::render_to_stdout;
use datarecon::parser::ParserFactory;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
    Csv,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliColor {
    Auto,
    Always,
    Never,
}

impl From<CliColor> for ColorChoice {
    fn from(c: CliColor) -> Self {
        match c {
            CliColor::Auto => ColorChoice::Auto,
            CliColor::Always => ColorChoice::Always,
            CliColor::Never => ColorChoice::Never,
        }
    }
}

/// Reconcile two tabular datasets (CSV, Excel, JSON) by key
#[derive(Parser, Debug)]
#[command(name = "datarecon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// When to use colored output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: CliColor,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile file B against file A
    Reconcile(ReconcileArgs),
    /// Suggest a key column and column mapping for two files
    Suggest(SuggestArgs),
    /// Reconcile every pair listed in a JSON job file
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Dataset A
    file_a: PathBuf,

    /// Dataset B
    file_b: PathBuf,

    /// For Excel files: which sheet to read
    #[arg(long)]
    sheet: Option<String>,

    /// Reserve each B column for at most one A column when suggesting a mapping
    #[arg(long)]
    strict_mapping: bool,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Key column in A (suggested when omitted)
    #[arg(short, long)]
    key: Option<String>,

    /// Tolerance for numeric comparisons (e.g., 0.01)
    #[arg(short, long, default_value_t = 0.0)]
    tolerance: f64,

    /// Explicit column pairing A=B (repeatable); overrides suggested pairs
    #[arg(short, long = "map", value_name = "A=B")]
    map: Vec<String>,

    /// JSON object of A→B column names used instead of the suggested mapping
    #[arg(long)]
    mapping_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliOutputFormat,

    /// Only show statistics, not detailed differences
    #[arg(long)]
    stats_only: bool,
}

#[derive(Args, Debug)]
struct SuggestArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Print the suggestion as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Job file
    job: PathBuf,

    /// Print the full batch report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(has_differences) => {
            if has_differences {
                ExitCode::from(1) // Differences found
            } else {
                ExitCode::SUCCESS // No differences
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<bool> {
    let color: ColorChoice = cli.color.into();
    match cli.command {
        Command::Reconcile(args) => run_reconcile(args, color),
        Command::Suggest(args) => run_suggest(args),
        Command::Batch(args) => run_batch_job(args),
    }
}

fn strategy(source: &SourceArgs) -> MappingStrategy {
    if source.strict_mapping {
        MappingStrategy::OneToOne
    } else {
        MappingStrategy::Greedy
    }
}

fn load_pair(factory: &ParserFactory, source: &SourceArgs) -> Result<(Dataset, Dataset)> {
    let read = ReadOptions {
        sheet_name: source.sheet.clone(),
    };
    let a = factory
        .parse(&source.file_a, &read)
        .with_context(|| format!("Failed to parse file A: {}", source.file_a.display()))?;
    let b = factory
        .parse(&source.file_b, &read)
        .with_context(|| format!("Failed to parse file B: {}", source.file_b.display()))?;
    Ok((a, b))
}

fn load_mapping_file(path: &Path) -> Result<ColumnMapping> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Mapping file must be a JSON object of column names: {}", path.display()))
}

fn apply_overrides(mapping: &mut ColumnMapping, pairs: &[String]) -> Result<()> {
    for pair in pairs {
        let Some((a, b)) = pair.split_once('=') else {
            bail!("Invalid --map value '{}': expected A=B", pair);
        };
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() {
            bail!("Invalid --map value '{}': both column names are required", pair);
        }
        mapping.insert(a, b);
    }
    Ok(())
}

fn run_reconcile(args: ReconcileArgs, color: ColorChoice) -> Result<bool> {
    let factory = ParserFactory::new();
    let (a, b) = load_pair(&factory, &args.source)?;

    let mut mapping = match &args.mapping_file {
        Some(path) => load_mapping_file(path)?,
        None => suggest_mapping_with(&a.column_names(), &b.column_names(), strategy(&args.source)),
    };
    apply_overrides(&mut mapping, &args.map)?;

    let mut options = ReconOptions::new()
        .with_tolerance(args.tolerance)
        .with_mapping(mapping);
    if let Some(key) = args.key {
        options = options.with_key_column(key);
    }

    let result = reconcile_with(&a, &b, &options).with_context(|| {
        format!(
            "Cannot reconcile {} ⇄ {}",
            args.source.file_a.display(),
            args.source.file_b.display()
        )
    })?;

    if args.stats_only {
        let summary = &result.summary;
        println!("A: {} ({} rows)", args.source.file_a.display(), summary.total_a);
        println!("B: {} ({} rows)", args.source.file_b.display(), summary.total_b);
        println!();
        println!("Matched:    {}", summary.matched);
        println!("Mismatched: {}", summary.mismatches);
        println!("Only in A:  {}", summary.only_in_a.len());
        println!("Only in B:  {}", summary.only_in_b.len());
        println!("Cells changed: {}", result.cells_changed());
        return Ok(result.has_differences());
    }

    render_to_stdout(
        &result,
        &args.source.file_a,
        &args.source.file_b,
        args.format.into(),
        color,
    )?;

    Ok(result.has_differences())
}

fn run_suggest(args: SuggestArgs) -> Result<bool> {
    let factory = ParserFactory::new();
    let (a, b) = load_pair(&factory, &args.source)?;

    let key = suggest_primary_key(&a)?;
    let mapping = suggest_mapping_with(&a.column_names(), &b.column_names(), strategy(&args.source));

    if args.json {
        let suggestion = serde_json::json!({
            "key_column_a": key,
            "mapping": mapping,
        });
        println!("{}", serde_json::to_string_pretty(&suggestion)?);
        return Ok(false);
    }

    println!("Suggested key: {}", key);
    println!("Mapping:");
    for (col_a, col_b) in mapping.iter() {
        println!("  {} -> {}", col_a, col_b);
    }
    let unmapped: Vec<_> = a
        .column_names()
        .into_iter()
        .filter(|c| !mapping.contains(c))
        .collect();
    if !unmapped.is_empty() {
        println!("Unmapped in A: {}", unmapped.join(", "));
    }
    for (target, sources) in mapping.ambiguous_targets() {
        println!("Warning: '{}' in B is mapped from {}", target, sources.join(", "));
    }

    Ok(false)
}

fn run_batch_job(args: BatchArgs) -> Result<bool> {
    let job = JobConfig::load(&args.job)?;
    let report = run_batch(&job, &ParserFactory::new());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_batch(&report);
    }

    if report.count(PairStatus::Failed) > 0 {
        bail!(
            "{} of {} pair(s) failed",
            report.count(PairStatus::Failed),
            report.outcomes.len()
        );
    }
    Ok(report.has_differences())
}

fn print_batch(report: &BatchReport) {
    for outcome in &report.outcomes {
        let label = format!("{} ⇄ {}", outcome.file_a.display(), outcome.file_b.display());
        match (outcome.status, &outcome.result, &outcome.error) {
            (PairStatus::Success, Some(result), _) => {
                let s = &result.summary;
                println!(
                    "OK      {}: matched {}, mismatched {}, only in A {}, only in B {}",
                    label,
                    s.matched,
                    s.mismatches,
                    s.only_in_a.len(),
                    s.only_in_b.len()
                );
            }
            (PairStatus::Skipped, _, _) => println!("SKIPPED {}", label),
            (_, _, error) => println!(
                "FAILED  {}: {}",
                label,
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    println!();
    println!(
        "{} succeeded, {} failed",
        report.count(PairStatus::Success),
        report.count(PairStatus::Failed)
    );
}
