use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use quarry::cli::{Args, Command, OutputFormat};
use quarry::{
    output, verify_dataset, Augmenter, DatasetStatistics, Pipeline, RuleSet, VerifyOptions,
};
use std::fs;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse args early to get verbose flag for logging initialization
    let args = Args::parse();

    // Use RUST_LOG env var if set, otherwise use verbose flag
    // Examples: RUST_LOG=debug, RUST_LOG=quarry=trace, RUST_LOG=quarry::pipeline=trace
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("quarry=debug")
    } else {
        EnvFilter::new("quarry=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", args.verbose);

    match &args.command {
        Command::Extract {
            source,
            out_dir,
            rules,
            min_change_delta,
            confidence_threshold,
            keep_per_file,
        } => run_extract(
            &args,
            source,
            out_dir,
            rules.as_deref(),
            *min_change_delta,
            *confidence_threshold,
            *keep_per_file,
        ),
        Command::Augment { dataset_dir, target_per_category, rules } => {
            run_augment(&args, dataset_dir, *target_per_category, rules.as_deref())
        }
        Command::Verify { dataset_dir, augmented, rules } => {
            run_verify(&args, dataset_dir, *augmented, rules.as_deref())
        }
    }
}

fn load_rules(path: Option<&str>) -> Result<RuleSet> {
    match path {
        Some(path) => {
            RuleSet::from_path(path).with_context(|| format!("loading rule table {path}"))
        }
        None => Ok(RuleSet::builtin()),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_extract(
    args: &Args,
    source: &str,
    out_dir: &str,
    rules: Option<&str>,
    min_change_delta: Option<usize>,
    confidence_threshold: Option<f64>,
    keep_per_file: bool,
) -> Result<()> {
    if !Path::new(source).exists() {
        anyhow::bail!("Commit source does not exist: {source}");
    }

    let mut builder = Pipeline::builder()
        .rules(load_rules(rules)?)
        .dedup_by_commit(!keep_per_file);
    if let Some(delta) = min_change_delta {
        builder = builder.min_change_delta(delta);
    }
    if let Some(threshold) = confidence_threshold {
        builder = builder.confidence_threshold(threshold);
    }
    let pipeline = builder.build()?;

    let commit_source = quarry::JsonlCommitSource::new(source);
    let run = pipeline.run(&commit_source).context("pipeline run failed")?;

    let split = quarry::stratified_split(&run.samples, pipeline.config().split_ratios);
    let stats = DatasetStatistics::from_split(&split, Some(run.report.counters.clone()));
    let out_path = Path::new(out_dir);
    output::write_dataset(out_path, &split, &stats)
        .with_context(|| format!("writing dataset to {out_dir}"))?;

    emit_report(args, &run.report)?;
    if matches!(args.format, OutputFormat::Terminal) {
        output::print_run_summary(&run.report, &split);
        println!("\nDataset written to {}", out_dir.bold());
    }
    Ok(())
}

fn run_augment(
    args: &Args,
    dataset_dir: &str,
    target_per_category: usize,
    rules: Option<&str>,
) -> Result<()> {
    let rules = load_rules(rules)?;
    let dir = Path::new(dataset_dir);
    let mut split =
        output::load_split(dir).with_context(|| format!("loading dataset from {dataset_dir}"))?;

    let augmenter = Augmenter::new(&rules);
    let added = augmenter.balance(&mut split, target_per_category);

    let stats = DatasetStatistics::from_split(&split, None);
    output::write_dataset(dir, &split, &stats)
        .with_context(|| format!("rewriting dataset in {dataset_dir}"))?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Terminal => {
            println!(
                "{} {added} augmented samples, dataset now holds {} samples",
                "Added".green().bold(),
                split.total()
            );
        }
    }
    Ok(())
}

fn run_verify(args: &Args, dataset_dir: &str, augmented: bool, rules: Option<&str>) -> Result<()> {
    let rules = load_rules(rules)?;
    let dir = Path::new(dataset_dir);
    let split =
        output::load_split(dir).with_context(|| format!("loading dataset from {dataset_dir}"))?;

    let options = VerifyOptions { allow_augmented: augmented, ..VerifyOptions::default() };
    let violations = verify_dataset(&split, &rules, &options);

    match args.format {
        OutputFormat::Json => {
            let payload: Vec<serde_json::Value> = violations
                .iter()
                .map(|v| {
                    serde_json::json!({
                        "split": v.split,
                        "serial": v.serial,
                        "message": v.message,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Terminal => {
            if violations.is_empty() {
                println!(
                    "{} {} samples across {} splits",
                    "Verified".green().bold(),
                    split.total(),
                    split.named().len()
                );
            } else {
                for violation in &violations {
                    println!("{} {violation}", "violation:".red().bold());
                }
            }
        }
    }

    if !violations.is_empty() {
        anyhow::bail!("dataset verification failed with {} violations", violations.len());
    }
    Ok(())
}

/// Write the machine-readable run report where requested
fn emit_report(args: &Args, report: &quarry::RunReport) -> Result<()> {
    let rendered = serde_json::to_string_pretty(report)?;
    if let Some(path) = &args.output {
        fs::write(path, &rendered).with_context(|| format!("writing report to {path}"))?;
    }
    if matches!(args.format, OutputFormat::Json) {
        println!("{rendered}");
    }
    Ok(())
}
