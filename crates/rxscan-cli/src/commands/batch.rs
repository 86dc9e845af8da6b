//! Batch command - analyze many prescription images concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use rxscan_core::VerifiedPrescription;

use super::analyze::{OutputFormat, format_record, styled_status};
use super::{GeminiAnalyzer, build_analyzer, is_image_path, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input images
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of concurrent analyses
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of analyzing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Result<VerifiedPrescription, String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image_path(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching images found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} images to analyze",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let analyzer = build_analyzer(&config)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images")?
            .progress_chars("=>-"),
    );

    let analyzer = &analyzer;
    let mut pending = stream::iter(files)
        .map(|path| async move { analyze_file(analyzer, path).await })
        .buffer_unordered(args.jobs.max(1));

    let mut outcomes = Vec::new();
    while let Some(outcome) = pending.next().await {
        overall_pb.inc(1);

        if let Err(message) = &outcome.result {
            if args.continue_on_error {
                warn!("Failed to analyze {}: {}", outcome.path.display(), message);
            } else {
                overall_pb.abandon();
                error!("Failed to analyze {}: {}", outcome.path.display(), message);
                anyhow::bail!("Analysis of {} failed: {}", outcome.path.display(), message);
            }
        }

        outcomes.push(outcome);
    }

    overall_pb.finish_with_message("Complete");
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    if let Some(output_dir) = &args.output_dir {
        for outcome in &outcomes {
            if let Ok(record) = &outcome.result {
                let output_name = outcome
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("prescription");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_record(record, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.result.is_err()).collect();

    println!();
    println!(
        "{} Analyzed {} images in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    for outcome in &outcomes {
        if let Ok(record) = &outcome.result {
            println!(
                "   {} {} ({:.1}%)",
                outcome.path.display(),
                styled_status(record.verification_status()),
                record.accuracy_percentage()
            );
        }
    }
    println!(
        "   {} successful, {} failed",
        style(outcomes.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(message) = &outcome.result {
                println!("  - {}: {}", outcome.path.display(), message);
            }
        }
    }

    Ok(())
}

async fn analyze_file(analyzer: &GeminiAnalyzer, path: PathBuf) -> FileOutcome {
    let file_start = Instant::now();

    let result = match tokio::fs::read(&path).await {
        Ok(bytes) => analyzer.analyze(&bytes).await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    FileOutcome {
        path,
        result,
        processing_time_ms: file_start.elapsed().as_millis() as u64,
    }
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "verification_status",
        "confidence_score",
        "accuracy_percentage",
        "medication_count",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time_ms = outcome.processing_time_ms.to_string();

        match &outcome.result {
            Ok(record) => {
                wtr.write_record([
                    filename,
                    "success",
                    record.verification_status().as_str(),
                    format!("{:.2}", record.confidence_score()).as_str(),
                    format!("{:.1}", record.accuracy_percentage()).as_str(),
                    record.medications().len().to_string().as_str(),
                    time_ms.as_str(),
                    "",
                ])?;
            }
            Err(message) => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    time_ms.as_str(),
                    message.as_str(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
