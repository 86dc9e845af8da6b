//! Analyze command - extract and verify a single prescription image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rxscan_core::{VerificationStatus, VerifiedPrescription};

use super::{build_analyzer, load_config};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Prescription image (JPEG, PNG, WebP, ...)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show confidence and verification details
    #[arg(long)]
    show_confidence: bool,

    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Send the image as-is instead of normalizing it
    #[arg(long)]
    no_preprocess: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
    /// CSV, one row per medication
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
            OutputFormat::Csv => "csv",
        }
    }
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model) = &args.model {
        config.model.model_name = model.clone();
    }
    if args.no_preprocess {
        config.preprocessing.enabled = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let analyzer = build_analyzer(&config)?;

    info!("Analyzing file: {}", args.input.display());
    let image = fs::read(&args.input)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Asking {}...", config.model.model_name));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = analyzer.analyze(&image).await;
    pb.finish_and_clear();
    let record = result?;

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        eprintln!();
        eprintln!(
            "{} Status: {}",
            style("ℹ").blue(),
            styled_status(record.verification_status())
        );
        eprintln!(
            "{} Confidence: {:.2} ({:.1}%)",
            style("ℹ").blue(),
            record.confidence_score(),
            record.accuracy_percentage()
        );
        for warning in record.warnings() {
            eprintln!("  {} {}", style("!").yellow(), warning);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn styled_status(status: VerificationStatus) -> console::StyledObject<&'static str> {
    match status {
        VerificationStatus::Verified => style(status.as_str()).green(),
        VerificationStatus::NeedsReview => style(status.as_str()).yellow(),
        VerificationStatus::Rejected => style(status.as_str()).red(),
    }
}

pub fn format_record(record: &VerifiedPrescription, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Text => Ok(format_text(record)),
        OutputFormat::Csv => format_csv(record),
    }
}

fn format_csv(record: &VerifiedPrescription) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "patient_name",
        "doctor_name",
        "date",
        "medication",
        "dosage",
        "frequency",
        "duration",
        "verification_status",
        "confidence_score",
        "accuracy_percentage",
    ])?;

    let header = [
        record.patient_name().unwrap_or_default(),
        record.doctor_name().unwrap_or_default(),
        record.date().unwrap_or_default(),
    ];
    let status = record.verification_status().as_str();
    let confidence = format!("{:.2}", record.confidence_score());
    let confidence = confidence.as_str();
    let accuracy = format!("{:.1}", record.accuracy_percentage());
    let accuracy = accuracy.as_str();

    if record.medications().is_empty() {
        wtr.write_record([
            header[0], header[1], header[2], "", "", "", "", status, confidence, accuracy,
        ])?;
    }

    for med in record.medications() {
        wtr.write_record([
            header[0],
            header[1],
            header[2],
            med.name.as_str(),
            med.dosage.as_str(),
            med.frequency.as_str(),
            med.duration.as_str(),
            status,
            confidence,
            accuracy,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &VerifiedPrescription) -> String {
    let mut output = String::new();
    let or_unknown = |value: Option<&str>| value.unwrap_or("(not found)").to_string();

    output.push_str(&format!("Patient: {}\n", or_unknown(record.patient_name())));
    output.push_str(&format!("Doctor:  {}\n", or_unknown(record.doctor_name())));
    output.push_str(&format!("Date:    {}\n", or_unknown(record.date())));
    output.push('\n');

    output.push_str("Medications:\n");
    if record.medications().is_empty() {
        output.push_str("  (none)\n");
    }
    for (i, med) in record.medications().iter().enumerate() {
        let details: Vec<&str> = [med.dosage.as_str(), med.frequency.as_str(), med.duration.as_str()]
            .into_iter()
            .filter(|d| !d.is_empty())
            .collect();
        if details.is_empty() {
            output.push_str(&format!("  {}. {}\n", i + 1, med.name));
        } else {
            output.push_str(&format!("  {}. {} ({})\n", i + 1, med.name, details.join(", ")));
        }
    }

    if let Some(instructions) = record.special_instructions() {
        output.push_str(&format!("\nInstructions: {}\n", instructions));
    }

    output.push('\n');
    output.push_str(&format!(
        "Status: {} (confidence {:.2}, accuracy {:.1}%)\n",
        record.verification_status(),
        record.confidence_score(),
        record.accuracy_percentage()
    ));

    if !record.warnings().is_empty() {
        output.push_str("Warnings:\n");
        for warning in record.warnings() {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output.push_str(&format!(
        "\nModel: {}, analyzed {}\n",
        record.model_version(),
        record.analyzed_at().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}
