//! Validate command - check an already extracted prescription record.

use std::fs;
use std::io::Read;

use clap::Args;
use tracing::debug;

use rxscan_core::{Validator, parse_model_response};

use super::load_config;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// JSON file to validate, or "-" for stdin
    #[arg(default_value = "-")]
    input: String,

    /// Treat the input as a raw model extraction and assign a verification status
    #[arg(long)]
    extraction: bool,

    /// Model tag recorded with an extraction (default: configured model)
    #[arg(long, requires = "extraction")]
    model_version: Option<String>,
}

pub async fn run(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let validator = Validator::new(config.validation)?;

    let text = if args.input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(&args.input)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.input, e))?
    };
    debug!("Read {} bytes of input", text.len());

    let output = if args.extraction {
        let extraction = parse_model_response(&text)?;
        let model_version = args
            .model_version
            .as_deref()
            .unwrap_or(&config.model.model_name);
        serde_json::to_string_pretty(&validator.validate_extraction(extraction, model_version))?
    } else {
        serde_json::to_string_pretty(&validator.validate_record_json(&text)?)?
    };

    println!("{}", output);

    Ok(())
}
