use anyhow::Result;
use clap::ValueEnum;
use receipt_autofill::{FillOutcome, FillSummary};
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

pub fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Human => {
            println!("{}", serde_json::to_string_pretty(value)?)
        }
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

pub fn print_summary(summary: &FillSummary, format: OutputFormat) -> Result<()> {
    let OutputFormat::Human = format else {
        return print_value(summary, format);
    };
    println!(
        "Filled {}/{} fields, {} need review",
        summary.filled_fields, summary.total_fields, summary.low_confidence_fields
    );
    for result in &summary.results {
        let marker = match result.outcome {
            FillOutcome::Filled => "ok",
            FillOutcome::Flagged => "review",
            FillOutcome::Unknown | FillOutcome::Unmatched => "unknown",
            FillOutcome::Collision => "kept",
            FillOutcome::NotFound => "missing",
            FillOutcome::Failed => "error",
        };
        println!(
            "  {:<16} {:<8} {:>4.0}%  {}",
            result.field_name.as_str(),
            marker,
            result.confidence * 100.0,
            result.value.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
