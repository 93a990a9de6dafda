//! Batch extraction command for multiple contract text files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use affitti_core::contract::{ContractExtractor, ExtractionResult, Extractor};
use affitti_core::models::record::fields;

use super::extract::{apply_overrides, format_result, OutputFormat};
use super::{load_config, StrategyArg};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of contract text files (e.g. "contracts/*.txt")
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of files extracted concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Extraction strategy (default: from configuration)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.strategy, false);

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            ext.eq_ignore_ascii_case("txt")
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let extractor = Extractor::from_config(&config)?;
    let extractor = &extractor;

    let mut pending = stream::iter(files)
        .map(|path| async move {
            let file_start = Instant::now();
            let result = process_single_file(&path, extractor).await;
            (path, result, file_start.elapsed().as_millis() as u64)
        })
        .buffer_unordered(args.jobs.max(1));

    let mut results = Vec::new();

    while let Some((path, result, processing_time_ms)) = pending.next().await {
        match result {
            Ok(extraction) => {
                results.push(ProcessResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let successful: Vec<_> = results.iter().filter(|r| r.extraction.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            let Some(extraction) = &result.extraction else {
                continue;
            };
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("contract");

            let output_path =
                output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_result(extraction, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn process_single_file(
    path: &Path,
    extractor: &Extractor,
) -> anyhow::Result<ExtractionResult> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(extractor.extract(&text).await?)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "guest_name",
        "fiscal_code",
        "rent_total",
        "start_date",
        "end_date",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(extraction) = &result.extraction {
            let record = &extraction.record;
            let text = |key: &str| record.text(key).unwrap_or_default().to_string();

            wtr.write_record([
                filename,
                "success",
                &text(fields::GUEST_NAME),
                &text(fields::FISCAL_CODE),
                &record
                    .number(fields::RENT_TOTAL)
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                &text(fields::START_DATE),
                &text(fields::END_DATE),
                &format!("{:.2}", extraction.confidence.overall),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
