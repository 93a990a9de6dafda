//! Analyze command - extract contract fields, then plan the payments.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use affitti_core::contract::{ContractExtractor, ExtractionResult, Extractor};
use affitti_core::models::schedule::PaymentScheduleResult;
use affitti_core::schedule::{PaymentScheduleGenerator, ScheduleRequest};

use super::extract::{apply_overrides, format_record_text};
use super::schedule::format_schedule_text;
use super::{load_config, read_input, write_output, StrategyArg};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input text file, or "-" for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: AnalyzeFormat,

    /// Extraction strategy (default: from configuration)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Split by the contract's installment count and amounts instead of the
    /// fixed percentages
    #[arg(long)]
    by_count: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum AnalyzeFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Extraction result with the payment schedule derived from it.
#[derive(Serialize)]
struct Analysis {
    extraction: ExtractionResult,
    schedule: Option<PaymentScheduleResult>,
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.strategy, false);

    let text = read_input(&args.input)?;
    info!("Analyzing contract {}", args.input.display());

    let extractor = Extractor::from_config(&config)?;
    let extraction = extractor.extract(&text).await?;

    let generator = PaymentScheduleGenerator::from_config(&config.schedule);
    let schedule = match ScheduleRequest::from_record(&extraction.record) {
        Some(request) if args.by_count => Some(generator.generate(&request)?),
        Some(request) => Some(generator.generate_fixed(
            request.total_amount,
            &request.start_date,
            &request.explicit_dates,
        )?),
        None => {
            warn!("Rent total or start date not found, skipping payment schedule");
            None
        }
    };

    let analysis = Analysis {
        extraction,
        schedule,
    };

    let output = match args.format {
        AnalyzeFormat::Json => serde_json::to_string_pretty(&analysis)?,
        AnalyzeFormat::Text => {
            let mut output = format_record_text(&analysis.extraction);
            output.push('\n');
            match &analysis.schedule {
                Some(schedule) => output.push_str(&format_schedule_text(schedule)),
                None => output.push_str("No payment schedule: rent total or start date not found\n"),
            }
            output
        }
    };

    write_output(args.output.as_deref(), &output)?;

    Ok(())
}
