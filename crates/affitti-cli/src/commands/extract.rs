//! Extract command - read contract fields from a single text file.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use affitti_core::contract::rules::format_euro;
use affitti_core::contract::{ContractExtractor, ExtractionResult, Extractor};
use affitti_core::models::config::AffittiConfig;
use affitti_core::models::record::{fields, ExtractedRecord, FieldValue};

use super::{load_config, read_input, write_output, StrategyArg};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input text file, or "-" for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Extraction strategy (default: from configuration)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,

    /// Reject fiscal codes with a wrong check character
    #[arg(long)]
    validate_fiscal_code: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.strategy, args.validate_fiscal_code);

    let text = read_input(&args.input)?;
    info!("Extracting contract fields from {}", args.input.display());

    let extractor = Extractor::from_config(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Extracting contract fields...");

    let result = extractor.extract(&text).await;
    pb.finish_and_clear();
    let result = result?;

    let output = format_result(&result, args.format)?;
    write_output(args.output.as_deref(), &output)?;

    if args.show_confidence {
        println!();
        print_confidence(&result);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(
    config: &mut AffittiConfig,
    strategy: Option<StrategyArg>,
    validate_fiscal_code: bool,
) {
    if let Some(strategy) = strategy {
        config.extraction.strategy = strategy.into();
    }
    if validate_fiscal_code {
        config.extraction.validate_fiscal_code = true;
    }
}

pub fn print_confidence(result: &ExtractionResult) {
    println!(
        "{} Extraction confidence: {:.1}% ({} strategy)",
        style("ℹ").blue(),
        result.confidence.percent(),
        result.strategy.as_str()
    );
    for (field, score) in &result.confidence.field_scores {
        let marker = if *score == 1 {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("   {} {}", marker, field);
    }
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_record_csv(&result.record),
        OutputFormat::Text => Ok(format_record_text(result)),
    }
}

fn format_record_csv(record: &ExtractedRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let (keys, values): (Vec<&str>, Vec<String>) = record
        .iter()
        .map(|(key, value)| (key, display_value(key, value, false)))
        .unzip();

    wtr.write_record(&keys)?;
    wtr.write_record(&values)?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_record_text(result: &ExtractionResult) -> String {
    let record = &result.record;
    let mut output = String::new();

    let sections: [(&str, &[&str]); 4] = [
        (
            "Guest",
            &[
                fields::GUEST_NAME,
                fields::BIRTH_PLACE,
                fields::BIRTH_DATE,
                fields::FISCAL_CODE,
                fields::RESIDENCE_CITY,
                fields::RESIDENCE_ADDRESS,
            ],
        ),
        (
            "Accommodation",
            &[
                fields::ACCOMMODATION_ADDRESS,
                fields::UNIVERSITY,
                fields::ACADEMIC_YEAR,
                fields::START_DATE,
                fields::END_DATE,
            ],
        ),
        (
            "Amounts",
            &[
                fields::RENT_TOTAL,
                fields::MONTHLY_RENT,
                fields::SECURITY_DEPOSIT,
                fields::NUMBER_OF_INSTALLMENTS,
            ],
        ),
        ("Contract", &[fields::CONTRACT_TYPE, fields::PROVIDER]),
    ];

    for (title, keys) in sections {
        output.push_str(&format!("{}:\n", title));
        for key in keys {
            let value = record.get(key).cloned().unwrap_or_default();
            output.push_str(&format!("  {:<24} {}\n", key, display_value(key, &value, true)));
        }
        output.push('\n');
    }

    let installments: Vec<String> = (1..)
        .map_while(|n| {
            let amount = record.get(&fields::installment_amount(n))?;
            let date = record
                .get(&fields::installment_date(n))
                .cloned()
                .unwrap_or_default();
            Some((n, amount.clone(), date))
        })
        .filter(|(_, amount, date)| amount.is_filled() || date.is_filled())
        .map(|(n, amount, date)| {
            format!(
                "  {:>2}. {:<16} {}\n",
                n,
                display_value(&fields::installment_amount(n), &amount, true),
                display_value(&fields::installment_date(n), &date, true)
            )
        })
        .collect();

    if !installments.is_empty() {
        output.push_str("Installments:\n");
        for line in installments {
            output.push_str(&line);
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "Confidence: {:.1}% ({} strategy)\n",
        result.confidence.percent(),
        result.strategy.as_str()
    ));

    output
}

/// Render a field value; money fields use euro notation when `pretty`.
fn display_value(key: &str, value: &FieldValue, pretty: bool) -> String {
    match value {
        FieldValue::Null => if pretty { "-".to_string() } else { String::new() },
        FieldValue::Flag(b) => b.to_string(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) if pretty && is_money_field(key) => format_euro(*n),
        FieldValue::Number(n) => n.normalize().to_string(),
    }
}

fn is_money_field(key: &str) -> bool {
    matches!(
        key,
        fields::RENT_TOTAL | fields::MONTHLY_RENT | fields::SECURITY_DEPOSIT
    ) || (key.starts_with("installment_") && key.ends_with("_amount"))
}
