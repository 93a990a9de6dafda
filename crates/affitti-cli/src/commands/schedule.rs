//! Schedule command - generate payment plans for a contract total.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use console::style;
use rust_decimal::Decimal;
use tracing::info;

use affitti_core::contract::rules::{format_euro, parse_italian_amount};
use affitti_core::models::schedule::{PaymentScheduleResult, PaymentType, ScheduledPayment};
use affitti_core::schedule::{PaymentScheduleGenerator, ScheduleRequest};

use super::{load_config, write_output};

/// Arguments for the schedule command.
#[derive(Args)]
pub struct ScheduleArgs {
    /// Contract total, e.g. "12360" or "12.360,00"
    #[arg(short, long)]
    total: String,

    /// Start date: DD/MM/YYYY, "10 ottobre 2025" or YYYY-MM-DD
    #[arg(short, long)]
    start: String,

    /// Number of installments (equal split unless amounts are given)
    #[arg(short = 'n', long)]
    installments: Option<u32>,

    /// Due date of one installment, as N=DATE (repeatable)
    #[arg(long = "date", value_parser = parse_indexed)]
    dates: Vec<(u32, String)>,

    /// Amount of one installment, as N=AMOUNT (repeatable)
    #[arg(long = "amount", value_parser = parse_indexed)]
    amounts: Vec<(u32, String)>,

    /// Use the fixed percentage split (the default without -n/--amount)
    #[arg(long, conflicts_with_all = ["installments", "amounts"])]
    fixed: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: ScheduleFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ScheduleFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
    /// One CSV row per scheduled payment
    Csv,
}

pub async fn run(args: ScheduleArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let total = parse_italian_amount(&args.total)
        .ok_or_else(|| anyhow::anyhow!("Invalid total amount: {}", args.total))?;

    info!("Generating payment schedule for total {}", format_euro(total));

    let generator = PaymentScheduleGenerator::from_config(&config.schedule);
    let dates: BTreeMap<u32, String> = args.dates.into_iter().collect();

    let use_fixed = args.fixed || (args.installments.is_none() && args.amounts.is_empty());

    let result = if use_fixed {
        generator.generate_fixed(total, &args.start, &dates)?
    } else {
        let request = ScheduleRequest {
            total_amount: total,
            start_date: args.start.clone(),
            installment_count: args
                .installments
                .unwrap_or(affitti_core::schedule::DEFAULT_INSTALLMENT_COUNT),
            explicit_dates: dates,
            explicit_amounts: args.amounts.into_iter().collect(),
        };
        generator.generate(&request)?
    };

    let output = format_schedule(&result, args.format)?;
    write_output(args.output.as_deref(), &output)?;

    Ok(())
}

/// Parse an `N=VALUE` pair.
fn parse_indexed(s: &str) -> Result<(u32, String), String> {
    let (index, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected N=VALUE, got '{}'", s))?;

    let index: u32 = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid installment number '{}'", index))?;
    if index == 0 {
        return Err("installment numbers start at 1".to_string());
    }

    Ok((index, value.trim().to_string()))
}

pub fn format_schedule(
    result: &PaymentScheduleResult,
    format: ScheduleFormat,
) -> anyhow::Result<String> {
    match format {
        ScheduleFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        ScheduleFormat::Text => Ok(format_schedule_text(result)),
        ScheduleFormat::Csv => format_schedule_csv(result),
    }
}

pub fn format_schedule_text(result: &PaymentScheduleResult) -> String {
    let plan = &result.installment_plan;
    let single = &result.single_payment;
    let mut output = String::new();

    let marker = |option: PaymentType| {
        if result.recommended_option == option {
            format!(" {}", style("(recommended)").green())
        } else {
            String::new()
        }
    };

    output.push_str(&format!(
        "Installments: {}{}\n",
        plan.description,
        marker(PaymentType::Installments)
    ));
    for payment in &plan.installments {
        output.push_str(&payment_line(payment));
    }
    output.push_str(&format!("  Total: {}\n", format_euro(plan.scheduled_total())));
    output.push('\n');

    output.push_str(&format!(
        "Single payment: {}{}\n",
        single.description,
        marker(PaymentType::SingleWithDiscount)
    ));
    for payment in &single.installments {
        output.push_str(&payment_line(payment));
    }
    output.push_str(&format!(
        "  Discount: {} ({}%)\n",
        format_euro(single.discount_amount),
        single.discount_percentage.normalize()
    ));

    output
}

fn payment_line(payment: &ScheduledPayment) -> String {
    format!(
        "  {:<32} {:>14}  due {}\n",
        payment.description,
        format_euro(payment.amount),
        payment.due_date
    )
}

fn format_schedule_csv(result: &PaymentScheduleResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "option",
        "recommended",
        "installment_number",
        "amount",
        "percentage",
        "due_date",
        "description",
    ])?;

    for option in result.options() {
        let option_type = option.payment_type();
        let recommended = (option_type == result.recommended_option).to_string();
        let payments = match &option {
            affitti_core::PaymentOption::Installments(plan) => &plan.installments,
            affitti_core::PaymentOption::SingleWithDiscount(single) => &single.installments,
        };

        for payment in payments {
            wtr.write_record([
                option_type.as_str(),
                recommended.as_str(),
                &payment.installment_number.to_string(),
                &format_amount(payment.amount),
                &format_amount(payment.percentage),
                &payment.due_date.to_string(),
                &payment.description,
            ])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}
