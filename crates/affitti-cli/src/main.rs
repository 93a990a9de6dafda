//! CLI application for Italian rental contract analysis.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{analyze, batch, config, extract, schedule};

/// Italian rental contracts - extract contract fields and plan payments
#[derive(Parser)]
#[command(name = "affitti")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from a contract text file
    Extract(extract::ExtractArgs),

    /// Generate payment schedule options
    Schedule(schedule::ScheduleArgs),

    /// Extract fields and generate the payment schedule
    Analyze(analyze::AnalyzeArgs),

    /// Extract fields from multiple contract files
    Batch(batch::BatchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Logs go to stderr so JSON on stdout stays parseable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Schedule(args) => schedule::run(args, config_path).await,
        Commands::Analyze(args) => analyze::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
