//! Stratgate CLI: validate a strategy's historical record from files.
//!
//! Commands:
//! - `validate`: run every gate on a JSON dataset and print the report
//! - `config`: print the default configuration as TOML
//! - `history`: summarize a JSONL report history

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stratgate_core::{TradeRecord, ValidationInput};
use stratgate_runner::history::{approval_rate, failure_counts};
use stratgate_runner::{
    JsonlReportSink, ReportSink, StrategyValidator, ValidationConfig, ValidationReport,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stratgate",
    about = "Stratgate CLI: statistical robustness gate for trading strategies"
)]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a strategy dataset and print the report as JSON.
    Validate {
        /// Dataset JSON: strategy_id, trades, equity_curve, signals, prices.
        #[arg(long)]
        input: PathBuf,

        /// TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the master seed from the config.
        #[arg(long)]
        seed: Option<u64>,

        /// Trades CSV (pnl,size,price,timestamp,symbol[,signal_time]) replacing
        /// the dataset's trades.
        #[arg(long)]
        trades_csv: Option<PathBuf>,

        /// Write the report JSON here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Append the report to this JSONL history file.
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    Config {
        /// Write to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Summarize a JSONL report history.
    History {
        /// JSONL history file.
        #[arg(long)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Validate {
            input,
            config,
            seed,
            trades_csv,
            output,
            history,
        } => {
            let approved = run_validate(
                &input,
                config.as_deref(),
                seed,
                trades_csv.as_deref(),
                output.as_deref(),
                history.as_deref(),
            )?;
            if !approved {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Config { output } => run_config(output.as_deref()),
        Commands::History { path } => run_history(&path),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_validate(
    input_path: &Path,
    config_path: Option<&Path>,
    seed: Option<u64>,
    trades_csv: Option<&Path>,
    output: Option<&Path>,
    history: Option<&Path>,
) -> Result<bool> {
    let mut config = match config_path {
        Some(path) => ValidationConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ValidationConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }

    let mut input = load_dataset(input_path)?;
    if let Some(path) = trades_csv {
        input.trades = load_trades_csv(path)?;
    }

    let validator = StrategyValidator::new(config).context("invalid validation config")?;
    let report = validator.validate(input);
    info!("{}", report.summary());

    let json = serde_json::to_string_pretty(&report).context("encoding report")?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{json}"),
    }

    if let Some(path) = history {
        JsonlReportSink::new(path)
            .publish(&report)
            .with_context(|| format!("appending report to {}", path.display()))?;
    }

    Ok(report.overall_passed)
}

fn run_config(output: Option<&Path>) -> Result<()> {
    let toml = ValidationConfig::default().to_toml_string()?;
    match output {
        Some(path) => std::fs::write(path, toml)
            .with_context(|| format!("writing config to {}", path.display()))?,
        None => print!("{toml}"),
    }
    Ok(())
}

fn run_history(path: &Path) -> Result<()> {
    let reports = JsonlReportSink::new(path)
        .read_all()
        .with_context(|| format!("reading history {}", path.display()))?;
    print_history(&reports);
    Ok(())
}

/// Read a dataset JSON file into a [`ValidationInput`].
fn load_dataset(path: &Path) -> Result<ValidationInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing dataset {}", path.display()))
}

/// Read trades from CSV with a `pnl,size,price,timestamp,symbol` header and
/// an optional `signal_time` column.
fn load_trades_csv(path: &Path) -> Result<Vec<TradeRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening trades CSV {}", path.display()))?;
    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("trades CSV row {}", i + 1)))
        .collect()
}

fn print_history(reports: &[ValidationReport]) {
    println!();
    println!("=== Validation History ===");
    println!("Reports:        {}", reports.len());
    if reports.is_empty() {
        println!();
        return;
    }
    println!("Approval rate:  {:.1}%", approval_rate(reports) * 100.0);
    let failures = failure_counts(reports);
    if !failures.is_empty() {
        println!();
        println!("{:<20} {:>8}", "Test", "Failures");
        println!("{}", "-".repeat(29));
        for (test, count) in &failures {
            println!("{test:<20} {count:>8}");
        }
    }
    println!();
}
