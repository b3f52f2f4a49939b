//! Ledgerlock command-line driver.
//!
//! Loads configuration, replays a JSON event script through the budget
//! engine and prints each outcome with the final availability per key.

mod script;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ledgerlock_shared::BudgetControlConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use script::{ReplayReport, Script};

/// Output format for the replay report.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for tooling
    Json,
}

/// Replay budget lifecycle events against an in-memory ledger.
#[derive(Debug, Parser)]
#[command(name = "ledgerlock", version, about)]
struct Args {
    /// JSON script with reference data and events.
    script: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Override the number of dispatcher workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Logs go to stderr so the report on stdout stays parseable.
    let (plain, json) = if args.log_json {
        (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
    } else {
        (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        )
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerlock=debug,ledgerlock_core=debug".into()),
        )
        .with(plain)
        .with(json)
        .init();

    let mut config = BudgetControlConfig::load().context("Failed to load configuration")?;
    if let Some(workers) = args.workers {
        config.dispatch_workers = workers;
        config.validate()?;
    }
    info!(
        lock_on_state = %config.lock_on_state,
        currency = %config.currency,
        workers = config.dispatch_workers,
        "Configuration loaded"
    );

    let script = Script::from_path(&args.script)?;
    let report = script::replay(config, script).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }

    let failed = report.events.iter().filter(|e| e.error.is_some()).count();
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_text(report: &ReplayReport) {
    println!("Events");
    for event in &report.events {
        let result = match (&event.outcome, &event.error) {
            (Some(outcome), _) => match outcome.status() {
                Some(status) => format!("{status} ({} entries)", outcome.entries().len()),
                None => format!("{outcome:?}"),
            },
            (None, Some(error)) => format!("{}: {}", error.code, error.message),
            (None, None) => "no result".to_string(),
        };
        println!(
            "  #{:<3} {:<22} {:<28} {result}",
            event.index, event.event, event.document
        );
    }

    println!();
    println!("Availability ({} ledger entries)", report.ledger_entries);
    for row in &report.availability {
        println!(
            "  {:<48} allocated {:>14} actual {:>14} reserved {:>14} available {:>14}",
            row.scope.to_string(),
            row.allocated,
            row.actual,
            row.reserved,
            row.available
        );
    }
}
