//! round-table CLI
//!
//! Spawns every agent listed in a config file and relays the operator's
//! console to them:
//! - `name: text` talks to one agent
//! - any other line is broadcast to all of them
//! - `loop` / `stop` toggle the autonomous round-robin

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use round_table::exit;
use round_table::output::{print_error, print_summary};
use round_table::signal::spawn_signal_handler;
use rt_core::config;
use rt_core::RtError;
use rt_orchestrator::{Console, RoundTable, RunSummary};

#[derive(Parser)]
#[command(name = "round-table")]
#[command(author, version, about = "Round-table conversation between agent processes")]
struct Cli {
    /// Children config file (.json, or .toml)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Name operator lines are tagged with (overrides config)
    #[arg(
        long,
        value_name = "NAME",
        env = "ROUND_TABLE_OPERATOR_NAME",
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    operator_name: Option<String>,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() { exit::USAGE } else { exit::SUCCESS };
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose, cli.quiet);

    let code = match run(cli).await {
        Ok(summary) => {
            print_summary(&summary);
            summary.exit_code
        }
        Err(e) => {
            print_error(&format!("{:#}", e));
            exit::for_error(&e)
        }
    };

    // stdin may still be blocked in a read; do not wait for it
    std::process::exit(code);
}

fn init_logging(verbose: u8, quiet: bool) {
    let log_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<RunSummary> {
    let mut config = config::load_config(&cli.config)
        .map_err(RtError::from)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    if let Some(name) = cli.operator_name {
        config.operator_name = name;
    }
    tracing::info!(
        children = config.children.len(),
        operator = %config.operator_name,
        "Config loaded"
    );

    let console = Arc::new(Console::new());
    let launched = RoundTable::launch(config, Arc::clone(&console));

    let result = match launched {
        Ok(table) => {
            let cancel = CancellationToken::new();
            spawn_signal_handler(cancel.clone());
            Ok(table.run(tokio::io::stdin(), cancel).await)
        }
        Err(e) => Err(e),
    };

    // everything the children printed lands before the summary
    console.finish();
    result.context("No children could be started")
}
