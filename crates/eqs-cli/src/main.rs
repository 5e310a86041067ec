//! # eqs CLI entry point
//!
//! Parses command-line arguments, sets up logging and dispatches to the
//! scenario runner.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use eqs_cli::output::{render_events, OutputFormat};
use eqs_cli::scenario::{load_scenario, Scenario};
use eqs_cli::{demo_scenario, execute};
use eqs_engine::EngineConfig;
use eqs_state::MintPolicy;

/// Equity issuance and governance engine.
///
/// Runs scenarios of issuance, transfer, disclosure and ballot operations
/// and prints the resulting event log.
#[derive(Parser, Debug)]
#[command(name = "eqs", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    /// Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print events and logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    /// Mint policy: `top-up` or `single-issue`. Overrides EQS_MINT_POLICY
    /// and the scenario's config block.
    #[arg(long, global = true)]
    mint_policy: Option<MintPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the built-in end-to-end scenario.
    Demo,

    /// Run a scenario file.
    Run {
        /// Path to the scenario YAML.
        #[arg(value_name = "SCENARIO_YAML")]
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let scenario: Scenario = match &cli.command {
        Commands::Demo => demo_scenario()?,
        Commands::Run { scenario } => load_scenario(scenario)?,
    };
    let base = EngineConfig::from_env()?;
    let (report, events) = execute(base, &scenario, cli.mint_policy)?;

    print!("{}", render_events(&events, OutputFormat::from_flag(cli.json))?);
    tracing::info!(
        steps = report.steps,
        expected_failures = report.expected_failures,
        events = events.len(),
        "scenario complete"
    );
    Ok(())
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
