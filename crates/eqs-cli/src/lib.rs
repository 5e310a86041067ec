//! # eqs-cli — Command-Line Boundary for the Equity Engine
//!
//! Provides the `eqs` binary.
//!
//! ## Subcommands
//!
//! - `eqs demo`: run the built-in scenario (issue, clear, mint, transfer,
//!   disclose and vote on one company).
//! - `eqs run <scenario.yaml>`: run a scenario file.
//!
//! Both print the resulting event log, as text or (`--json`) one JSON object
//! per line.
//!
//! ```bash
//! eqs demo
//! eqs --json run scenarios/demo.yaml
//! EQS_MINT_POLICY=single-issue eqs run issuance.yaml
//! ```

pub mod output;
pub mod scenario;

use anyhow::Result;

use eqs_engine::{EngineConfig, EquityEngine};
use eqs_events::EventRecord;
use eqs_state::MintPolicy;

use crate::scenario::{parse_scenario, run_scenario, RunReport, Scenario};

/// The scenario run by `eqs demo`.
pub const DEMO_SCENARIO: &str = include_str!("../scenarios/demo.yaml");

/// Parse [`DEMO_SCENARIO`].
pub fn demo_scenario() -> Result<Scenario> {
    parse_scenario(DEMO_SCENARIO)
}

/// Build an engine for `scenario` and run it.
///
/// Configuration layers, lowest first: `base`, the scenario's `config:`
/// block, then `mint_policy` from the command line.
pub fn execute(
    base: EngineConfig,
    scenario: &Scenario,
    mint_policy: Option<MintPolicy>,
) -> Result<(RunReport, Vec<EventRecord>)> {
    let mut config = scenario.config.apply(base);
    if let Some(policy) = mint_policy {
        config = config.with_mint_policy(policy);
    }
    tracing::debug!(policy = %config.mint_policy, advocates = config.advocates.len(), "engine configured");

    let engine = EquityEngine::new(config);
    let report = run_scenario(&engine, scenario)?;
    Ok((report, engine.history(..)))
}
