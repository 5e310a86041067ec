//! # Scenario Runner
//!
//! A scenario is a YAML file with an optional `config:` block and a list of
//! `steps:`. Each step names one engine operation and may declare the error
//! kind it is expected to fail with:
//!
//! ```yaml
//! config:
//!   mint_policy: top-up
//!   advocates: [advocate]
//! steps:
//!   - create_token: { caller: issuer, name: TestCompany, ticker: TST, granularity: 1 }
//!   - mint: { caller: issuer, company: TestCompany, amount: 1000 }
//!     expect_error: NotCleared
//!   - clear_request: { caller: advocate, company: TestCompany }
//! ```
//!
//! Execution stops at the first step whose outcome differs from what it
//! declared.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use eqs_core::{AccountId, CompanyName, TrancheId};
use eqs_engine::{EngineConfig, EngineError, EquityEngine, ErrorKind, MintMetadata};
use eqs_ledger::TransferRequest;
use eqs_state::MintPolicy;

/// A parsed scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Overrides applied on top of the environment configuration.
    #[serde(default)]
    pub config: ScenarioConfig,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

/// The `config:` block of a scenario.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Replaces the configured mint policy.
    pub mint_policy: Option<MintPolicy>,
    /// Added to the configured advocates.
    pub advocates: Vec<AccountId>,
}

impl ScenarioConfig {
    /// Layer this block over `base`.
    pub fn apply(&self, mut base: EngineConfig) -> EngineConfig {
        if let Some(policy) = self.mint_policy {
            base = base.with_mint_policy(policy);
        }
        for advocate in &self.advocates {
            base = base.with_advocate(advocate.clone());
        }
        base
    }
}

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// The operation to run.
    #[serde(flatten)]
    pub action: Action,
    /// Error kind the step must fail with.
    #[serde(default)]
    pub expect_error: Option<ErrorKind>,
}

/// An engine operation. Amounts are read as `u64` here; the engine itself
/// works in `u128`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Give `account` the advocate role.
    GrantAdvocate {
        /// The new advocate.
        account: AccountId,
    },
    /// Request a new share class owned by `caller`.
    CreateToken {
        /// The issuing owner.
        caller: AccountId,
        /// Company name.
        name: String,
        /// Trading symbol.
        ticker: String,
        /// Smallest transferable unit.
        granularity: u64,
    },
    /// Clear a pending issuance request.
    ClearRequest {
        /// The clearing advocate.
        caller: AccountId,
        /// The company.
        company: CompanyName,
    },
    /// Mint shares to the owner.
    Mint {
        /// The owner.
        caller: AccountId,
        /// The company.
        company: CompanyName,
        /// Shares to create.
        amount: u64,
        /// Owner data, stored as UTF-8 bytes.
        #[serde(default)]
        data: String,
        /// Operator data, stored as UTF-8 bytes.
        #[serde(default)]
        operator_data: String,
    },
    /// Move shares between holders.
    Send {
        /// Defaults to `from`.
        #[serde(default)]
        caller: Option<AccountId>,
        /// The company.
        company: CompanyName,
        /// Debited account.
        from: AccountId,
        /// Credited account.
        to: AccountId,
        /// Shares to move.
        amount: u64,
        /// Tranche tag.
        #[serde(default)]
        tranche: u64,
        /// Sender data, stored as UTF-8 bytes.
        #[serde(default)]
        metadata: String,
    },
    /// Publish a disclosure.
    SendMessage {
        /// The owner.
        caller: AccountId,
        /// The company.
        company: CompanyName,
        /// Message text.
        text: String,
    },
    /// Open a ballot.
    StartBallot {
        /// The owner.
        caller: AccountId,
        /// The company.
        company: CompanyName,
        /// Proposal names in ballot order.
        proposals: Vec<String>,
    },
    /// Cast a vote.
    Vote {
        /// The voter.
        caller: AccountId,
        /// The company.
        company: CompanyName,
        /// Index of the chosen proposal.
        proposal: usize,
    },
    /// Hand a vote to another account.
    Delegate {
        /// The delegator.
        caller: AccountId,
        /// The company.
        company: CompanyName,
        /// The delegate.
        to: AccountId,
    },
    /// Close the open ballot.
    ConcludeBallot {
        /// The owner.
        caller: AccountId,
        /// The company.
        company: CompanyName,
    },
}

impl Action {
    /// The operation's name as written in the file.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GrantAdvocate { .. } => "grant_advocate",
            Self::CreateToken { .. } => "create_token",
            Self::ClearRequest { .. } => "clear_request",
            Self::Mint { .. } => "mint",
            Self::Send { .. } => "send",
            Self::SendMessage { .. } => "send_message",
            Self::StartBallot { .. } => "start_ballot",
            Self::Vote { .. } => "vote",
            Self::Delegate { .. } => "delegate",
            Self::ConcludeBallot { .. } => "conclude_ballot",
        }
    }

    /// Run the operation against `engine`.
    pub fn apply(&self, engine: &EquityEngine) -> Result<(), EngineError> {
        match self {
            Self::GrantAdvocate { account } => {
                engine.grant_advocate(account.clone());
            }
            Self::CreateToken {
                caller,
                name,
                ticker,
                granularity,
            } => {
                engine.create_token(caller, name, ticker, u128::from(*granularity))?;
            }
            Self::ClearRequest { caller, company } => engine.clear_request(caller, company)?,
            Self::Mint {
                caller,
                company,
                amount,
                data,
                operator_data,
            } => {
                let metadata = MintMetadata {
                    data: data.clone().into_bytes(),
                    operator_data: operator_data.clone().into_bytes(),
                };
                engine.mint(caller, company, u128::from(*amount), metadata)?;
            }
            Self::Send {
                caller,
                company,
                from,
                to,
                amount,
                tranche,
                metadata,
            } => {
                let request = TransferRequest {
                    tranche: TrancheId(*tranche),
                    from: from.clone(),
                    to: to.clone(),
                    amount: u128::from(*amount),
                    metadata: metadata.clone().into_bytes(),
                };
                engine.send(caller.as_ref().unwrap_or(from), company, &request)?;
            }
            Self::SendMessage {
                caller,
                company,
                text,
            } => {
                engine.send_message(caller, company, text.as_str())?;
            }
            Self::StartBallot {
                caller,
                company,
                proposals,
            } => {
                engine.start_ballot(caller, company, proposals.iter().cloned())?;
            }
            Self::Vote {
                caller,
                company,
                proposal,
            } => {
                engine.vote(caller, company, *proposal)?;
            }
            Self::Delegate {
                caller,
                company,
                to,
            } => {
                engine.delegate(caller, company, to)?;
            }
            Self::ConcludeBallot { caller, company } => {
                engine.conclude_ballot(caller, company)?;
            }
        }
        Ok(())
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Steps executed.
    pub steps: usize,
    /// Steps that failed as declared.
    pub expected_failures: usize,
}

/// Parse a scenario from YAML text.
pub fn parse_scenario(yaml: &str) -> Result<Scenario> {
    serde_yaml::from_str(yaml).context("failed to parse scenario YAML")
}

/// Read and parse a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file: {}", path.display()))?;
    parse_scenario(&content).with_context(|| format!("in {}", path.display()))
}

/// Execute every step of `scenario` against `engine`.
pub fn run_scenario(engine: &EquityEngine, scenario: &Scenario) -> Result<RunReport> {
    let mut report = RunReport::default();
    for (index, step) in scenario.steps.iter().enumerate() {
        let op = step.action.name();
        let outcome = step.action.apply(engine);
        report.steps += 1;
        match (outcome, step.expect_error) {
            (Ok(()), None) => {
                tracing::debug!(step = index, op, "step succeeded");
            }
            (Err(e), Some(expected)) if e.kind() == expected => {
                tracing::info!(step = index, op, kind = %expected, "step failed as expected");
                report.expected_failures += 1;
            }
            (Err(e), Some(expected)) => {
                bail!(
                    "step {index} ({op}): expected {expected}, got {}: {e}",
                    e.kind()
                );
            }
            (Ok(()), Some(expected)) => {
                bail!("step {index} ({op}): expected {expected}, but it succeeded");
            }
            (Err(e), None) => {
                return Err(anyhow::Error::new(e).context(format!("step {index} ({op}) failed")));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
config:
  mint_policy: single-issue
  advocates: [advocate]
steps:
  - create_token: { caller: issuer, name: TestCompany, ticker: TST, granularity: 1 }
  - mint: { caller: issuer, company: TestCompany, amount: 1000 }
    expect_error: NotCleared
  - clear_request: { caller: advocate, company: TestCompany }
  - mint: { caller: issuer, company: TestCompany, amount: 1000, data: "initial" }
  - mint: { caller: issuer, company: TestCompany, amount: 1000 }
    expect_error: AlreadyMinted
  - send: { company: TestCompany, from: issuer, to: investor, amount: 250, tranche: 7 }
"#;

    fn engine_for(scenario: &Scenario) -> EquityEngine {
        EquityEngine::new(scenario.config.apply(EngineConfig::default()))
    }

    // ── Parsing ──────────────────────────────────────────────────────

    #[test]
    fn parses_steps_and_config() {
        let scenario = parse_scenario(BASIC).unwrap();
        assert_eq!(scenario.steps.len(), 6);
        assert_eq!(scenario.config.mint_policy, Some(MintPolicy::SingleIssue));
        assert_eq!(scenario.steps[1].expect_error, Some(ErrorKind::NotCleared));
        assert_eq!(scenario.steps[5].action.name(), "send");
    }

    #[test]
    fn unknown_operation_rejected() {
        let err = parse_scenario("steps:\n  - burn: { caller: issuer }\n").unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse scenario YAML"));
    }

    #[test]
    fn invalid_account_rejected_at_parse() {
        let yaml = "steps:\n  - grant_advocate: { account: \"  \" }\n";
        assert!(parse_scenario(yaml).is_err());
    }

    // ── Execution ────────────────────────────────────────────────────

    #[test]
    fn runs_with_expected_failures() {
        let scenario = parse_scenario(BASIC).unwrap();
        let engine = engine_for(&scenario);
        let report = run_scenario(&engine, &scenario).unwrap();
        assert_eq!(
            report,
            RunReport {
                steps: 6,
                expected_failures: 2
            }
        );
        let company = CompanyName::new("TestCompany").unwrap();
        let investor = AccountId::new("investor").unwrap();
        assert_eq!(engine.balance_of(&company, &investor).unwrap(), 250);
    }

    #[test]
    fn unexpected_failure_stops_run() {
        let yaml = r#"
steps:
  - create_token: { caller: issuer, name: TestCompany, ticker: TST, granularity: 1 }
  - mint: { caller: issuer, company: TestCompany, amount: 1000 }
  - send_message: { caller: issuer, company: TestCompany, text: "never reached" }
"#;
        let scenario = parse_scenario(yaml).unwrap();
        let engine = engine_for(&scenario);
        let err = run_scenario(&engine, &scenario).unwrap_err();
        assert!(err.to_string().contains("step 1 (mint) failed"));
        let company = CompanyName::new("TestCompany").unwrap();
        assert!(engine.disclosures(&company).unwrap().is_empty());
    }

    #[test]
    fn wrong_expected_kind_reported() {
        let yaml = r#"
steps:
  - create_token: { caller: issuer, name: TestCompany, ticker: TST, granularity: 1 }
  - create_token: { caller: issuer, name: TestCompany, ticker: TST, granularity: 1 }
    expect_error: NotFound
"#;
        let scenario = parse_scenario(yaml).unwrap();
        let err = run_scenario(&engine_for(&scenario), &scenario).unwrap_err();
        assert!(err.to_string().contains("expected NotFound, got DuplicateName"));
    }

    #[test]
    fn unexpected_success_reported() {
        let yaml = r#"
steps:
  - create_token: { caller: issuer, name: TestCompany, ticker: TST, granularity: 1 }
    expect_error: DuplicateName
"#;
        let scenario = parse_scenario(yaml).unwrap();
        let err = run_scenario(&engine_for(&scenario), &scenario).unwrap_err();
        assert!(err.to_string().contains("but it succeeded"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        std::fs::write(&path, BASIC).unwrap();
        let scenario = load_scenario(&path).unwrap();
        assert_eq!(scenario.steps.len(), 6);
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let err = load_scenario(&path).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }
}
