//! # Cross-Crate Equity Flows
//!
//! End-to-end runs of the engine: issuance through governance, the
//! clearance gate, weighted voting, disclosure delivery and racing
//! transfers.

use std::sync::Arc;
use std::thread;

use eqs_core::{AccountId, Amount, CompanyName, TrancheId};
use eqs_engine::{EngineConfig, EquityEngine, ErrorKind, MintMetadata};
use eqs_events::EquityEvent;
use eqs_ledger::TransferRequest;
use eqs_state::{IssuanceState, MintPolicy};

const TRANCHE: TrancheId = TrancheId(505_122_836_950);

fn account(s: &str) -> AccountId {
    AccountId::new(s).unwrap()
}

fn company() -> CompanyName {
    CompanyName::new("TestCompany").unwrap()
}

fn engine() -> EquityEngine {
    EquityEngine::new(EngineConfig::default().with_advocate(account("advocate")))
}

fn transfer(from: &str, to: &str, amount: Amount) -> TransferRequest {
    TransferRequest {
        tranche: TRANCHE,
        from: account(from),
        to: account(to),
        amount,
        metadata: Vec::new(),
    }
}

/// Issue, clear and mint `supply` shares of TestCompany to `issuer`.
fn issued(supply: Amount) -> EquityEngine {
    let engine = engine();
    engine
        .create_token(&account("issuer"), "TestCompany", "TST", 1)
        .unwrap();
    engine
        .clear_request(&account("advocate"), &company())
        .unwrap();
    engine
        .mint(&account("issuer"), &company(), supply, MintMetadata::default())
        .unwrap();
    engine
}

// =========================================================================
// Issuance through governance
// =========================================================================

#[test]
fn end_to_end_issue_transfer_vote() {
    let engine = engine();
    let issuer = account("issuer");
    let investor = account("investor");
    let name = company();

    engine
        .create_token(&issuer, "TestCompany", "TST", 1)
        .unwrap();
    engine.clear_request(&account("advocate"), &name).unwrap();
    engine
        .mint(&issuer, &name, 1_000, MintMetadata::default())
        .unwrap();
    engine
        .send(&issuer, &name, &transfer("issuer", "investor", 100))
        .unwrap();

    assert_eq!(engine.balance_of(&name, &issuer).unwrap(), 900);
    assert_eq!(engine.balance_of(&name, &investor).unwrap(), 100);
    assert_eq!(engine.total_supply(&name).unwrap(), 1_000);
    assert_eq!(
        engine.registry_snapshot(&name).unwrap(),
        vec![issuer.clone(), investor.clone()]
    );

    engine
        .start_ballot(&issuer, &name, ["approve", "reject"])
        .unwrap();
    engine.vote(&investor, &name, 0).unwrap();
    assert_eq!(engine.vote_count(&name, 0).unwrap(), 100);
    let (index, winner) = engine.winning_proposal(&name).unwrap();
    assert_eq!(index, 0);
    assert_eq!(winner.name.as_str(), "approve");

    let outcome = engine.conclude_ballot(&issuer, &name).unwrap();
    assert_eq!(outcome.vote_count, 100);

    let names: Vec<_> = engine
        .history_for(&name, ..)
        .unwrap()
        .iter()
        .map(|r| r.event.name())
        .collect();
    assert_eq!(
        names,
        vec![
            "TokenIssued",
            "Minted",
            "ShareholderAdded",
            "Transferred",
            "ShareholderAdded",
            "VotingConcluded",
        ]
    );
}

#[test]
fn clearance_gate_blocks_mint() {
    let engine = engine();
    let issuer = account("issuer");
    engine
        .create_token(&issuer, "TestCompany", "TST", 1)
        .unwrap();

    let err = engine
        .mint(&issuer, &company(), 1_000, MintMetadata::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotCleared);
    assert_eq!(engine.total_supply(&company()).unwrap(), 0);
    assert!(engine.registry_snapshot(&company()).unwrap().is_empty());
    assert_eq!(
        engine.issuance_state(&company()).unwrap(),
        IssuanceState::Requested
    );
}

#[test]
fn single_issue_policy_from_config() {
    let engine = EquityEngine::new(
        EngineConfig::default()
            .with_advocate(account("advocate"))
            .with_mint_policy(MintPolicy::SingleIssue),
    );
    let issuer = account("issuer");
    engine
        .create_token(&issuer, "TestCompany", "TST", 1)
        .unwrap();
    engine
        .clear_request(&account("advocate"), &company())
        .unwrap();
    engine
        .mint(&issuer, &company(), 10, MintMetadata::default())
        .unwrap();
    let err = engine
        .mint(&issuer, &company(), 10, MintMetadata::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyMinted);
}

#[test]
fn companies_are_isolated() {
    let engine = issued(1_000);
    engine
        .create_token(&account("other_issuer"), "OtherCompany", "OTH", 1)
        .unwrap();
    let other = CompanyName::new("OtherCompany").unwrap();

    assert_eq!(engine.total_supply(&other).unwrap(), 0);
    let err = engine
        .send_message(&account("issuer"), &other, "not mine")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(engine.companies(), vec![other, company()]);
}

// =========================================================================
// Voting
// =========================================================================

#[test]
fn vote_weight_equals_balance_at_vote_time() {
    let engine = issued(1_000);
    let issuer = account("issuer");
    engine
        .start_ballot(&issuer, &company(), ["a", "b"])
        .unwrap();
    engine
        .send(&issuer, &company(), &transfer("issuer", "investor", 400))
        .unwrap();
    engine.vote(&account("investor"), &company(), 1).unwrap();
    engine.vote(&issuer, &company(), 0).unwrap();

    assert_eq!(engine.vote_count(&company(), 0).unwrap(), 600);
    assert_eq!(engine.vote_count(&company(), 1).unwrap(), 400);
}

#[test]
fn zero_balance_vote_is_inert_but_final() {
    let engine = issued(1_000);
    let outsider = account("outsider");
    engine
        .start_ballot(&account("issuer"), &company(), ["a", "b"])
        .unwrap();
    let record = engine.vote(&outsider, &company(), 1).unwrap();
    assert_eq!(record.weight, 0);
    assert_eq!(engine.vote_count(&company(), 1).unwrap(), 0);
    let err = engine.vote(&outsider, &company(), 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyVoted);
}

#[test]
fn tie_break_prefers_earliest_proposal() {
    let engine = issued(300);
    let issuer = account("issuer");
    engine
        .send(&issuer, &company(), &transfer("issuer", "x", 100))
        .unwrap();
    engine
        .send(&issuer, &company(), &transfer("issuer", "y", 100))
        .unwrap();
    engine
        .start_ballot(&issuer, &company(), ["first", "second", "third"])
        .unwrap();
    engine.vote(&account("x"), &company(), 2).unwrap();
    engine.vote(&account("y"), &company(), 1).unwrap();

    let (index, winner) = engine.winning_proposal(&company()).unwrap();
    assert_eq!(index, 1);
    assert_eq!(winner.name.as_str(), "second");
}

#[test]
fn delegation_chain_reaches_final_delegate() {
    let engine = issued(600);
    let issuer = account("issuer");
    for who in ["a", "b", "c"] {
        engine
            .send(&issuer, &company(), &transfer("issuer", who, 100))
            .unwrap();
    }
    engine
        .start_ballot(&issuer, &company(), ["yes", "no"])
        .unwrap();
    engine
        .delegate(&account("a"), &company(), &account("b"))
        .unwrap();
    let record = engine
        .delegate(&account("b"), &company(), &account("c"))
        .unwrap();
    assert_eq!(record.to, account("c"));

    let err = engine
        .delegate(&account("c"), &company(), &account("a"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DelegationCycle);

    let vote = engine.vote(&account("c"), &company(), 1).unwrap();
    assert_eq!(vote.weight, 300);

    // Late delegation to someone who already voted lands immediately.
    let record = engine
        .delegate(&issuer, &company(), &account("a"))
        .unwrap();
    assert_eq!(record.to, account("c"));
    assert_eq!(record.applied_weight, Some(300));
    assert_eq!(engine.vote_count(&company(), 1).unwrap(), 600);
}

// =========================================================================
// Disclosures and subscriptions
// =========================================================================

#[test]
fn disclosures_arrive_in_order() {
    let engine = issued(1);
    let mut live = engine.subscribe();
    let texts = ["first", "second", "third"];
    for text in texts {
        engine
            .send_message(&account("issuer"), &company(), text)
            .unwrap();
    }

    let delivered: Vec<_> = live
        .poll()
        .into_iter()
        .map(|r| match r.event {
            EquityEvent::DisclosureSent { message } => message,
            other => panic!("unexpected event {other}"),
        })
        .collect();
    assert_eq!(delivered, texts);

    let stored: Vec<_> = engine
        .disclosures(&company())
        .unwrap()
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(stored, texts);
}

#[test]
fn disclosure_is_recorded_once_in_history() {
    let engine = issued(1);
    let before = engine.history(..).len() as u64;
    engine
        .send_message(&account("issuer"), &company(), "EBIT warning")
        .unwrap();

    let is_warning = |event: &EquityEvent| {
        matches!(event, EquityEvent::DisclosureSent { message } if message == "EBIT warning")
    };

    let all = engine.history(..);
    assert_eq!(all.iter().filter(|r| is_warning(&r.event)).count(), 1);

    let scoped = engine.history_for(&company(), before..).unwrap();
    assert_eq!(scoped.len(), 1);
    assert!(is_warning(&scoped[0].event));

    // A subscriber attached after the fact still finds it by replay.
    let mut late = engine.subscribe_from(0);
    let replayed = late.poll();
    assert_eq!(replayed.iter().filter(|r| is_warning(&r.event)).count(), 1);
    assert!(late.poll().is_empty());

    // One attached at the tail does not see it again.
    let mut tail = engine.subscribe();
    assert!(tail.poll().is_empty());
}

#[test]
fn subscriber_filtered_by_company() {
    let engine = issued(1);
    engine
        .create_token(&account("other"), "OtherCompany", "OTH", 1)
        .unwrap();
    let id = engine.company(&company()).unwrap().id;
    let mut sub = engine.subscribe_from(0).for_company(id);
    let records = sub.poll();
    assert!(records.iter().all(|r| r.company == id));
    assert_eq!(records.len(), 3);
    assert_eq!(sub.position(), engine.events().len());
}

#[test]
fn event_json_uses_camel_case_fields() {
    let engine = issued(1);
    let records = engine.history(..);
    let json = serde_json::to_value(&records[0].event).unwrap();
    assert_eq!(json["TokenIssued"]["companyName"], "TestCompany");
    assert_eq!(json["TokenIssued"]["companyOwner"], "issuer");
    let json = serde_json::to_value(&records[2].event).unwrap();
    assert_eq!(json["ShareholderAdded"]["totalShareholderCount"], 1);
}

// =========================================================================
// Concurrency
// =========================================================================

#[test]
fn racing_transfers_from_one_account_never_overdraw() {
    let engine = Arc::new(issued(1_000));
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let to = format!("buyer_{i}");
                engine
                    .send(&account("issuer"), &company(), &transfer("issuer", &to, 100))
                    .is_ok()
            })
        })
        .collect();
    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(accepted, 10);
    assert_eq!(engine.balance_of(&company(), &account("issuer")).unwrap(), 0);
    assert_eq!(engine.total_supply(&company()).unwrap(), 1_000);
    assert_eq!(engine.registry_snapshot(&company()).unwrap().len(), 11);
    engine.verify(&company()).unwrap();
}

#[test]
fn concurrent_readers_see_consistent_supply() {
    let engine = Arc::new(issued(1_000));
    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..50 {
                let to = format!("holder_{i}");
                engine
                    .send(&account("issuer"), &company(), &transfer("issuer", &to, 10))
                    .unwrap();
            }
        })
    };
    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..200 {
                let snap = engine.snapshot(&company()).unwrap();
                let sum: Amount = snap.balances.iter().map(|(_, b)| *b).sum();
                assert_eq!(sum, snap.total_supply);
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();
}

// =========================================================================
// CLI boundary
// =========================================================================

#[test]
fn scenario_file_drives_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flow.yaml");
    std::fs::write(
        &path,
        r#"
config:
  advocates: [advocate]
steps:
  - create_token: { caller: issuer, name: TestCompany, ticker: TST, granularity: 10 }
  - clear_request: { caller: advocate, company: TestCompany }
  - mint: { caller: issuer, company: TestCompany, amount: 1000 }
  - send: { company: TestCompany, from: issuer, to: investor, amount: 15 }
    expect_error: GranularityViolation
  - send: { company: TestCompany, from: issuer, to: "0x0000000000000000000000000000000000000000", amount: 10 }
    expect_error: InvalidRecipient
  - send: { caller: investor, company: TestCompany, from: issuer, to: investor, amount: 10 }
    expect_error: Unauthorized
"#,
    )
    .unwrap();

    let scenario = eqs_cli::scenario::load_scenario(&path).unwrap();
    let (report, events) = eqs_cli::execute(EngineConfig::default(), &scenario, None).unwrap();
    assert_eq!(report.expected_failures, 3);
    assert_eq!(events.len(), 3);
}
