//! # Equity Engine
//!
//! The company registry and every caller-facing operation.
//!
//! Each mutation looks the company up under the registry read lock, then
//! holds that company's write lock across authorization, validation, the
//! state change and event emission. The event log lock is always taken last
//! and released first, so per-company event order equals commit order.

use std::collections::BTreeMap;
use std::ops::RangeBounds;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use eqs_core::{AccountId, Amount, CompanyId, CompanyName, Granularity, Ticker, Timestamp};
use eqs_events::{DisclosureMessage, EquityEvent, EventLog, EventRecord, Subscription};
use eqs_ledger::{LedgerError, MintReceipt, NewHolder, TransferReceipt, TransferRequest};
use eqs_state::{
    BallotError, BallotOutcome, BallotSlot, DelegationRecord, IssuanceState, Proposal, VoteRecord,
};

use crate::company::{Company, CompanyBook, CompanySnapshot};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::roles::{AdvocateRegistry, Role};

/// Opaque data attached to a mint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MintMetadata {
    /// Data supplied by the owner.
    pub data: Vec<u8>,
    /// Data supplied by an operator acting for the owner.
    pub operator_data: Vec<u8>,
}

type SharedBook = Arc<RwLock<CompanyBook>>;

/// The issuance and governance engine.
///
/// `Send + Sync`; share it behind an [`Arc`].
#[derive(Debug)]
pub struct EquityEngine {
    config: EngineConfig,
    advocates: RwLock<AdvocateRegistry>,
    companies: RwLock<BTreeMap<CompanyName, SharedBook>>,
    events: Arc<EventLog>,
}

impl Default for EquityEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EquityEngine {
    /// Create an engine with the advocates named in `config`.
    pub fn new(config: EngineConfig) -> Self {
        let advocates = AdvocateRegistry::new(config.advocates.iter().cloned());
        Self {
            config,
            advocates: RwLock::new(advocates),
            companies: RwLock::new(BTreeMap::new()),
            events: Arc::new(EventLog::new()),
        }
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Roles ────────────────────────────────────────────────────────

    /// Grant the advocate role. Returns `false` if already held.
    pub fn grant_advocate(&self, account: AccountId) -> bool {
        let granted = self.advocates.write().grant(account.clone());
        if granted {
            tracing::info!(advocate = %account, "advocate granted");
        }
        granted
    }

    /// Revoke the advocate role. Returns `false` if not held.
    pub fn revoke_advocate(&self, account: &AccountId) -> bool {
        let revoked = self.advocates.write().revoke(account);
        if revoked {
            tracing::info!(advocate = %account, "advocate revoked");
        }
        revoked
    }

    /// Whether `account` holds the advocate role.
    pub fn is_advocate(&self, account: &AccountId) -> bool {
        self.advocates.read().contains(account)
    }

    // ── Issuance ─────────────────────────────────────────────────────

    /// Request a new share class. `caller` becomes the company's owner.
    ///
    /// The zero account cannot own a company, since it could never receive
    /// the minted shares. Emits `TokenIssued`.
    pub fn create_token(
        &self,
        caller: &AccountId,
        name: &str,
        ticker: &str,
        granularity: u128,
    ) -> Result<CompanyId, EngineError> {
        self.register_token(caller, name, ticker, granularity)
            .map_err(|e| rejected("create_token", name, e))
    }

    fn register_token(
        &self,
        caller: &AccountId,
        name: &str,
        ticker: &str,
        granularity: u128,
    ) -> Result<CompanyId, EngineError> {
        if caller.is_zero() {
            return Err(LedgerError::InvalidRecipient {
                account: caller.clone(),
            }
            .into());
        }
        let name = CompanyName::new(name)?;
        let ticker = Ticker::new(ticker)?;
        let granularity = Granularity::new(granularity)?;

        let mut companies = self.companies.write();
        if companies.contains_key(&name) {
            return Err(EngineError::DuplicateName { name });
        }
        let company = Company {
            id: CompanyId::new(),
            name: name.clone(),
            ticker,
            granularity,
            owner: caller.clone(),
            created_at: Timestamp::now(),
        };
        let id = company.id;
        // Emitted before the registry lock is released, so no other event
        // of this company can precede it.
        self.emit(
            &company,
            EquityEvent::TokenIssued {
                company_name: name.clone(),
                company_owner: caller.clone(),
            },
        );
        companies.insert(name.clone(), Arc::new(RwLock::new(CompanyBook::new(company))));
        tracing::info!(company = %name, owner = %caller, %granularity, "token requested");
        Ok(id)
    }

    /// Clear `name`'s pending issuance request. Advocates only.
    pub fn clear_request(&self, caller: &AccountId, name: &CompanyName) -> Result<(), EngineError> {
        if !self.is_advocate(caller) {
            return Err(rejected(
                "clear_request",
                name,
                unauthorized(caller, Role::Advocate),
            ));
        }
        self.with_book_mut("clear_request", name, |book| {
            book.issuance.clear(caller)?;
            book.roles.compliance_officer = Some(caller.clone());
            tracing::info!(company = %name, advocate = %caller, "issuance cleared");
            Ok(())
        })
    }

    /// Mint `amount` new shares to the owner. Owner only, after clearance.
    ///
    /// Emits `Minted`, then `ShareholderAdded` if the owner was not yet a
    /// holder.
    pub fn mint(
        &self,
        caller: &AccountId,
        name: &CompanyName,
        amount: Amount,
        metadata: MintMetadata,
    ) -> Result<MintReceipt, EngineError> {
        self.with_book_mut("mint", name, |book| {
            require_owner(book, caller)?;
            book.issuance.check_mint(self.config.mint_policy)?;
            let receipt = book.ledger.mint(caller, amount)?;
            book.issuance.commit_mint(caller);

            self.emit(
                &book.company,
                EquityEvent::Minted {
                    to: caller.clone(),
                    amount,
                },
            );
            if let Some(holder) = &receipt.new_holder {
                self.emit(&book.company, shareholder_added(holder));
            }
            tracing::info!(
                company = %name,
                owner = %caller,
                amount = %amount,
                total_supply = %receipt.total_supply,
                data_len = metadata.data.len(),
                operator_data_len = metadata.operator_data.len(),
                "shares minted"
            );
            Ok(receipt)
        })
    }

    // ── Transfers ────────────────────────────────────────────────────

    /// Move shares between holders. `caller` must be the sender.
    ///
    /// Emits `Transferred`, then `ShareholderAdded` if the recipient is new.
    pub fn send(
        &self,
        caller: &AccountId,
        name: &CompanyName,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, EngineError> {
        self.with_book_mut("send", name, |book| {
            if caller != &request.from {
                return Err(unauthorized(caller, Role::Holder));
            }
            let receipt = book.ledger.send(request)?;

            self.emit(
                &book.company,
                EquityEvent::Transferred {
                    from: receipt.from.clone(),
                    to: receipt.to.clone(),
                    amount: receipt.amount,
                    tranche_id: receipt.tranche,
                },
            );
            if let Some(holder) = &receipt.new_holder {
                self.emit(&book.company, shareholder_added(holder));
            }
            tracing::info!(
                company = %name,
                from = %receipt.from,
                to = %receipt.to,
                amount = %receipt.amount,
                tranche = %receipt.tranche,
                "shares transferred"
            );
            Ok(receipt)
        })
    }

    // ── Disclosures ──────────────────────────────────────────────────

    /// Publish a disclosure. Owner only. Returns its position in the
    /// company's channel.
    ///
    /// Emits `DisclosureSent`.
    pub fn send_message(
        &self,
        caller: &AccountId,
        name: &CompanyName,
        text: impl Into<String>,
    ) -> Result<u64, EngineError> {
        let text = text.into();
        self.with_book_mut("send_message", name, |book| {
            require_owner(book, caller)?;
            let sequence = book.disclosures.len() as u64;
            let event = book.disclosures.publish(text);
            self.emit(&book.company, event);
            tracing::info!(company = %name, sequence, "disclosure sent");
            Ok(sequence)
        })
    }

    /// The company's disclosures in publication order.
    pub fn disclosures(&self, name: &CompanyName) -> Result<Vec<DisclosureMessage>, EngineError> {
        self.with_book(name, |book| book.disclosures.messages().to_vec())
    }

    // ── Ballot ───────────────────────────────────────────────────────

    /// Open a ballot over `proposal_names`, in order. Owner only.
    pub fn start_ballot<I, S>(
        &self,
        caller: &AccountId,
        name: &CompanyName,
        proposal_names: I,
    ) -> Result<Vec<Proposal>, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_book_mut("start_ballot", name, |book| {
            require_owner(book, caller)?;
            let proposals = book.ballot.start(proposal_names)?.proposals().to_vec();
            tracing::info!(company = %name, proposals = proposals.len(), "ballot started");
            Ok(proposals)
        })
    }

    /// Cast `caller`'s vote, weighted by their current balance plus that of
    /// anyone delegating to them.
    pub fn vote(
        &self,
        caller: &AccountId,
        name: &CompanyName,
        proposal: usize,
    ) -> Result<VoteRecord, EngineError> {
        self.with_book_mut("vote", name, |book| {
            let record = book.ballot.open_mut()?.vote(caller, proposal, &book.ledger)?;
            tracing::info!(
                company = %name,
                voter = %caller,
                proposal,
                weight = %record.weight,
                "vote cast"
            );
            Ok(record)
        })
    }

    /// Hand `caller`'s vote to `to`.
    pub fn delegate(
        &self,
        caller: &AccountId,
        name: &CompanyName,
        to: &AccountId,
    ) -> Result<DelegationRecord, EngineError> {
        self.with_book_mut("delegate", name, |book| {
            let record = book.ballot.open_mut()?.delegate(caller, to, &book.ledger)?;
            tracing::info!(
                company = %name,
                from = %caller,
                to = %record.to,
                applied = record.applied_weight.is_some(),
                "vote delegated"
            );
            Ok(record)
        })
    }

    /// Close the open ballot and record its winner. Owner only.
    ///
    /// Emits `VotingConcluded`.
    pub fn conclude_ballot(
        &self,
        caller: &AccountId,
        name: &CompanyName,
    ) -> Result<BallotOutcome, EngineError> {
        self.with_book_mut("conclude_ballot", name, |book| {
            require_owner(book, caller)?;
            let outcome = book.ballot.conclude()?;
            self.emit(
                &book.company,
                EquityEvent::VotingConcluded {
                    winner_name: outcome.winner_name.clone(),
                    vote_count: outcome.vote_count,
                },
            );
            tracing::info!(
                company = %name,
                winner = %outcome.winner_name,
                vote_count = %outcome.vote_count,
                "ballot concluded"
            );
            Ok(outcome)
        })
    }

    /// Index and state of the leading proposal, or of the recorded winner
    /// once the ballot is concluded.
    pub fn winning_proposal(&self, name: &CompanyName) -> Result<(usize, Proposal), EngineError> {
        self.with_book(name, |book| -> Result<_, EngineError> {
            let (index, proposal) = book.ballot.winning_proposal()?;
            Ok((index, proposal.clone()))
        })?
    }

    /// Proposals of the open ballot, or of the last concluded one.
    pub fn proposals(&self, name: &CompanyName) -> Result<Vec<Proposal>, EngineError> {
        self.with_book(name, |book| -> Result<_, EngineError> {
            Ok(proposal_view(&book.ballot)?.to_vec())
        })?
    }

    /// Tally of the proposal at `index`.
    pub fn vote_count(&self, name: &CompanyName, index: usize) -> Result<Amount, EngineError> {
        self.with_book(name, |book| -> Result<_, EngineError> {
            let proposals = proposal_view(&book.ballot)?;
            proposals
                .get(index)
                .map(|p| p.vote_count)
                .ok_or(EngineError::Ballot(BallotError::InvalidProposal {
                    index,
                    count: proposals.len(),
                }))
        })?
    }

    /// Whether `account` has voted or delegated in the open ballot.
    pub fn has_voted(&self, name: &CompanyName, account: &AccountId) -> Result<bool, EngineError> {
        self.with_book(name, |book| -> Result<_, EngineError> {
            Ok(book.ballot.open()?.has_voted(account))
        })?
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// `account`'s balance.
    pub fn balance_of(&self, name: &CompanyName, account: &AccountId) -> Result<Amount, EngineError> {
        self.with_book(name, |book| book.ledger.balance_of(account))
    }

    /// Sum of all balances.
    pub fn total_supply(&self, name: &CompanyName) -> Result<Amount, EngineError> {
        self.with_book(name, |book| book.ledger.total_supply())
    }

    /// Shareholder registry in entry order.
    pub fn registry_snapshot(&self, name: &CompanyName) -> Result<Vec<AccountId>, EngineError> {
        self.with_book(name, |book| book.ledger.registry_snapshot())
    }

    /// The registration record.
    pub fn company(&self, name: &CompanyName) -> Result<Company, EngineError> {
        self.with_book(name, |book| book.company.clone())
    }

    /// Where the company's issuance request stands.
    pub fn issuance_state(&self, name: &CompanyName) -> Result<IssuanceState, EngineError> {
        self.with_book(name, |book| book.issuance.state)
    }

    /// A consistent owned view of the whole company.
    pub fn snapshot(&self, name: &CompanyName) -> Result<CompanySnapshot, EngineError> {
        self.with_book(name, CompanyBook::snapshot)
    }

    /// Recheck the supply invariant of one company.
    pub fn verify(&self, name: &CompanyName) -> Result<(), EngineError> {
        self.with_book(name, |book| book.ledger.verify_supply())?
            .map_err(EngineError::from)
    }

    /// Registered company names in order.
    pub fn companies(&self) -> Vec<CompanyName> {
        self.companies.read().keys().cloned().collect()
    }

    // ── Events ───────────────────────────────────────────────────────

    /// The shared event log.
    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    /// Events whose sequence numbers fall in `range`.
    pub fn history(&self, range: impl RangeBounds<u64>) -> Vec<EventRecord> {
        self.events.range(range)
    }

    /// One company's events whose sequence numbers fall in `range`.
    pub fn history_for(
        &self,
        name: &CompanyName,
        range: impl RangeBounds<u64>,
    ) -> Result<Vec<EventRecord>, EngineError> {
        let id = self.with_book(name, |book| book.company.id)?;
        Ok(self.events.range_for(id, range))
    }

    /// A cursor that sees only events appended from now on.
    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    /// A cursor that replays from `position`, then tails.
    pub fn subscribe_from(&self, position: u64) -> Subscription {
        self.events.subscribe_from(position)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn book(&self, name: &CompanyName) -> Result<SharedBook, EngineError> {
        self.companies
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound { name: name.clone() })
    }

    fn with_book<R>(
        &self,
        name: &CompanyName,
        f: impl FnOnce(&CompanyBook) -> R,
    ) -> Result<R, EngineError> {
        let book = self.book(name)?;
        let guard = book.read();
        Ok(f(&*guard))
    }

    /// Run `f` under the company's write lock, logging a rejection.
    fn with_book_mut<R>(
        &self,
        op: &'static str,
        name: &CompanyName,
        f: impl FnOnce(&mut CompanyBook) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let result = self.book(name).and_then(|book| {
            let mut guard = book.write();
            f(&mut *guard)
        });
        result.map_err(|e| rejected(op, name, e))
    }

    fn emit(&self, company: &Company, event: EquityEvent) -> u64 {
        let sequence = self.events.append(company.id, &company.name, event.clone());
        tracing::debug!(company = %company.name, sequence, %event, "event emitted");
        sequence
    }
}

fn rejected(op: &'static str, company: impl std::fmt::Display, err: EngineError) -> EngineError {
    tracing::warn!(op, %company, kind = %err.kind(), error = %err, "operation rejected");
    err
}

fn unauthorized(account: &AccountId, role: Role) -> EngineError {
    EngineError::Unauthorized {
        account: account.clone(),
        role,
    }
}

fn require_owner(book: &CompanyBook, caller: &AccountId) -> Result<(), EngineError> {
    if book.roles.is_owner(caller) {
        Ok(())
    } else {
        Err(unauthorized(caller, Role::Owner))
    }
}

fn shareholder_added(holder: &NewHolder) -> EquityEvent {
    EquityEvent::ShareholderAdded {
        new_shareholder: holder.account.clone(),
        total_shareholder_count: holder.holder_count,
    }
}

fn proposal_view(slot: &BallotSlot) -> Result<&[Proposal], BallotError> {
    match slot {
        BallotSlot::Open(b) => Ok(b.proposals()),
        BallotSlot::Closed(outcome) => Ok(&outcome.proposals),
        BallotSlot::NotStarted => Err(BallotError::NotOpen),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
