//! # Event Log
//!
//! Append-only, sequenced, shared between writers and any number of readers.
//! A record's sequence number equals its index, so range queries are slices.

use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use parking_lot::RwLock;

use eqs_core::{CompanyId, CompanyName, Timestamp};

use crate::event::{EquityEvent, EventRecord};

/// The engine-wide event log.
#[derive(Debug, Default)]
pub struct EventLog {
    records: RwLock<Vec<EventRecord>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` for `company` and return its sequence number.
    pub fn append(&self, company: CompanyId, company_name: &CompanyName, event: EquityEvent) -> u64 {
        let mut records = self.records.write();
        let sequence = records.len() as u64;
        records.push(EventRecord {
            sequence,
            company,
            company_name: company_name.clone(),
            timestamp: Timestamp::now(),
            event,
        });
        sequence
    }

    /// Number of events appended so far; also the next sequence number.
    pub fn len(&self) -> u64 {
        self.records.read().len() as u64
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Events whose sequence numbers fall in `range`, in order.
    ///
    /// Out-of-range bounds are clamped; an empty or inverted range yields
    /// nothing.
    pub fn range(&self, range: impl RangeBounds<u64>) -> Vec<EventRecord> {
        let records = self.records.read();
        let len = records.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => clamp(s, len),
            Bound::Excluded(&s) => clamp(s.saturating_add(1), len),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => clamp(e.saturating_add(1), len),
            Bound::Excluded(&e) => clamp(e, len),
            Bound::Unbounded => len,
        };
        if start >= end {
            return Vec::new();
        }
        records[start..end].to_vec()
    }

    /// Events of one company whose sequence numbers fall in `range`.
    pub fn range_for(&self, company: CompanyId, range: impl RangeBounds<u64>) -> Vec<EventRecord> {
        self.range(range)
            .into_iter()
            .filter(|r| r.company == company)
            .collect()
    }

    /// A cursor positioned at the current end: it sees future events only.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let position = self.len();
        self.subscribe_from(position)
    }

    /// A cursor positioned at `position`: it replays from there, then tails.
    pub fn subscribe_from(self: &Arc<Self>, position: u64) -> Subscription {
        Subscription {
            log: Arc::clone(self),
            position,
            company: None,
        }
    }
}

fn clamp(bound: u64, len: usize) -> usize {
    usize::try_from(bound).map_or(len, |b| b.min(len))
}

/// A reader's position in the [`EventLog`].
#[derive(Debug, Clone)]
pub struct Subscription {
    log: Arc<EventLog>,
    position: u64,
    company: Option<CompanyId>,
}

impl Subscription {
    /// Restrict delivered events to one company. The cursor still advances
    /// over other companies' events.
    pub fn for_company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    /// Sequence number of the next event this cursor will read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// All events appended since the last poll, advancing the cursor.
    pub fn poll(&mut self) -> Vec<EventRecord> {
        let batch = self.log.range(self.position..);
        if let Some(last) = batch.last() {
            self.position = last.sequence + 1;
        }
        match self.company {
            Some(company) => batch.into_iter().filter(|r| r.company == company).collect(),
            None => batch,
        }
    }
}
