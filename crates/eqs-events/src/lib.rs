//! # eqs-events — Events, Event Log and Disclosures
//!
//! Everything observable about the engine is an [`EquityEvent`] appended to
//! one [`EventLog`]. Each appended event gets a sequence number, which is
//! also its position in the log.
//!
//! Historical replay and live tailing are the same read: a [`Subscription`]
//! holds a position and returns every event from there on. A subscriber
//! created with [`EventLog::subscribe`] starts at the current end (future
//! events only) and can still ask the log for the earlier range separately.
//!
//! [`DisclosureChannel`] is a company's own append-only message log; each
//! published message is also announced as a `DisclosureSent` event.

pub mod disclosure;
pub mod event;
pub mod log;

pub use disclosure::{DisclosureChannel, DisclosureMessage};
pub use event::{EquityEvent, EventRecord};
pub use log::{EventLog, Subscription};
