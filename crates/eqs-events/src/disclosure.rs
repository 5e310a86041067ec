//! # Disclosure Channel
//!
//! A company's append-only log of ad-hoc announcements. Messages are
//! immutable once published and kept in publication order. No size or rate
//! limit applies.

use serde::{Deserialize, Serialize};

use eqs_core::Timestamp;

use crate::event::EquityEvent;

/// A published disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureMessage {
    /// Position in this company's channel, starting at zero.
    pub sequence: u64,
    /// When the message was published.
    pub published_at: Timestamp,
    /// Message text.
    pub text: String,
}

/// A company's disclosure log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisclosureChannel {
    messages: Vec<DisclosureMessage>,
}

impl DisclosureChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` and return the event announcing it.
    pub fn publish(&mut self, text: impl Into<String>) -> EquityEvent {
        let text = text.into();
        self.messages.push(DisclosureMessage {
            sequence: self.messages.len() as u64,
            published_at: Timestamp::now(),
            text: text.clone(),
        });
        EquityEvent::DisclosureSent { message: text }
    }

    /// All messages in publication order.
    pub fn messages(&self) -> &[DisclosureMessage] {
        &self.messages
    }

    /// Number of published messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
