use thiserror::Error;

use kausal_core::{ClockedEvent, DuplicateError, EventKind, LogicalClock};

/// Errors returned by a source/process consumer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsumerError {
    #[error("Event out of order: {event} is not after {current}")]
    OutOfOrder {
        event: LogicalClock,
        current: LogicalClock,
    },

    #[error(transparent)]
    Duplicate(#[from] DuplicateError),

    #[error("Not synced: sourced clock {sourced} differs from authoritative clock {authoritative}")]
    NotSynced {
        sourced: LogicalClock,
        authoritative: LogicalClock,
    },

    #[error("Unsupported event kind while processing: {0}")]
    UnsupportedEventKind(EventKind),
}

impl ConsumerError {
    pub fn is_out_of_order(&self) -> bool {
        matches!(self, ConsumerError::OutOfOrder { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, ConsumerError::Duplicate(_))
    }
}

/// An event the consumer refused, with the reason.
#[derive(Debug, Clone)]
pub struct Rejection<V> {
    pub event: ClockedEvent<V>,
    pub error: ConsumerError,
}

impl<V> Rejection<V> {
    pub fn new(event: impl Into<ClockedEvent<V>>, error: impl Into<ConsumerError>) -> Self {
        Self {
            event: event.into(),
            error: error.into(),
        }
    }
}
