use thiserror::Error;

use crate::event::EventId;

/// An external event identity was submitted more than once.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Duplicate event: {0}")]
pub struct DuplicateError(pub EventId);

impl DuplicateError {
    pub fn event_id(&self) -> EventId {
        self.0
    }
}
