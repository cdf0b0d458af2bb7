use std::collections::HashSet;

use crate::error::DuplicateError;
use crate::event::EventId;

/// Set of external event identities a consumer has already seen.
///
/// Only grows. A resubmitted identity is rejected rather than overwritten.
#[derive(Debug, Default, Clone)]
pub struct DuplicateGuard {
    seen: HashSet<EventId>,
}

impl DuplicateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`, failing if it was recorded before.
    pub fn add(&mut self, id: EventId) -> Result<(), DuplicateError> {
        if !self.seen.insert(id) {
            return Err(DuplicateError(id));
        }
        Ok(())
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
