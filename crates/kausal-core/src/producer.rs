use serde::{Deserialize, Serialize};

/// Unique identifier for an event producer.
///
/// A consumer that commits its own state events is a producer too; its
/// owner id is a `ProducerId` like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProducerId(pub u64);

impl std::fmt::Display for ProducerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "producer-{}", self.0)
    }
}

impl From<u64> for ProducerId {
    fn from(id: u64) -> Self {
        ProducerId(id)
    }
}
