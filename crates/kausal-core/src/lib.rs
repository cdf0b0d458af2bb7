//! Kausal Core - Logical clocks, event types, and duplicate detection.
//!
//! This crate contains the value types shared by every consumer: the
//! owner-axis logical clock, the external/internal event variants, and the
//! duplicate guard. It has no dependencies on other Kausal crates.

pub mod clock;
pub mod dedup;
pub mod error;
pub mod event;
pub mod producer;

// Re-exports for convenience
pub use clock::LogicalClock;
pub use dedup::DuplicateGuard;
pub use error::DuplicateError;
pub use event::{ClockedEvent, Clocked, EventId, EventKind, ExternalEvent, InternalStateEvent};
pub use producer::ProducerId;
