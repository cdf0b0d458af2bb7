//! Kausal Sourcing - Source-then-process consumers and their delivery plumbing.

pub mod consumer;
pub mod delivery;
pub mod error;
pub mod fan_in;
pub mod recovery;

pub use consumer::{BeforeProcessingHook, Disposition, Mode, SourceProcessConsumer};
pub use delivery::{deliver, deliver_one, DeliveryReport};
pub use error::{ConsumerError, Rejection};
pub use fan_in::fan_in;
pub use recovery::recover;
