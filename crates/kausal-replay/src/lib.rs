//! Kausal Replay - Recover a consumer from a journal file.

pub mod config;
pub mod journal;
pub mod replay;

pub use config::{Config, ConfigError, SwitchMode};
pub use journal::{Journal, JournalError, StateValue};
pub use replay::{replay, run, ReplayReport};
