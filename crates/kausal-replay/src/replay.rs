use std::path::Path;

use serde::{Deserialize, Serialize};

use kausal_core::{InternalStateEvent, LogicalClock, ProducerId};
use kausal_sourcing::{recover, Mode, SourceProcessConsumer};

use crate::config::{Config, SwitchMode};
use crate::journal::{read_json, write_json, Journal, JournalError, StateValue};

/// Outcome of replaying a journal into a fresh consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub owner: ProducerId,
    pub mode: Mode,
    pub synced: bool,
    pub state: StateValue,
    pub vector_clock: LogicalClock,
    pub sourced_clock: LogicalClock,
    pub delivered: usize,
    /// State events committed during the replay itself.
    pub committed: Vec<InternalStateEvent<StateValue>>,
    pub rejections: Vec<String>,
}

impl ReplayReport {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        read_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), JournalError> {
        write_json(path.as_ref(), self)
    }
}

/// Replay `journal` into a fresh consumer built from `config`.
pub async fn replay(config: &Config, journal: Journal) -> ReplayReport {
    let mut consumer = match config.switch_mode {
        SwitchMode::Auto => SourceProcessConsumer::new_auto(config.owner),
        SwitchMode::Manual => SourceProcessConsumer::new_manual(config.owner),
    };

    let report = recover(
        &mut consumer,
        journal.state_events,
        journal.streams,
        config.channel_capacity,
    )
    .await;

    let mut rejections: Vec<String> = report
        .rejected
        .iter()
        .map(|r| r.error.to_string())
        .collect();

    if config.switch_mode == SwitchMode::Manual {
        if let Err(e) = consumer.enter_processing() {
            tracing::warn!("{} stays in sourcing mode: {}", config.owner, e);
            rejections.push(e.to_string());
        }
    }

    ReplayReport {
        owner: consumer.owner(),
        mode: consumer.mode(),
        synced: consumer.is_synced(),
        state: consumer.state().clone(),
        vector_clock: consumer.vector_clock().clone(),
        sourced_clock: consumer.sourced_clock().clone(),
        delivered: report.delivered,
        committed: consumer.output_log().to_vec(),
        rejections,
    }
}

/// Load the configured journal, replay it, and write the report.
pub async fn run(config: &Config) -> Result<ReplayReport, JournalError> {
    let journal = Journal::load(&config.journal_path)?;
    tracing::info!(
        "Loaded {} events from {}",
        journal.len(),
        config.journal_path.display()
    );

    let report = replay(config, journal).await;
    report.save(&config.output_path)?;
    tracing::info!(
        "Replay finished in {} mode, report written to {}",
        report.mode,
        config.output_path.display()
    );
    Ok(report)
}
