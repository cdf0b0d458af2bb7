use tokio::sync::mpsc::Receiver;

use kausal_core::ClockedEvent;

use crate::consumer::{Disposition, SourceProcessConsumer};
use crate::error::Rejection;

/// Statistics from a delivery run.
#[derive(Debug, Clone)]
pub struct DeliveryReport<V> {
    pub delivered: usize,
    pub already_sourced: usize,
    pub sourced: usize,
    pub committed: usize,
    pub rejected: Vec<Rejection<V>>,
}

impl<V> Default for DeliveryReport<V> {
    fn default() -> Self {
        Self {
            delivered: 0,
            already_sourced: 0,
            sourced: 0,
            committed: 0,
            rejected: Vec::new(),
        }
    }
}

impl<V> DeliveryReport<V> {
    /// Fold another report into this one.
    pub fn absorb(&mut self, other: DeliveryReport<V>) {
        self.delivered += other.delivered;
        self.already_sourced += other.already_sourced;
        self.sourced += other.sourced;
        self.committed += other.committed;
        self.rejected.extend(other.rejected);
    }
}

/// Hand one event to the consumer and account for the outcome.
pub fn deliver_one<V: Clone + Default>(
    consumer: &mut SourceProcessConsumer<V>,
    event: ClockedEvent<V>,
    report: &mut DeliveryReport<V>,
) {
    report.delivered += 1;
    match consumer.offer(event) {
        Ok(Disposition::AlreadySourced) => report.already_sourced += 1,
        Ok(Disposition::Sourced) => report.sourced += 1,
        Ok(Disposition::Committed) => report.committed += 1,
        Err(rejection) => {
            tracing::warn!("{} rejected event: {}", consumer.owner(), rejection.error);
            report.rejected.push(rejection);
        }
    }
}

/// Drain `events` into the consumer, one at a time, until the channel closes.
pub async fn deliver<V: Clone + Default>(
    consumer: &mut SourceProcessConsumer<V>,
    mut events: Receiver<ClockedEvent<V>>,
) -> DeliveryReport<V> {
    let mut report = DeliveryReport::default();
    while let Some(event) = events.recv().await {
        deliver_one(consumer, event, &mut report);
    }

    tracing::info!(
        "Delivered {} events to {}: {} committed, {} sourced, {} rejected",
        report.delivered,
        consumer.owner(),
        report.committed,
        report.sourced,
        report.rejected.len()
    );
    report
}
