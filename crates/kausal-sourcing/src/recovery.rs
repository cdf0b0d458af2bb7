use tokio::sync::mpsc;

use kausal_core::{ClockedEvent, ExternalEvent, InternalStateEvent};

use crate::consumer::SourceProcessConsumer;
use crate::delivery::{deliver, deliver_one, DeliveryReport};
use crate::fan_in::fan_in;

/// Replay a consumer's prior state log, then the external streams it consumed.
///
/// The state log is delivered first, in order. Each external stream gets its
/// own bounded channel of `capacity` and the streams are merged round robin,
/// which keeps every stream's own order intact.
pub async fn recover<V>(
    consumer: &mut SourceProcessConsumer<V>,
    state_log: Vec<InternalStateEvent<V>>,
    external_streams: Vec<Vec<ExternalEvent<V>>>,
    capacity: usize,
) -> DeliveryReport<V>
where
    V: Clone + Default + Send + 'static,
{
    let mut report = DeliveryReport::default();

    tracing::info!(
        "Recovering {} from {} state events and {} streams",
        consumer.owner(),
        state_log.len(),
        external_streams.len()
    );
    for event in state_log {
        deliver_one(consumer, event.into(), &mut report);
    }

    let capacity = capacity.max(1);
    let mut inputs = Vec::with_capacity(external_streams.len());
    for stream in external_streams {
        let (tx, rx) = mpsc::channel::<ClockedEvent<V>>(capacity);
        inputs.push(rx);
        tokio::spawn(async move {
            for event in stream {
                if tx.send(event.into()).await.is_err() {
                    break;
                }
            }
        });
    }

    let (out_tx, out_rx) = mpsc::channel(capacity);
    tokio::spawn(fan_in(inputs, out_tx));

    report.absorb(deliver(consumer, out_rx).await);
    report
}
