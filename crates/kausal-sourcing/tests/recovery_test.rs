//! Recovery of a consumer from its own state log plus the original events.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use kausal_core::{ClockedEvent, ExternalEvent, LogicalClock, ProducerId};
use kausal_sourcing::{recover, Mode, SourceProcessConsumer};

const OWNER: ProducerId = ProducerId(1);

/// Events emitted by a set of producers, in emission order.
struct Timeline {
    clocks: BTreeMap<ProducerId, LogicalClock>,
    // producers merge each other's clocks on every tick
    shared: bool,
    events: Vec<ExternalEvent<String>>,
}

impl Timeline {
    fn build(shared: bool, steps: &[(u64, u64)]) -> Self {
        let producers: BTreeSet<_> = steps.iter().map(|&(p, _)| ProducerId(p)).collect();
        let mut timeline = Timeline {
            clocks: producers
                .into_iter()
                .map(|p| (p, LogicalClock::new(p)))
                .collect(),
            shared,
            events: Vec::new(),
        };
        for (i, &(producer, step)) in steps.iter().enumerate() {
            timeline.add(ProducerId(producer), step, format!("p{producer}-{i}"));
        }
        timeline
    }

    fn add(&mut self, producer: ProducerId, step: u64, state: String) {
        let mut clock = self.clocks[&producer].clone();
        for _ in 0..step {
            clock = self.increment(producer);
            self.clocks.insert(producer, clock.clone());
        }
        self.events.push(ExternalEvent::new(clock, state));
    }

    fn increment(&self, producer: ProducerId) -> LogicalClock {
        let clock = self.clocks[&producer].inc();
        if !self.shared {
            return clock;
        }
        self.clocks.values().fold(clock, |c, other| c.merge(other))
    }

    /// Interleave the per-producer streams following `labels`.
    fn interleaved(&self, labels: &[ProducerId]) -> Vec<ExternalEvent<String>> {
        let mut queues: BTreeMap<ProducerId, VecDeque<_>> = BTreeMap::new();
        for event in &self.events {
            queues
                .entry(event.causal_context.owner())
                .or_default()
                .push_back(event.clone());
        }
        labels
            .iter()
            .filter_map(|p| queues.get_mut(p).and_then(|q| q.pop_front()))
            .collect()
    }

    fn streams(&self) -> Vec<Vec<ExternalEvent<String>>> {
        let mut streams: BTreeMap<ProducerId, Vec<_>> = BTreeMap::new();
        for event in &self.events {
            streams
                .entry(event.causal_context.owner())
                .or_default()
                .push(event.clone());
        }
        streams.into_values().collect()
    }
}

fn process_live(timeline: &Timeline) -> SourceProcessConsumer<String> {
    let mut consumer = SourceProcessConsumer::new_auto(OWNER);
    for event in &timeline.events {
        consumer
            .on_event(event.clone().into())
            .expect("timeline order is causal");
    }
    consumer
}

fn steps_strategy() -> impl Strategy<Value = (bool, Vec<(u64, u64)>)> {
    (
        any::<bool>(),
        prop::collection::vec((2_u64..5, 1_u64..20), 1..12),
    )
}

proptest! {
    #[test]
    fn replay_in_any_order_restores_consumer(
        (shared, steps, log_order, event_order) in steps_strategy().prop_flat_map(|(shared, steps)| {
            let order: Vec<usize> = (0..steps.len()).collect();
            (
                Just(shared),
                Just(steps),
                Just(order.clone()).prop_shuffle(),
                Just(order).prop_shuffle(),
            )
        })
    ) {
        let timeline = Timeline::build(shared, &steps);
        let original = process_live(&timeline);
        prop_assert_eq!(original.output_log().len(), timeline.events.len());

        let mut fresh: SourceProcessConsumer<String> = SourceProcessConsumer::new_auto(OWNER);
        for &i in &log_order {
            prop_assert!(fresh.on_event(original.output_log()[i].clone().into()).is_ok());
        }
        for &i in &event_order {
            if let Err(e) = fresh.on_event(timeline.events[i].clone().into()) {
                // stale redelivery after the switch to processing
                prop_assert!(e.is_out_of_order(), "unexpected error {}", e);
            }
        }

        prop_assert!(fresh.output_log().is_empty());
        prop_assert_eq!(fresh.mode(), Mode::Processing);
        prop_assert_eq!(fresh.state(), original.state());
        prop_assert_eq!(fresh.vector_clock(), original.vector_clock());
    }

    #[test]
    fn replay_preserving_producer_order_never_processes(
        (shared, steps, labels) in steps_strategy().prop_flat_map(|(shared, steps)| {
            let labels: Vec<ProducerId> = steps.iter().map(|&(p, _)| ProducerId(p)).collect();
            (Just(shared), Just(steps), Just(labels).prop_shuffle())
        })
    ) {
        let timeline = Timeline::build(shared, &steps);
        let original = process_live(&timeline);

        let processed = Arc::new(AtomicUsize::new(0));
        let counter = processed.clone();
        let mut fresh: SourceProcessConsumer<String> = SourceProcessConsumer::new_auto(OWNER);
        fresh.set_before_processing_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let replay = original
            .output_log()
            .iter()
            .cloned()
            .map(ClockedEvent::from)
            .chain(timeline.interleaved(&labels).into_iter().map(ClockedEvent::from));
        for event in replay {
            prop_assert!(fresh.on_event(event).is_ok());
        }

        prop_assert_eq!(processed.load(Ordering::SeqCst), 0);
        prop_assert!(fresh.output_log().is_empty());
        prop_assert_eq!(fresh.mode(), Mode::Processing);
        prop_assert_eq!(fresh.state(), original.state());
        prop_assert_eq!(fresh.vector_clock(), original.vector_clock());
    }
}

#[test]
fn replay_by_timeline_and_by_producer() {
    for shared in [false, true] {
        let steps = [(2, 3), (3, 5), (2, 2), (3, 7)];
        let timeline = Timeline::build(shared, &steps);
        let original = process_live(&timeline);
        assert_eq!(original.output_log().len(), 4);

        let by_producer: Vec<_> = timeline.streams().into_iter().flatten().collect();
        for order in [timeline.events.clone(), by_producer] {
            let mut fresh: SourceProcessConsumer<String> = SourceProcessConsumer::new_auto(OWNER);
            for event in original.output_log() {
                fresh.on_event(event.clone().into()).unwrap();
            }
            for event in order {
                fresh.on_event(event.into()).unwrap();
            }

            assert!(fresh.output_log().is_empty());
            assert_eq!(fresh.mode(), Mode::Processing);
            assert_eq!(fresh.state(), original.state());
        }
    }
}

#[test]
fn recovered_consumer_continues_processing() {
    let timeline = Timeline::build(false, &[(2, 1), (3, 1)]);
    let original = process_live(&timeline);

    let mut fresh: SourceProcessConsumer<String> = SourceProcessConsumer::new_auto(OWNER);
    for event in original.output_log() {
        fresh.on_event(event.clone().into()).unwrap();
    }
    for event in &timeline.events {
        fresh.on_event(event.clone().into()).unwrap();
    }

    let next = timeline.clocks[&ProducerId(2)].inc();
    fresh
        .on_event(ExternalEvent::new(next, "live".to_string()).into())
        .unwrap();

    assert_eq!(fresh.state(), "live");
    assert_eq!(fresh.output_log().len(), 1);
    assert!(fresh
        .output_log()[0]
        .causal_context
        .after(original.vector_clock()));
}

#[tokio::test]
async fn recover_through_fan_in_never_processes() {
    let timeline = Timeline::build(true, &[(2, 4), (3, 1), (4, 9), (2, 2), (4, 1), (3, 3)]);
    let original = process_live(&timeline);

    let processed = Arc::new(AtomicUsize::new(0));
    let counter = processed.clone();
    let mut fresh: SourceProcessConsumer<String> = SourceProcessConsumer::new_auto(OWNER);
    fresh.set_before_processing_hook(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let report = recover(
        &mut fresh,
        original.output_log().to_vec(),
        timeline.streams(),
        2,
    )
    .await;

    assert!(report.rejected.is_empty());
    assert_eq!(report.delivered, 12);
    assert_eq!(report.committed, 0);
    assert_eq!(processed.load(Ordering::SeqCst), 0);
    assert_eq!(fresh.mode(), Mode::Processing);
    assert_eq!(fresh.vector_clock(), original.vector_clock());
    assert_eq!(fresh.state(), original.state());
}
