use serde::{Deserialize, Serialize};

use crate::clock::LogicalClock;
use crate::producer::ProducerId;

/// Identity of an external event: its producer and the producer's own tick
/// at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    pub producer: ProducerId,
    pub tick: u64,
}

impl EventId {
    pub fn new(producer: ProducerId, tick: u64) -> Self {
        Self { producer, tick }
    }

    /// Derive the identity from the own axis of a causal context.
    pub fn of(causal_context: &LogicalClock) -> Self {
        Self::new(causal_context.owner(), causal_context.own_tick())
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.producer, self.tick)
    }
}

/// Anything carrying a causal context.
pub trait Clocked {
    fn causal_context(&self) -> &LogicalClock;
}

/// An event created by some producer outside the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent<V> {
    pub causal_context: LogicalClock,
    pub new_state: V,
}

impl<V> ExternalEvent<V> {
    pub fn new(causal_context: LogicalClock, new_state: V) -> Self {
        Self {
            causal_context,
            new_state,
        }
    }

    pub fn id(&self) -> EventId {
        EventId::of(&self.causal_context)
    }
}

impl<V> Clocked for ExternalEvent<V> {
    fn causal_context(&self) -> &LogicalClock {
        &self.causal_context
    }
}

/// A state event committed by a consumer while processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalStateEvent<V> {
    pub causal_context: LogicalClock,
    pub new_state: V,
}

impl<V> InternalStateEvent<V> {
    pub fn new(causal_context: LogicalClock, new_state: V) -> Self {
        Self {
            causal_context,
            new_state,
        }
    }
}

impl<V> Clocked for InternalStateEvent<V> {
    fn causal_context(&self) -> &LogicalClock {
        &self.causal_context
    }
}

/// Discriminant of a [`ClockedEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    External,
    InternalState,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::External => write!(f, "external"),
            EventKind::InternalState => write!(f, "internal-state"),
        }
    }
}

/// An event as delivered to a consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClockedEvent<V> {
    External(ExternalEvent<V>),
    InternalState(InternalStateEvent<V>),
}

impl<V> ClockedEvent<V> {
    pub fn kind(&self) -> EventKind {
        match self {
            ClockedEvent::External(_) => EventKind::External,
            ClockedEvent::InternalState(_) => EventKind::InternalState,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ClockedEvent::InternalState(_))
    }
}

impl<V> Clocked for ClockedEvent<V> {
    fn causal_context(&self) -> &LogicalClock {
        match self {
            ClockedEvent::External(e) => e.causal_context(),
            ClockedEvent::InternalState(e) => e.causal_context(),
        }
    }
}

impl<V> From<ExternalEvent<V>> for ClockedEvent<V> {
    fn from(event: ExternalEvent<V>) -> Self {
        ClockedEvent::External(event)
    }
}

impl<V> From<InternalStateEvent<V>> for ClockedEvent<V> {
    fn from(event: InternalStateEvent<V>) -> Self {
        ClockedEvent::InternalState(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_display() {
        let id = EventId::new(ProducerId(1), 42);
        assert_eq!(id.to_string(), "producer-1:42");
    }

    #[test]
    fn test_event_id_comes_from_own_axis() {
        let context = LogicalClock::new(ProducerId(2))
            .inc()
            .inc()
            .merge(&LogicalClock::new(ProducerId(3)).inc());
        let event = ExternalEvent::new(context, "b2".to_string());

        assert_eq!(event.id(), EventId::new(ProducerId(2), 2));
    }

    #[test]
    fn test_clocked_event_kind() {
        let clock = LogicalClock::new(ProducerId(1)).inc();
        let external: ClockedEvent<String> =
            ExternalEvent::new(clock.clone(), "x".to_string()).into();
        let internal: ClockedEvent<String> =
            InternalStateEvent::new(clock.clone(), "x".to_string()).into();

        assert_eq!(external.kind(), EventKind::External);
        assert!(!external.is_internal());
        assert!(internal.is_internal());
        assert_eq!(internal.causal_context(), &clock);
    }

    #[test]
    fn test_clocked_event_is_tagged_by_kind() {
        let event: ClockedEvent<String> =
            InternalStateEvent::new(LogicalClock::new(ProducerId(1)), "s".to_string()).into();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "internal_state");
        assert_eq!(json["new_state"], "s");
    }
}
