use serde::{Deserialize, Serialize};

use kausal_core::{
    ClockedEvent, Clocked, DuplicateError, DuplicateGuard, ExternalEvent, InternalStateEvent,
    LogicalClock, ProducerId,
};

use crate::error::{ConsumerError, Rejection};

/// Whether a consumer is replaying history or applying live events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Sourcing,
    Processing,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Sourcing => write!(f, "sourcing"),
            Mode::Processing => write!(f, "processing"),
        }
    }
}

/// What an accepted event did to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Sourcing saw the event's own tick before; nothing changed.
    AlreadySourced,
    /// Sourcing absorbed the event.
    Sourced,
    /// Processing applied the event and appended a state event.
    Committed,
}

/// Callback invoked with every event that reaches processing.
pub type BeforeProcessingHook<V> = Box<dyn FnMut(&ClockedEvent<V>) + Send>;

/// Consumer that sources historical events before processing live ones.
///
/// Two clocks are kept: `vector_clock` is the authoritative causal state and
/// only advances while processing (or when sourcing our own state events),
/// `sourced_clock` records how much history has been replayed. Sourcing is
/// complete when the two are equal.
pub struct SourceProcessConsumer<V> {
    owner: ProducerId,
    vector_clock: LogicalClock,
    sourced_clock: LogicalClock,
    state: V,
    mode: Mode,
    auto_switch: bool,
    output_log: Vec<InternalStateEvent<V>>,
    guard: DuplicateGuard,
    before_processing: BeforeProcessingHook<V>,
}

impl<V: Clone + Default> SourceProcessConsumer<V> {
    /// Create a consumer that stays in sourcing mode until
    /// [`enter_processing`](Self::enter_processing) is called.
    pub fn new_manual(owner: ProducerId) -> Self {
        Self::new(owner, false)
    }

    /// Create a consumer that switches to processing as soon as sourcing completes.
    pub fn new_auto(owner: ProducerId) -> Self {
        Self::new(owner, true)
    }

    fn new(owner: ProducerId, auto_switch: bool) -> Self {
        Self {
            owner,
            vector_clock: LogicalClock::new(owner),
            sourced_clock: LogicalClock::new(owner),
            state: V::default(),
            mode: Mode::Sourcing,
            auto_switch,
            output_log: Vec::new(),
            guard: DuplicateGuard::new(),
            before_processing: Box::new(|_| {}),
        }
    }

    /// Handle one delivered event.
    pub fn on_event(&mut self, event: ClockedEvent<V>) -> Result<Disposition, ConsumerError> {
        self.offer(event).map_err(|rejection| rejection.error)
    }

    /// Like [`on_event`](Self::on_event), but a refused event is handed back
    /// together with the error.
    pub fn offer(&mut self, event: ClockedEvent<V>) -> Result<Disposition, Rejection<V>> {
        if self.auto_switch && self.mode == Mode::Sourcing && self.completes_sourcing(&event) {
            self.switch_to_processing();
        }

        match self.mode {
            Mode::Sourcing => self.source_event(event),
            Mode::Processing => self.process_event(event),
        }
    }

    // Own state events are always sourced first, so they never complete sourcing.
    fn completes_sourcing(&self, event: &ClockedEvent<V>) -> bool {
        !event.is_internal() && self.is_synced()
    }

    fn source_event(&mut self, event: ClockedEvent<V>) -> Result<Disposition, Rejection<V>> {
        if !event.causal_context().after(&self.sourced_clock) {
            tracing::debug!(
                "already sourced {} event {}",
                event.kind(),
                event.causal_context()
            );
            return Ok(Disposition::AlreadySourced);
        }

        let progress = event.causal_context().project_own_axis();
        match event {
            ClockedEvent::External(external) => {
                if let Err(error) = self.guard.add(external.id()) {
                    return Err(Rejection::new(external, error));
                }
                tracing::debug!("sourcing external event {}", external.causal_context);
            }
            ClockedEvent::InternalState(internal) => {
                if internal.causal_context.owner() != self.owner {
                    tracing::warn!(
                        "{} sourcing state event owned by {}",
                        self.owner,
                        internal.causal_context.owner()
                    );
                }
                tracing::debug!("sourcing own state event {}", internal.causal_context);
                self.state = internal.new_state;
                self.vector_clock = internal.causal_context;
            }
        }
        self.sourced_clock = self.sourced_clock.merge(&progress);

        if self.auto_switch && self.is_synced() {
            self.switch_to_processing();
        }
        Ok(Disposition::Sourced)
    }

    fn process_event(&mut self, event: ClockedEvent<V>) -> Result<Disposition, Rejection<V>> {
        (self.before_processing)(&event);
        tracing::debug!(
            "processing {} event {}",
            event.kind(),
            event.causal_context()
        );

        let external = match event {
            ClockedEvent::External(external) => external,
            other => {
                let error = ConsumerError::UnsupportedEventKind(other.kind());
                return Err(Rejection::new(other, error));
            }
        };

        let id = external.id();
        if self.guard.contains(&id) {
            return Err(Rejection::new(external, DuplicateError(id)));
        }
        if !external.causal_context.after(&self.vector_clock) {
            let error = ConsumerError::OutOfOrder {
                event: external.causal_context.clone(),
                current: self.vector_clock.clone(),
            };
            return Err(Rejection::new(external, error));
        }

        if let Err(error) = self.guard.add(id) {
            return Err(Rejection::new(external, error));
        }
        self.apply(external);
        Ok(Disposition::Committed)
    }

    fn apply(&mut self, event: ExternalEvent<V>) {
        self.vector_clock = self.vector_clock.inc().merge(&event.causal_context);
        self.state = event.new_state;
        self.store_update();
    }

    fn store_update(&mut self) {
        self.vector_clock = self.vector_clock.inc();
        self.output_log.push(InternalStateEvent::new(
            self.vector_clock.clone(),
            self.state.clone(),
        ));
    }

    fn switch_to_processing(&mut self) {
        tracing::info!(
            "{} switching to processing mode at {}",
            self.owner,
            self.vector_clock
        );
        self.mode = Mode::Processing;
    }

    /// Return to sourcing, treating everything applied so far as replayed.
    pub fn enter_sourcing(&mut self) {
        tracing::info!(
            "{} entering sourcing mode at {}",
            self.owner,
            self.vector_clock
        );
        self.sourced_clock = self.vector_clock.clone();
        self.mode = Mode::Sourcing;
    }

    /// Switch to processing; fails unless sourcing has caught up.
    pub fn enter_processing(&mut self) -> Result<(), ConsumerError> {
        if !self.is_synced() {
            return Err(ConsumerError::NotSynced {
                sourced: self.sourced_clock.clone(),
                authoritative: self.vector_clock.clone(),
            });
        }
        self.switch_to_processing();
        Ok(())
    }

    /// Install the callback run before every processed event.
    pub fn set_before_processing_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&ClockedEvent<V>) + Send + 'static,
    {
        self.before_processing = Box::new(hook);
    }
}

impl<V> SourceProcessConsumer<V> {
    pub fn owner(&self) -> ProducerId {
        self.owner
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> &V {
        &self.state
    }

    pub fn is_auto_switch(&self) -> bool {
        self.auto_switch
    }

    pub fn vector_clock(&self) -> &LogicalClock {
        &self.vector_clock
    }

    pub fn sourced_clock(&self) -> &LogicalClock {
        &self.sourced_clock
    }

    /// True when replay has caught up with the authoritative clock.
    pub fn is_synced(&self) -> bool {
        self.sourced_clock == self.vector_clock
    }

    /// State events committed by this consumer, oldest first.
    pub fn output_log(&self) -> &[InternalStateEvent<V>] {
        &self.output_log
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for SourceProcessConsumer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceProcessConsumer")
            .field("owner", &self.owner)
            .field("mode", &self.mode)
            .field("auto_switch", &self.auto_switch)
            .field("vector_clock", &self.vector_clock)
            .field("sourced_clock", &self.sourced_clock)
            .field("state", &self.state)
            .field("output_log", &self.output_log.len())
            .field("seen", &self.guard.len())
            .finish()
    }
}
