use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::producer::ProducerId;

/// Logical clock tracking per-producer ticks, owned by one producer.
///
/// Immutable value type: `inc`, `merge` and `project_own_axis` return new
/// clocks and never touch `self`.
///
/// Ordering is deliberately single-axis. `a.after(b)` only looks at the tick
/// of `a`'s owner, so two clocks can be neither after nor before each other
/// and still differ. Equality (`==`) compares the whole tick mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawClock")]
pub struct LogicalClock {
    owner: ProducerId,
    ticks: BTreeMap<ProducerId, u64>,
}

/// Wire shape of a clock; converted so a decoded clock always has its owner entry.
#[derive(Deserialize)]
struct RawClock {
    owner: ProducerId,
    #[serde(default)]
    ticks: BTreeMap<ProducerId, u64>,
}

impl From<RawClock> for LogicalClock {
    fn from(raw: RawClock) -> Self {
        let mut ticks = raw.ticks;
        ticks.entry(raw.owner).or_insert(0);
        Self {
            owner: raw.owner,
            ticks,
        }
    }
}

impl LogicalClock {
    /// Create a clock for `owner` with its own tick at 0.
    pub fn new(owner: ProducerId) -> Self {
        let mut ticks = BTreeMap::new();
        ticks.insert(owner, 0);
        Self { owner, ticks }
    }

    /// Create a clock for `owner` from explicit entries.
    pub fn with_ticks(
        owner: ProducerId,
        ticks: impl IntoIterator<Item = (ProducerId, u64)>,
    ) -> Self {
        RawClock {
            owner,
            ticks: ticks.into_iter().collect(),
        }
        .into()
    }

    pub fn owner(&self) -> ProducerId {
        self.owner
    }

    /// The owner's own tick.
    pub fn own_tick(&self) -> u64 {
        self.tick(self.owner)
    }

    /// Get the tick recorded for `id`, if any.
    pub fn get(&self, id: ProducerId) -> Option<u64> {
        self.ticks.get(&id).copied()
    }

    /// Get the tick for `id`, treating an absent entry as 0.
    pub fn tick(&self, id: ProducerId) -> u64 {
        self.get(id).unwrap_or(0)
    }

    /// Return a new clock with the owner's tick advanced by one.
    #[must_use]
    pub fn inc(&self) -> Self {
        let mut next = self.clone();
        let own = next.ticks.entry(self.owner).or_insert(0);
        *own = own.saturating_add(1);
        next
    }

    /// Return a new clock holding the per-producer maximum of both clocks.
    ///
    /// The owner's own tick is only merged when `other` has the same owner.
    #[must_use]
    pub fn merge(&self, other: &LogicalClock) -> Self {
        let mut next = self.clone();
        for (&id, &tick) in &other.ticks {
            if id == self.owner && !self.is_same_owner(other) {
                continue;
            }
            let entry = next.ticks.entry(id).or_insert(0);
            if tick > *entry {
                *entry = tick;
            }
        }
        next
    }

    /// Return a fresh clock for the same owner carrying only the own tick.
    #[must_use]
    pub fn project_own_axis(&self) -> Self {
        let mut projected = LogicalClock::new(self.owner);
        projected.ticks.insert(self.owner, self.own_tick());
        projected
    }

    /// `self[self.owner] > other[self.owner]`.
    pub fn after(&self, other: &LogicalClock) -> bool {
        self.own_tick() > other.tick(self.owner)
    }

    /// `self[self.owner] < other[self.owner]`.
    pub fn before(&self, other: &LogicalClock) -> bool {
        self.own_tick() < other.tick(self.owner)
    }

    /// True if the only entry is the owner's, at 0.
    pub fn is_empty(&self) -> bool {
        self.ticks.len() == 1 && self.own_tick() == 0
    }

    pub fn is_same_owner(&self, other: &LogicalClock) -> bool {
        self.owner == other.owner
    }

    /// Iterate over `(producer, tick)` entries in producer order.
    pub fn iter(&self) -> impl Iterator<Item = (ProducerId, u64)> + '_ {
        self.ticks.iter().map(|(&id, &tick)| (id, tick))
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }
}

impl PartialEq for LogicalClock {
    fn eq(&self, other: &Self) -> bool {
        self.ticks == other.ticks
    }
}

impl Eq for LogicalClock {}

impl std::fmt::Display for LogicalClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[", self.owner)?;
        for (i, (id, tick)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", id, tick)?;
        }
        write!(f, "]")
    }
}
