use log::error;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::builder::context::{BuildSession, BuilderId};

/// A build-time notification exchanged between builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A member's declared type or container kind changed
    TypeChanged { builder: BuilderId },
    /// A collection member's element type changed
    ElementTypeChanged { builder: BuilderId },
    /// An entity is about to materialize and its caches must be computed
    PreBuild { builder: BuilderId },
    /// A builder produced its canonical descriptor
    Built { builder: BuilderId },
    /// An operation finished assembling its signature
    OperationBuilt { operation: BuilderId },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TypeChanged { .. } => EventKind::TypeChanged,
            Event::ElementTypeChanged { .. } => EventKind::ElementTypeChanged,
            Event::PreBuild { .. } => EventKind::PreBuild,
            Event::Built { .. } => EventKind::Built,
            Event::OperationBuilt { .. } => EventKind::OperationBuilt,
        }
    }

    /// The builder that emitted the event
    pub fn builder(&self) -> BuilderId {
        match self {
            Event::TypeChanged { builder }
            | Event::ElementTypeChanged { builder }
            | Event::PreBuild { builder }
            | Event::Built { builder } => *builder,
            Event::OperationBuilt { operation } => *operation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TypeChanged,
    ElementTypeChanged,
    PreBuild,
    Built,
    OperationBuilt,
}

/// Failure raised by a listener reaction
///
/// Never fatal: the dispatcher logs it and continues with the remaining
/// listeners.
#[derive(Debug, Clone, Error)]
#[error("listener error: {message}")]
pub struct EventError {
    pub message: String,
}

impl EventError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A listener reaction bound to one (target, kind, phase) slot
pub type Reaction = Rc<dyn Fn(&mut BuildSession, &Event) -> Result<(), EventError>>;

#[derive(Default)]
struct Listeners {
    before: Vec<Reaction>,
    normal: Vec<Reaction>,
}

/// Dispatch counters, exposed for tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub published: u64,
    pub listener_failures: u64,
    pub suppressed_cycles: u64,
}

/// Typed publish/subscribe dispatcher for one build session
///
/// Listeners are keyed by the builder they target and the event kind they
/// react to. Within a (target, kind) slot the before phase runs first, then
/// the normal phase, each in registration order. Dispatch is synchronous;
/// re-entrant dispatch of a (target, kind) pair already in flight is
/// suppressed instead of looping.
pub struct EventBus {
    table: HashMap<(BuilderId, EventKind), Listeners>,
    in_flight: Vec<(BuilderId, EventKind)>,
    stats: BusStats,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            in_flight: Vec::new(),
            stats: BusStats::default(),
        }
    }

    /// Register a normal-phase listener for events of `kind` targeting `owner`
    pub fn subscribe(&mut self, owner: BuilderId, kind: EventKind, reaction: Reaction) {
        self.table
            .entry((owner, kind))
            .or_default()
            .normal
            .push(reaction);
    }

    /// Register a before-phase listener for events of `kind` targeting `owner`
    pub fn subscribe_before(&mut self, owner: BuilderId, kind: EventKind, reaction: Reaction) {
        self.table
            .entry((owner, kind))
            .or_default()
            .before
            .push(reaction);
    }

    /// The reactions to run for a dispatch, before phase first
    ///
    /// Cloned out of the table so the caller can run them while the session
    /// (which owns this bus) is mutably borrowed.
    pub(crate) fn select(&self, target: BuilderId, kind: EventKind) -> Vec<Reaction> {
        match self.table.get(&(target, kind)) {
            Some(listeners) => listeners
                .before
                .iter()
                .chain(listeners.normal.iter())
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Mark a (target, kind) dispatch as started
    ///
    /// Returns false when that pair is already being dispatched; the caller
    /// must then drop the publish.
    pub(crate) fn begin_dispatch(&mut self, target: BuilderId, kind: EventKind) -> bool {
        if self.in_flight.contains(&(target, kind)) {
            error!(
                "suppressed re-entrant dispatch of {:?} for builder {:?}",
                kind, target
            );
            self.stats.suppressed_cycles += 1;
            return false;
        }
        self.in_flight.push((target, kind));
        self.stats.published += 1;
        true
    }

    pub(crate) fn end_dispatch(&mut self, target: BuilderId, kind: EventKind) {
        if let Some(pos) = self
            .in_flight
            .iter()
            .rposition(|entry| *entry == (target, kind))
        {
            self.in_flight.remove(pos);
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.stats.listener_failures += 1;
    }

    pub fn stats(&self) -> BusStats {
        self.stats
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
