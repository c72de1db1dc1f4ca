use log::{debug, warn};
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::builder::bus::{BusStats, Event, EventBus, EventKind, Reaction};
use crate::builder::entity::EntityBuilderState;
use crate::builder::member::MemberBuilderState;
use crate::builder::operation::OperationBuilderState;
use crate::config::EngineConfig;
use crate::model::Qualifier;

/// Errors raised by `build()` and session construction
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("operation name '{name}' does not match pattern '{pattern}'")]
    OperationName { name: String, pattern: String },

    #[error("invalid operation name pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Stable handle of one builder within its session's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuilderId(pub(crate) u32);

pub(crate) enum BuilderSlot {
    Member(MemberBuilderState),
    Operation(OperationBuilderState),
    Entity(EntityBuilderState),
}

/// Shared state of one build session
///
/// Owns the event bus, the engine configuration with its compiled
/// operation-name pattern, the qualifier registry, and the builder arena.
/// Builders are addressed by [`BuilderId`] and mutated through fluent
/// cursors. A session is single-threaded and scoped to one build; it must
/// not be reused across unrelated builds.
pub struct BuildSession {
    id: Uuid,
    config: EngineConfig,
    operation_pattern: Regex,
    bus: EventBus,
    slots: Vec<BuilderSlot>,
    qualifiers: Vec<Qualifier>,
}

impl BuildSession {
    /// A session with the default configuration
    pub fn new() -> Result<Self, BuildError> {
        Self::with_config(EngineConfig::default())
    }

    /// A session with an explicit configuration
    ///
    /// Compiles the operation-name pattern once; an invalid pattern fails
    /// here rather than at every operation build.
    pub fn with_config(config: EngineConfig) -> Result<Self, BuildError> {
        let pattern = config.operation_pattern();
        let operation_pattern = Regex::new(pattern).map_err(|source| BuildError::Pattern {
            pattern: pattern.to_string(),
            source: Box::new(source),
        })?;
        let id = Uuid::new_v4();
        debug!("build session {} started", id);
        Ok(Self {
            id,
            config,
            operation_pattern,
            bus: EventBus::new(),
            slots: Vec::new(),
            qualifiers: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn operation_pattern(&self) -> &Regex {
        &self.operation_pattern
    }

    /// Qualifiers discovered so far, in discovery order
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    /// Record a qualifier the first time a detail is requested for it
    pub(crate) fn register_qualifier(&mut self, qualifier: &Qualifier) {
        if !self.qualifiers.contains(qualifier) {
            self.qualifiers.push(qualifier.clone());
        }
    }

    pub(crate) fn insert(&mut self, slot: BuilderSlot) -> BuilderId {
        let id = BuilderId(self.slots.len() as u32);
        self.slots.push(slot);
        id
    }

    pub(crate) fn member_state(&self, id: BuilderId) -> Option<&MemberBuilderState> {
        match self.slots.get(id.0 as usize) {
            Some(BuilderSlot::Member(state)) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn member_state_mut(&mut self, id: BuilderId) -> Option<&mut MemberBuilderState> {
        match self.slots.get_mut(id.0 as usize) {
            Some(BuilderSlot::Member(state)) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn operation_state(&self, id: BuilderId) -> Option<&OperationBuilderState> {
        match self.slots.get(id.0 as usize) {
            Some(BuilderSlot::Operation(state)) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn operation_state_mut(
        &mut self,
        id: BuilderId,
    ) -> Option<&mut OperationBuilderState> {
        match self.slots.get_mut(id.0 as usize) {
            Some(BuilderSlot::Operation(state)) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn entity_state(&self, id: BuilderId) -> Option<&EntityBuilderState> {
        match self.slots.get(id.0 as usize) {
            Some(BuilderSlot::Entity(state)) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn entity_state_mut(&mut self, id: BuilderId) -> Option<&mut EntityBuilderState> {
        match self.slots.get_mut(id.0 as usize) {
            Some(BuilderSlot::Entity(state)) => Some(state),
            _ => None,
        }
    }

    /// Register a normal-phase listener for events of `kind` targeting `owner`
    pub fn subscribe(&mut self, owner: BuilderId, kind: EventKind, reaction: Reaction) {
        self.bus.subscribe(owner, kind, reaction);
    }

    /// Register a before-phase listener for events of `kind` targeting `owner`
    pub fn subscribe_before(&mut self, owner: BuilderId, kind: EventKind, reaction: Reaction) {
        self.bus.subscribe_before(owner, kind, reaction);
    }

    /// Dispatch an event to the listeners registered by `target`
    ///
    /// Synchronous: before-phase listeners run first, then normal-phase, each
    /// in registration order. A listener error is logged and skipped. A
    /// re-entrant dispatch of a (target, kind) pair already in flight is
    /// dropped by the bus guard.
    pub fn publish(&mut self, event: Event, target: BuilderId) {
        let kind = event.kind();
        if !self.bus.begin_dispatch(target, kind) {
            return;
        }
        debug!(
            "dispatching {:?} from builder {:?} to builder {:?}",
            kind,
            event.builder(),
            target
        );
        for reaction in self.bus.select(target, kind) {
            if let Err(err) = reaction(self, &event) {
                warn!(
                    "listener failed handling {:?} for builder {:?}: {}",
                    kind, target, err
                );
                self.bus.record_failure();
            }
        }
        self.bus.end_dispatch(target, kind);
    }

    /// Dispatch counters for this session's bus
    pub fn bus_stats(&self) -> BusStats {
        self.bus.stats()
    }
}
