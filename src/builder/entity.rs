use chrono::Utc;
use log::debug;
use std::rc::Rc;
use std::sync::Arc;

use crate::builder::bus::{Event, EventKind};
use crate::builder::context::{BuildError, BuildSession, BuilderId, BuilderSlot};
use crate::builder::member::{create_member, MemberBuilder};
use crate::builder::operation::{build_operation, create_operation, OperationBuilder};
use crate::builder::ordering::{run_caching_pass, EntityCaches};
use crate::model::{
    ContainerKind, EntityDescriptor, EntityDetail, MemberKind, MemberLayout, Name, Qualifier,
};

/// Mutable accumulator for one entity, arena-allocated in the session
pub(crate) struct EntityBuilderState {
    pub(crate) name: Name,
    /// Property builders in registration order
    pub(crate) properties: Vec<BuilderId>,
    /// Operation builders in registration order
    pub(crate) operations: Vec<BuilderId>,
    /// Base entity detail (no qualifier)
    pub(crate) detail: EntityDetail,
    /// Per-qualifier entity details, in request order
    pub(crate) qualifier_details: Vec<(Qualifier, EntityDetail)>,
    /// Filled by the caching pass, consumed by `build`
    pub(crate) caches: Option<EntityCaches>,
    pub(crate) built: Option<Arc<EntityDescriptor>>,
}

impl EntityBuilderState {
    fn new(name: Name) -> Self {
        Self {
            name,
            properties: Vec::new(),
            operations: Vec::new(),
            detail: EntityDetail::default(),
            qualifier_details: Vec::new(),
            caches: None,
            built: None,
        }
    }
}

/// Insert an entity builder and wire the caching pass to its pre-build event
pub(crate) fn create_entity(session: &mut BuildSession, name: Name) -> BuilderId {
    let id = session.insert(BuilderSlot::Entity(EntityBuilderState::new(name)));
    session.subscribe(
        id,
        EventKind::PreBuild,
        Rc::new(move |session, _event| run_caching_pass(session, id)),
    );
    id
}

/// Assemble and memoize the entity descriptor
///
/// Operations are validated ahead of the caching pass, so a bad operation
/// name unwinds before any cache or descriptor exists.
pub(crate) fn build_entity(
    session: &mut BuildSession,
    id: BuilderId,
) -> Result<Arc<EntityDescriptor>, BuildError> {
    if let Some(existing) = session.entity_state(id).and_then(|state| state.built.clone()) {
        return Ok(existing);
    }

    let (name, property_ids, operation_ids) = match session.entity_state(id) {
        Some(state) => (
            state.name.clone(),
            state.properties.clone(),
            state.operations.clone(),
        ),
        None => (Name::new(), Vec::new(), Vec::new()),
    };
    for oid in &operation_ids {
        build_operation(session, *oid)?;
    }

    session.publish(Event::PreBuild { builder: id }, id);

    let mut properties = Vec::with_capacity(property_ids.len());
    for pid in &property_ids {
        if let Some(descriptor) = session.member_state(*pid).and_then(|s| s.built.clone()) {
            properties.push(descriptor);
        }
    }
    let mut operations = Vec::with_capacity(operation_ids.len());
    for oid in &operation_ids {
        if let Some(descriptor) = session.operation_state(*oid).and_then(|s| s.built.clone()) {
            operations.push(descriptor);
        }
    }
    let key_property = properties
        .iter()
        .find(|member| member.key)
        .map(|member| member.name.clone());

    let (detail, caches) = match session.entity_state_mut(id) {
        Some(state) => (state.detail.clone(), state.caches.take()),
        None => (EntityDetail::default(), None),
    };
    let EntityCaches { layout, partitions } = caches.unwrap_or_else(|| EntityCaches {
        layout: MemberLayout::default(),
        partitions: Vec::new(),
    });

    let fingerprint = EntityDescriptor::compute_fingerprint(
        &name,
        key_property.as_deref(),
        &detail,
        &properties,
        &operations,
        &layout,
        &partitions,
    );
    let descriptor = Arc::new(EntityDescriptor {
        name,
        key_property,
        detail,
        properties,
        operations,
        layout,
        partitions,
        built_at: Utc::now(),
        session: session.id(),
        fingerprint,
    });
    if let Some(state) = session.entity_state_mut(id) {
        state.built = Some(Arc::clone(&descriptor));
        debug!("entity '{}' built", descriptor.name);
    }
    session.publish(Event::Built { builder: id }, id);
    Ok(descriptor)
}

/// Fluent cursor over one entity builder
pub struct EntityBuilder<'s> {
    pub(crate) session: &'s mut BuildSession,
    pub(crate) id: BuilderId,
}

impl<'s> EntityBuilder<'s> {
    pub fn id(&self) -> BuilderId {
        self.id
    }

    /// Add a property and configure it in place
    pub fn property(
        self,
        name: impl Into<Name>,
        configure: impl FnOnce(MemberBuilder) -> MemberBuilder,
    ) -> Self {
        let pid = create_member(self.session, name.into(), MemberKind::Property, None);
        if let Some(state) = self.session.entity_state_mut(self.id) {
            state.properties.push(pid);
        }
        configure(MemberBuilder {
            session: &mut *self.session,
            id: pid,
        });
        self
    }

    /// Add a collection property and configure it in place
    pub fn collection_property(
        self,
        name: impl Into<Name>,
        configure: impl FnOnce(MemberBuilder) -> MemberBuilder,
    ) -> Self {
        let pid = create_member(
            self.session,
            name.into(),
            MemberKind::Property,
            Some(ContainerKind::default()),
        );
        if let Some(state) = self.session.entity_state_mut(self.id) {
            state.properties.push(pid);
        }
        configure(MemberBuilder {
            session: &mut *self.session,
            id: pid,
        });
        self
    }

    /// Add an operation and configure it in place
    pub fn operation(
        self,
        name: impl Into<Name>,
        configure: impl FnOnce(OperationBuilder) -> OperationBuilder,
    ) -> Self {
        let oid = create_operation(self.session, name.into(), Some(self.id));
        if let Some(state) = self.session.entity_state_mut(self.id) {
            state.operations.push(oid);
        }
        configure(OperationBuilder {
            session: &mut *self.session,
            id: oid,
        });
        self
    }

    pub fn description_key(self, key: impl Into<String>) -> Self {
        if let Some(state) = self.session.entity_state_mut(self.id) {
            state.detail.description_key = Some(key.into());
        }
        self
    }

    pub fn render_hint(self, hint: impl Into<String>) -> Self {
        if let Some(state) = self.session.entity_state_mut(self.id) {
            state.detail.render_hint = Some(hint.into());
        }
        self
    }

    /// Request the entity-level override slot for a qualifier
    pub fn detail(
        self,
        qualifier: impl Into<Qualifier>,
        configure: impl FnOnce(EntityDetail) -> EntityDetail,
    ) -> Self {
        let qualifier = qualifier.into();
        self.session.register_qualifier(&qualifier);
        if let Some(state) = self.session.entity_state_mut(self.id) {
            let position = state
                .qualifier_details
                .iter()
                .position(|(q, _)| *q == qualifier);
            let current = match position {
                Some(i) => state.qualifier_details[i].1.clone(),
                None => EntityDetail::default(),
            };
            let updated = configure(current);
            match position {
                Some(i) => state.qualifier_details[i].1 = updated,
                None => state.qualifier_details.push((qualifier, updated)),
            }
        }
        self
    }

    /// Run the pre-build pass and assemble the immutable descriptor, once
    pub fn build(self) -> Result<Arc<EntityDescriptor>, BuildError> {
        build_entity(self.session, self.id)
    }
}

impl BuildSession {
    /// Start an entity builder
    pub fn entity(&mut self, name: impl Into<Name>) -> EntityBuilder<'_> {
        let id = create_entity(self, name.into());
        EntityBuilder { session: self, id }
    }

    /// Re-enter an entity builder by id
    pub fn entity_builder(&mut self, id: BuilderId) -> Option<EntityBuilder<'_>> {
        self.entity_state(id)?;
        Some(EntityBuilder { session: self, id })
    }
}
