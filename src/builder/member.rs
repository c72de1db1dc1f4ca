use log::debug;
use std::rc::Rc;
use std::sync::Arc;

use crate::builder::bus::{Event, EventError, EventKind};
use crate::builder::context::{BuildSession, BuilderId, BuilderSlot};
use crate::model::{
    BaseMember, Cardinality, CollectionDescriptor, ContainerKind, MemberDescriptor, MemberDetail,
    MemberKind, MemberReference, Name, Qualifier, RelationKind, TypeRef,
};

/// Mutable accumulator for one leaf member, arena-allocated in the session
pub(crate) struct MemberBuilderState {
    pub(crate) name: Name,
    pub(crate) kind: MemberKind,
    pub(crate) value_type: Option<TypeRef>,
    pub(crate) container: Option<ContainerKind>,
    pub(crate) element: Option<TypeRef>,
    pub(crate) cardinality: Cardinality,
    pub(crate) relation_kind: RelationKind,
    pub(crate) related: Option<Name>,
    /// Set by `related`/`unrelated`; detection never overrides an explicit call
    pub(crate) relation_explicit: bool,
    pub(crate) order: Option<i32>,
    pub(crate) visible: bool,
    pub(crate) inline: bool,
    pub(crate) description_key: Option<String>,
    pub(crate) render_hint: Option<String>,
    pub(crate) index: Option<u32>,
    pub(crate) key: bool,
    /// Per-qualifier overrides, in request order
    pub(crate) details: Vec<(Qualifier, MemberDetail)>,
    pub(crate) built: Option<Arc<MemberDescriptor>>,
    /// One overlay per requested detail, materialized on `Built`
    pub(crate) references: Vec<(Qualifier, Arc<MemberReference>)>,
}

impl MemberBuilderState {
    fn new(name: Name, kind: MemberKind, container: Option<ContainerKind>) -> Self {
        Self {
            name,
            kind,
            value_type: None,
            container,
            element: None,
            cardinality: Cardinality::default(),
            relation_kind: RelationKind::None,
            related: None,
            relation_explicit: false,
            order: None,
            visible: true,
            inline: false,
            description_key: None,
            render_hint: None,
            index: None,
            key: false,
            details: Vec::new(),
            built: None,
            references: Vec::new(),
        }
    }

    /// The type slot relation detection looks at
    fn detection_type(&self) -> Option<&TypeRef> {
        if self.container.is_some() {
            self.element.as_ref()
        } else {
            self.value_type.as_ref()
        }
    }

    fn to_descriptor(&self) -> MemberDescriptor {
        MemberDescriptor {
            name: self.name.clone(),
            kind: self.kind,
            value_type: match self.container {
                Some(container) => Some(TypeRef::Container(container)),
                None => self.value_type.clone(),
            },
            collection: self.container.map(|container| CollectionDescriptor {
                container,
                element: self.element.clone(),
            }),
            cardinality: self.cardinality,
            relation_kind: self.relation_kind,
            related: self.related.clone(),
            order: self.order,
            visible: self.visible,
            inline: self.inline,
            description_key: self.description_key.clone(),
            render_hint: self.render_hint.clone(),
            index: self.index,
            key: self.key,
        }
    }
}

impl Default for MemberBuilderState {
    fn default() -> Self {
        Self::new(Name::new(), MemberKind::Property, None)
    }
}

/// Insert a member builder and wire up its engine listeners
pub(crate) fn create_member(
    session: &mut BuildSession,
    name: Name,
    kind: MemberKind,
    container: Option<ContainerKind>,
) -> BuilderId {
    let id = session.insert(BuilderSlot::Member(MemberBuilderState::new(
        name, kind, container,
    )));

    // relation detection runs ahead of every other type listener
    session.subscribe_before(
        id,
        EventKind::TypeChanged,
        Rc::new(move |session, _event| detect_relation(session, id)),
    );
    session.subscribe(
        id,
        EventKind::ElementTypeChanged,
        Rc::new(move |session, _event| detect_relation(session, id)),
    );
    // replay: an element assigned before its container gets re-announced so
    // element listeners observe it under the final container kind
    session.subscribe(
        id,
        EventKind::TypeChanged,
        Rc::new(move |session, _event| {
            let replay = session
                .member_state(id)
                .map(|state| state.container.is_some() && state.element.is_some())
                .unwrap_or(false);
            if replay {
                session.publish(Event::ElementTypeChanged { builder: id }, id);
            }
            Ok(())
        }),
    );
    session.subscribe(
        id,
        EventKind::Built,
        Rc::new(move |session, _event| materialize_references(session, id)),
    );

    id
}

fn member_of<'s>(
    session: &'s mut BuildSession,
    id: BuilderId,
) -> Result<&'s mut MemberBuilderState, EventError> {
    session
        .member_state_mut(id)
        .ok_or_else(|| EventError::new(format!("builder {:?} is not a member builder", id)))
}

/// Recompute auto-detected relation info from the current type slots
fn detect_relation(session: &mut BuildSession, id: BuilderId) -> Result<(), EventError> {
    let state = member_of(session, id)?;
    if state.relation_explicit {
        return Ok(());
    }
    let detected = state
        .detection_type()
        .and_then(TypeRef::entity_name)
        .map(str::to_string);
    match detected {
        Some(entity) => {
            state.relation_kind = RelationKind::Concrete;
            state.related = Some(entity);
        }
        None => {
            state.relation_kind = RelationKind::None;
            state.related = None;
        }
    }
    Ok(())
}

/// Produce one overlay per requested qualifier detail
fn materialize_references(session: &mut BuildSession, id: BuilderId) -> Result<(), EventError> {
    let state = member_of(session, id)?;
    let descriptor = state
        .built
        .clone()
        .ok_or_else(|| EventError::new(format!("builder {:?} announced Built unbuilt", id)))?;
    state.references = state
        .details
        .iter()
        .map(|(qualifier, detail)| {
            let reference = MemberReference::new(
                qualifier.clone(),
                BaseMember::Leaf(Arc::clone(&descriptor)),
                detail.clone(),
            );
            (qualifier.clone(), Arc::new(reference))
        })
        .collect();
    Ok(())
}

/// Build the canonical descriptor, memoized per builder
pub(crate) fn build_member(session: &mut BuildSession, id: BuilderId) -> Arc<MemberDescriptor> {
    if let Some(existing) = session.member_state(id).and_then(|state| state.built.clone()) {
        return existing;
    }
    let descriptor = Arc::new(match session.member_state(id) {
        Some(state) => state.to_descriptor(),
        None => MemberBuilderState::default().to_descriptor(),
    });
    if let Some(state) = session.member_state_mut(id) {
        state.built = Some(Arc::clone(&descriptor));
        debug!("member '{}' built", descriptor.name);
    }
    session.publish(Event::Built { builder: id }, id);
    descriptor
}

/// Fluent cursor over one member builder
///
/// Setters mutate the arena state first and publish their event afterwards,
/// so listeners never observe a stale value.
pub struct MemberBuilder<'s> {
    pub(crate) session: &'s mut BuildSession,
    pub(crate) id: BuilderId,
}

impl<'s> MemberBuilder<'s> {
    pub fn id(&self) -> BuilderId {
        self.id
    }

    /// Bind the declared value type
    pub fn typed(self, value_type: impl Into<TypeRef>) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.value_type = Some(value_type.into());
            self.session
                .publish(Event::TypeChanged { builder: self.id }, self.id);
        }
        self
    }

    /// Bind or change the container kind, making this member a collection
    pub fn container(self, container: ContainerKind) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.container = Some(container);
            self.session
                .publish(Event::TypeChanged { builder: self.id }, self.id);
        }
        self
    }

    /// Bind the collection element type
    pub fn element(self, element: impl Into<TypeRef>) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.element = Some(element.into());
            self.session
                .publish(Event::ElementTypeChanged { builder: self.id }, self.id);
        }
        self
    }

    pub fn cardinality(self, cardinality: Cardinality) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.cardinality = cardinality;
        }
        self
    }

    pub fn required(self) -> Self {
        self.cardinality(Cardinality::Required)
    }

    pub fn nullable(self) -> Self {
        self.cardinality(Cardinality::Nullable)
    }

    /// Mark this member a concrete relation to the named entity
    pub fn related(self, entity: impl Into<Name>) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.relation_kind = RelationKind::Concrete;
            state.related = Some(entity.into());
            state.relation_explicit = true;
        }
        self
    }

    /// Mark this member a by-key relation to the named entity
    pub fn related_by_reference(self, entity: impl Into<Name>) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.relation_kind = RelationKind::Reference;
            state.related = Some(entity.into());
            state.relation_explicit = true;
        }
        self
    }

    /// Clear relation info and pin it off, detection included
    pub fn unrelated(self) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.relation_kind = RelationKind::None;
            state.related = None;
            state.relation_explicit = true;
        }
        self
    }

    pub fn order(self, order: i32) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.order = Some(order);
        }
        self
    }

    pub fn visible(self, visible: bool) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.visible = visible;
        }
        self
    }

    pub fn hidden(self) -> Self {
        self.visible(false)
    }

    pub fn inline(self, inline: bool) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.inline = inline;
        }
        self
    }

    pub fn description_key(self, key: impl Into<String>) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.description_key = Some(key.into());
        }
        self
    }

    pub fn render_hint(self, hint: impl Into<String>) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.render_hint = Some(hint.into());
        }
        self
    }

    /// Explicit signature position, for parameters
    pub fn index(self, index: u32) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.index = Some(index);
        }
        self
    }

    /// Mark this property as its entity's key
    pub fn key(self) -> Self {
        if let Some(state) = self.session.member_state_mut(self.id) {
            state.key = true;
        }
        self
    }

    /// Request the override slot for a qualifier and edit it in place
    ///
    /// Requesting a detail registers the qualifier with the session, even
    /// when the closure leaves every field unset.
    pub fn detail(
        self,
        qualifier: impl Into<Qualifier>,
        configure: impl FnOnce(MemberDetail) -> MemberDetail,
    ) -> Self {
        let qualifier = qualifier.into();
        self.session.register_qualifier(&qualifier);
        if let Some(state) = self.session.member_state_mut(self.id) {
            let position = state.details.iter().position(|(q, _)| *q == qualifier);
            let current = match position {
                Some(i) => state.details[i].1.clone(),
                None => MemberDetail::default(),
            };
            let updated = configure(current);
            match position {
                Some(i) => state.details[i].1 = updated,
                None => state.details.push((qualifier, updated)),
            }
        }
        self
    }

    /// Construct the canonical descriptor, once
    ///
    /// Subsequent calls return the same `Arc`. Publishes `Built` on first
    /// construction.
    pub fn build(self) -> Arc<MemberDescriptor> {
        build_member(self.session, self.id)
    }
}

impl BuildSession {
    /// Start a property builder
    pub fn property(&mut self, name: impl Into<Name>) -> MemberBuilder<'_> {
        let id = create_member(self, name.into(), MemberKind::Property, None);
        MemberBuilder { session: self, id }
    }

    /// Start a collection-property builder (container defaults to a list)
    pub fn collection_property(&mut self, name: impl Into<Name>) -> MemberBuilder<'_> {
        let id = create_member(
            self,
            name.into(),
            MemberKind::Property,
            Some(ContainerKind::default()),
        );
        MemberBuilder { session: self, id }
    }

    /// Start a parameter builder
    pub fn parameter(&mut self, name: impl Into<Name>) -> MemberBuilder<'_> {
        let id = create_member(self, name.into(), MemberKind::Parameter, None);
        MemberBuilder { session: self, id }
    }

    /// Start a collection-parameter builder (container defaults to a list)
    pub fn collection_parameter(&mut self, name: impl Into<Name>) -> MemberBuilder<'_> {
        let id = create_member(
            self,
            name.into(),
            MemberKind::Parameter,
            Some(ContainerKind::default()),
        );
        MemberBuilder { session: self, id }
    }

    /// Re-enter a member builder by id
    pub fn member_builder(&mut self, id: BuilderId) -> Option<MemberBuilder<'_>> {
        self.member_state(id)?;
        Some(MemberBuilder { session: self, id })
    }
}
