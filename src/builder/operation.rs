use itertools::Itertools;
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::builder::bus::{Event, EventError, EventKind};
use crate::builder::context::{BuildError, BuildSession, BuilderId, BuilderSlot};
use crate::builder::member::{build_member, create_member, MemberBuilder};
use crate::model::{
    BaseMember, ContainerKind, MemberDetail, MemberKind, MemberReference, Name,
    OperationDescriptor, Qualifier, TypeRef,
};

/// Mutable accumulator for one operation, arena-allocated in the session
pub(crate) struct OperationBuilderState {
    pub(crate) name: Name,
    /// Parameter builders in registration order
    pub(crate) parameters: Vec<BuilderId>,
    /// The result builder, created together with the operation
    pub(crate) result: BuilderId,
    /// The entity this operation belongs to, if created through one
    pub(crate) owner: Option<BuilderId>,
    pub(crate) extensions: BTreeMap<String, Value>,
    pub(crate) order: Option<i32>,
    pub(crate) visible: bool,
    pub(crate) inline: bool,
    pub(crate) description_key: Option<String>,
    pub(crate) render_hint: Option<String>,
    /// Per-qualifier overrides, in request order
    pub(crate) details: Vec<(Qualifier, MemberDetail)>,
    pub(crate) built: Option<Arc<OperationDescriptor>>,
    /// One overlay per requested detail, materialized on `OperationBuilt`
    pub(crate) references: Vec<(Qualifier, Arc<MemberReference>)>,
}

impl OperationBuilderState {
    fn new(name: Name, result: BuilderId, owner: Option<BuilderId>) -> Self {
        Self {
            name,
            parameters: Vec::new(),
            result,
            owner,
            extensions: BTreeMap::new(),
            order: None,
            visible: true,
            inline: false,
            description_key: None,
            render_hint: None,
            details: Vec::new(),
            built: None,
            references: Vec::new(),
        }
    }
}

/// Insert an operation builder, its result builder, and the engine listeners
pub(crate) fn create_operation(
    session: &mut BuildSession,
    name: Name,
    owner: Option<BuilderId>,
) -> BuilderId {
    // the result member is created with the operation and carries its name
    let result = create_member(session, name.clone(), MemberKind::Result, None);
    let id = session.insert(BuilderSlot::Operation(OperationBuilderState::new(
        name, result, owner,
    )));

    // an unset collection-result element type defaults to the owning entity
    // once the operation announces itself
    session.subscribe(
        result,
        EventKind::OperationBuilt,
        Rc::new(move |session, event| default_result_element(session, event)),
    );
    session.subscribe(
        id,
        EventKind::OperationBuilt,
        Rc::new(move |session, _event| materialize_operation_references(session, id)),
    );

    id
}

fn operation_of<'s>(
    session: &'s mut BuildSession,
    id: BuilderId,
) -> Result<&'s mut OperationBuilderState, EventError> {
    session
        .operation_state_mut(id)
        .ok_or_else(|| EventError::new(format!("builder {:?} is not an operation builder", id)))
}

fn default_result_element(session: &mut BuildSession, event: &Event) -> Result<(), EventError> {
    let Event::OperationBuilt { operation } = event else {
        return Ok(());
    };
    let Some((result_id, owner)) = session
        .operation_state(*operation)
        .map(|state| (state.result, state.owner))
    else {
        return Ok(());
    };
    let Some(entity) = owner
        .and_then(|owner| session.entity_state(owner))
        .map(|state| state.name.clone())
    else {
        return Ok(());
    };
    let needs_default = session
        .member_state(result_id)
        .map(|state| state.container.is_some() && state.element.is_none())
        .unwrap_or(false);
    if needs_default {
        if let Some(state) = session.member_state_mut(result_id) {
            state.element = Some(TypeRef::Entity(entity));
        }
        session.publish(Event::ElementTypeChanged { builder: result_id }, result_id);
    }
    Ok(())
}

fn materialize_operation_references(
    session: &mut BuildSession,
    id: BuilderId,
) -> Result<(), EventError> {
    let state = operation_of(session, id)?;
    let descriptor = state
        .built
        .clone()
        .ok_or_else(|| EventError::new(format!("builder {:?} announced itself unbuilt", id)))?;
    state.references = state
        .details
        .iter()
        .map(|(qualifier, detail)| {
            let reference = MemberReference::new(
                qualifier.clone(),
                BaseMember::Operation(Arc::clone(&descriptor)),
                detail.clone(),
            );
            (qualifier.clone(), Arc::new(reference))
        })
        .collect();
    Ok(())
}

/// Validate, assemble, and memoize the operation descriptor
///
/// Name validation is the one failure that crosses this boundary; it is
/// raised directly, never through the bus.
pub(crate) fn build_operation(
    session: &mut BuildSession,
    id: BuilderId,
) -> Result<Arc<OperationDescriptor>, BuildError> {
    if let Some(existing) = session
        .operation_state(id)
        .and_then(|state| state.built.clone())
    {
        return Ok(existing);
    }

    let (name, result_id, parameter_ids) = match session.operation_state(id) {
        Some(state) => (state.name.clone(), state.result, state.parameters.clone()),
        None => (Name::new(), id, Vec::new()),
    };
    if !session.operation_pattern().is_match(&name) {
        return Err(BuildError::OperationName {
            name,
            pattern: session.operation_pattern().as_str().to_string(),
        });
    }

    // let the result builder recompute against the bound operation before
    // its descriptor is captured
    session.publish(Event::OperationBuilt { operation: id }, result_id);

    // explicit signature index wins; unset indices keep registration order
    // ahead of indexed ones
    let ordered: Vec<BuilderId> = parameter_ids
        .iter()
        .enumerate()
        .sorted_by_key(|(position, pid)| {
            let index = session.member_state(**pid).and_then(|state| state.index);
            (index, *position)
        })
        .map(|(_, pid)| *pid)
        .collect();
    let parameters = ordered
        .into_iter()
        .map(|pid| build_member(session, pid))
        .collect();
    let result = build_member(session, result_id);

    let descriptor = {
        let state = session.operation_state(id);
        Arc::new(OperationDescriptor {
            name,
            parameters,
            result,
            extensions: state
                .map(|s| s.extensions.clone())
                .unwrap_or_default(),
            order: state.and_then(|s| s.order),
            visible: state.map(|s| s.visible).unwrap_or(true),
            inline: state.map(|s| s.inline).unwrap_or(false),
            description_key: state.and_then(|s| s.description_key.clone()),
            render_hint: state.and_then(|s| s.render_hint.clone()),
        })
    };
    if let Some(state) = session.operation_state_mut(id) {
        state.built = Some(Arc::clone(&descriptor));
        debug!("operation '{}' built", descriptor.name);
    }
    session.publish(Event::OperationBuilt { operation: id }, id);
    Ok(descriptor)
}

/// Fluent cursor over one operation builder
pub struct OperationBuilder<'s> {
    pub(crate) session: &'s mut BuildSession,
    pub(crate) id: BuilderId,
}

impl<'s> OperationBuilder<'s> {
    pub fn id(&self) -> BuilderId {
        self.id
    }

    /// Add a parameter and configure it in place
    pub fn parameter(
        self,
        name: impl Into<Name>,
        configure: impl FnOnce(MemberBuilder) -> MemberBuilder,
    ) -> Self {
        let pid = create_member(self.session, name.into(), MemberKind::Parameter, None);
        if let Some(state) = self.session.operation_state_mut(self.id) {
            state.parameters.push(pid);
        }
        configure(MemberBuilder {
            session: &mut *self.session,
            id: pid,
        });
        self
    }

    /// Add a collection parameter and configure it in place
    pub fn collection_parameter(
        self,
        name: impl Into<Name>,
        configure: impl FnOnce(MemberBuilder) -> MemberBuilder,
    ) -> Self {
        let pid = create_member(
            self.session,
            name.into(),
            MemberKind::Parameter,
            Some(ContainerKind::default()),
        );
        if let Some(state) = self.session.operation_state_mut(self.id) {
            state.parameters.push(pid);
        }
        configure(MemberBuilder {
            session: &mut *self.session,
            id: pid,
        });
        self
    }

    /// Configure the result builder
    pub fn result(self, configure: impl FnOnce(MemberBuilder) -> MemberBuilder) -> Self {
        if let Some(rid) = self.session.operation_state(self.id).map(|s| s.result) {
            configure(MemberBuilder {
                session: &mut *self.session,
                id: rid,
            });
        }
        self
    }

    /// Turn the result into a collection and configure it
    pub fn collection_result(
        self,
        configure: impl FnOnce(MemberBuilder) -> MemberBuilder,
    ) -> Self {
        if let Some(rid) = self.session.operation_state(self.id).map(|s| s.result) {
            let cursor = MemberBuilder {
                session: &mut *self.session,
                id: rid,
            }
            .container(ContainerKind::default());
            configure(cursor);
        }
        self
    }

    /// Attach an extension value under a string key
    pub fn extension(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Some(state) = self.session.operation_state_mut(self.id) {
            state.extensions.insert(key.into(), value.into());
        }
        self
    }

    pub fn order(self, order: i32) -> Self {
        if let Some(state) = self.session.operation_state_mut(self.id) {
            state.order = Some(order);
        }
        self
    }

    pub fn visible(self, visible: bool) -> Self {
        if let Some(state) = self.session.operation_state_mut(self.id) {
            state.visible = visible;
        }
        self
    }

    pub fn hidden(self) -> Self {
        self.visible(false)
    }

    pub fn inline(self, inline: bool) -> Self {
        if let Some(state) = self.session.operation_state_mut(self.id) {
            state.inline = inline;
        }
        self
    }

    pub fn description_key(self, key: impl Into<String>) -> Self {
        if let Some(state) = self.session.operation_state_mut(self.id) {
            state.description_key = Some(key.into());
        }
        self
    }

    pub fn render_hint(self, hint: impl Into<String>) -> Self {
        if let Some(state) = self.session.operation_state_mut(self.id) {
            state.render_hint = Some(hint.into());
        }
        self
    }

    /// Request the override slot for a qualifier and edit it in place
    pub fn detail(
        self,
        qualifier: impl Into<Qualifier>,
        configure: impl FnOnce(MemberDetail) -> MemberDetail,
    ) -> Self {
        let qualifier = qualifier.into();
        self.session.register_qualifier(&qualifier);
        if let Some(state) = self.session.operation_state_mut(self.id) {
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

    /// Validate the name, assemble the descriptor, and memoize it
    pub fn build(self) -> Result<Arc<OperationDescriptor>, BuildError> {
        build_operation(self.session, self.id)
    }
}

impl BuildSession {
    /// Start an operation builder unattached to any entity
    pub fn operation(&mut self, name: impl Into<Name>) -> OperationBuilder<'_> {
        let id = create_operation(self, name.into(), None);
        OperationBuilder { session: self, id }
    }

    /// Re-enter an operation builder by id
    pub fn operation_builder(&mut self, id: BuilderId) -> Option<OperationBuilder<'_>> {
        self.operation_state(id)?;
        Some(OperationBuilder { session: self, id })
    }
}
