use itertools::Itertools;
use log::debug;
use std::sync::Arc;

use crate::builder::bus::EventError;
use crate::builder::context::{BuildSession, BuilderId};
use crate::builder::member::build_member;
use crate::builder::operation::build_operation;
use crate::model::{
    BaseMember, MemberInfo, MemberLayout, MemberReference, MemberView, Qualifier,
    QualifierPartition,
};

/// Output of the pre-build caching pass, frozen into the entity descriptor
pub(crate) struct EntityCaches {
    pub(crate) layout: MemberLayout,
    pub(crate) partitions: Vec<QualifierPartition>,
}

struct MemberEntry {
    base: BaseMember,
    references: Vec<(Qualifier, Arc<MemberReference>)>,
}

/// A member makes the ordered lists when it is visible, or when it is an
/// inline relation
fn keep(view: &MemberView) -> bool {
    view.is_visible() || (view.is_relation() && view.is_inline())
}

/// Filter, then stable-sort by order; unset order sorts before every set
/// one, and ties keep registration order
fn ordered<'a>(views: impl Iterator<Item = &'a MemberView>) -> Vec<MemberView> {
    views
        .filter(|view| keep(view))
        .cloned()
        .sorted_by_key(|view| view.order())
        .collect()
}

fn layout_of(properties: &[MemberView], operations: &[MemberView]) -> MemberLayout {
    MemberLayout {
        properties: ordered(properties.iter()),
        operations: ordered(operations.iter()),
        members: ordered(properties.iter().chain(operations.iter())),
    }
}

/// Substitute each member present in the qualifier's overlay map
fn substituted(entries: &[MemberEntry], qualifier: &Qualifier) -> Vec<MemberView> {
    entries
        .iter()
        .map(|entry| {
            match entry
                .references
                .iter()
                .find(|(q, _)| q == qualifier)
                .map(|(_, reference)| reference)
            {
                Some(reference) => MemberView::Overlay(Arc::clone(reference)),
                None => MemberView::Base(entry.base.clone()),
            }
        })
        .collect()
}

fn overlays_of(entries: &[MemberEntry], qualifier: &Qualifier) -> Vec<Arc<MemberReference>> {
    entries
        .iter()
        .filter_map(|entry| {
            entry
                .references
                .iter()
                .find(|(q, _)| q == qualifier)
                .map(|(_, reference)| Arc::clone(reference))
        })
        .collect()
}

/// The pre-build caching pass
///
/// Runs as the entity's own `PreBuild` listener, exactly once per entity
/// build: recomputation requests while caches exist are no-ops. Builds every
/// composed member, merges their per-qualifier overlay maps, and freezes the
/// base layout plus one partition per discovered qualifier.
pub(crate) fn run_caching_pass(
    session: &mut BuildSession,
    entity: BuilderId,
) -> Result<(), EventError> {
    let (already_cached, property_ids, operation_ids) = {
        let state = session.entity_state(entity).ok_or_else(|| {
            EventError::new(format!("builder {:?} is not an entity builder", entity))
        })?;
        (
            state.caches.is_some(),
            state.properties.clone(),
            state.operations.clone(),
        )
    };
    if already_cached {
        return Ok(());
    }

    for pid in &property_ids {
        build_member(session, *pid);
    }
    for oid in &operation_ids {
        build_operation(session, *oid).map_err(|err| EventError::new(err.to_string()))?;
    }

    let mut property_entries = Vec::with_capacity(property_ids.len());
    for pid in &property_ids {
        if let Some(state) = session.member_state(*pid) {
            if let Some(descriptor) = &state.built {
                property_entries.push(MemberEntry {
                    base: BaseMember::Leaf(Arc::clone(descriptor)),
                    references: state.references.clone(),
                });
            }
        }
    }
    let mut operation_entries = Vec::with_capacity(operation_ids.len());
    for oid in &operation_ids {
        if let Some(state) = session.operation_state(*oid) {
            if let Some(descriptor) = &state.built {
                operation_entries.push(MemberEntry {
                    base: BaseMember::Operation(Arc::clone(descriptor)),
                    references: state.references.clone(),
                });
            }
        }
    }

    let base_properties: Vec<MemberView> = property_entries
        .iter()
        .map(|entry| MemberView::Base(entry.base.clone()))
        .collect();
    let base_operations: Vec<MemberView> = operation_entries
        .iter()
        .map(|entry| MemberView::Base(entry.base.clone()))
        .collect();
    let layout = layout_of(&base_properties, &base_operations);

    let base_detail = session
        .entity_state(entity)
        .map(|state| state.detail.clone())
        .unwrap_or_default();
    let qualifier_details = session
        .entity_state(entity)
        .map(|state| state.qualifier_details.clone())
        .unwrap_or_default();

    let mut partitions = Vec::new();
    for qualifier in session.qualifiers().to_vec() {
        let properties = substituted(&property_entries, &qualifier);
        let operations = substituted(&operation_entries, &qualifier);
        let detail = qualifier_details
            .iter()
            .find(|(q, _)| *q == qualifier)
            .map(|(_, detail)| detail.or_base(&base_detail))
            .unwrap_or_else(|| base_detail.clone());
        let mut overlays = overlays_of(&property_entries, &qualifier);
        overlays.extend(overlays_of(&operation_entries, &qualifier));
        partitions.push(QualifierPartition {
            qualifier,
            detail,
            overlays,
            layout: layout_of(&properties, &operations),
        });
    }

    if let Some(state) = session.entity_state_mut(entity) {
        debug!(
            "entity '{}' caches computed ({} partitions)",
            state.name,
            partitions.len()
        );
        state.caches = Some(EntityCaches { layout, partitions });
    }
    Ok(())
}
