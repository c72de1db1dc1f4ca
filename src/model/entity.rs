use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::model::{
    BaseMember, DescriptorKind, EntityDetail, EntityReference, MemberDescriptor, MemberInfo,
    MemberReference, Name, OperationDescriptor, Qualifier, RelationKind,
};

/// Entry of an ordered member list: the base member itself, or the overlay
/// a qualifier substitutes for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MemberView {
    Base(BaseMember),
    Overlay(Arc<MemberReference>),
}

impl MemberView {
    /// The underlying base member, unwrapping an overlay if present
    pub fn base(&self) -> &BaseMember {
        match self {
            MemberView::Base(base) => base,
            MemberView::Overlay(reference) => reference.base(),
        }
    }

    pub fn is_overlay(&self) -> bool {
        matches!(self, MemberView::Overlay(_))
    }

    /// The qualifier that substituted this overlay, `None` for base entries
    pub fn qualifier(&self) -> Option<&Qualifier> {
        match self {
            MemberView::Base(_) => None,
            MemberView::Overlay(reference) => Some(reference.qualifier()),
        }
    }

    pub fn as_leaf(&self) -> Option<&Arc<MemberDescriptor>> {
        self.base().as_leaf()
    }

    pub fn as_operation(&self) -> Option<&Arc<OperationDescriptor>> {
        self.base().as_operation()
    }
}

impl MemberInfo for MemberView {
    fn name(&self) -> &str {
        match self {
            MemberView::Base(base) => base.name(),
            MemberView::Overlay(reference) => reference.name(),
        }
    }

    fn descriptor_kind(&self) -> DescriptorKind {
        match self {
            MemberView::Base(base) => base.descriptor_kind(),
            MemberView::Overlay(reference) => reference.descriptor_kind(),
        }
    }

    fn order(&self) -> Option<i32> {
        match self {
            MemberView::Base(base) => base.order(),
            MemberView::Overlay(reference) => reference.order(),
        }
    }

    fn is_visible(&self) -> bool {
        match self {
            MemberView::Base(base) => base.is_visible(),
            MemberView::Overlay(reference) => reference.is_visible(),
        }
    }

    fn is_inline(&self) -> bool {
        match self {
            MemberView::Base(base) => base.is_inline(),
            MemberView::Overlay(reference) => reference.is_inline(),
        }
    }

    fn description_key(&self) -> Option<&str> {
        match self {
            MemberView::Base(base) => base.description_key(),
            MemberView::Overlay(reference) => reference.description_key(),
        }
    }

    fn render_hint(&self) -> Option<&str> {
        match self {
            MemberView::Base(base) => base.render_hint(),
            MemberView::Overlay(reference) => reference.render_hint(),
        }
    }

    fn relation_kind(&self) -> RelationKind {
        match self {
            MemberView::Base(base) => base.relation_kind(),
            MemberView::Overlay(reference) => reference.relation_kind(),
        }
    }

    fn related_name(&self) -> Option<&str> {
        match self {
            MemberView::Base(base) => base.related_name(),
            MemberView::Overlay(reference) => reference.related_name(),
        }
    }
}

/// Ordered, visibility-filtered member lists cached at build time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberLayout {
    /// Leaf members that pass the visibility filter, in display order
    pub properties: Vec<MemberView>,
    /// Operations that pass the visibility filter, in display order
    pub operations: Vec<MemberView>,
    /// Properties and operations combined, in one display order
    pub members: Vec<MemberView>,
}

/// Cached view of one qualifier discovered during the build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifierPartition {
    pub qualifier: Qualifier,
    /// Entity-level detail, already resolved against the base entity
    pub detail: EntityDetail,
    /// Every overlay registered under this qualifier, keyed by member name
    pub overlays: Vec<Arc<MemberReference>>,
    /// Ordered lists with overlays substituted for their base members
    pub layout: MemberLayout,
}

impl QualifierPartition {
    /// Look up this qualifier's overlay for a member name
    pub fn overlay(&self, name: &str) -> Option<&Arc<MemberReference>> {
        self.overlays.iter().find(|r| r.name() == name)
    }
}

/// Immutable descriptor of one entity type
///
/// Produced exactly once per builder by the build pass. Everything a
/// consumer can ask for, including the ordered member lists and the
/// per-qualifier partitions, is computed at build time and embedded here.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDescriptor {
    pub name: Name,
    /// Name of the property that identifies instances, if one was marked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_property: Option<Name>,
    pub detail: EntityDetail,
    /// All leaf members in registration order, hidden ones included
    pub properties: Vec<Arc<MemberDescriptor>>,
    /// All operations in registration order, hidden ones included
    pub operations: Vec<Arc<OperationDescriptor>>,
    /// Base ordered lists (no qualifier)
    pub layout: MemberLayout,
    /// One partition per qualifier discovered during the build
    pub partitions: Vec<QualifierPartition>,
    /// When the build pass produced this descriptor
    pub built_at: DateTime<Utc>,
    /// Identifier of the build session that produced this descriptor
    pub session: Uuid,
    /// Content hash over the structural fields, stable across sessions
    pub fingerprint: String,
}

impl EntityDescriptor {
    pub fn descriptor_kind(&self) -> DescriptorKind {
        DescriptorKind::Entity
    }

    /// Look up a leaf member by name
    pub fn property(&self, name: &str) -> Option<&Arc<MemberDescriptor>> {
        self.properties.iter().find(|m| m.name == name)
    }

    /// Look up an operation by name
    pub fn operation(&self, name: &str) -> Option<&Arc<OperationDescriptor>> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Look up any member by name, leaf members first
    pub fn member(&self, name: &str) -> Option<BaseMember> {
        if let Some(m) = self.property(name) {
            return Some(BaseMember::Leaf(Arc::clone(m)));
        }
        self.operation(name)
            .map(|op| BaseMember::Operation(Arc::clone(op)))
    }

    /// The descriptor of the key property, if one was marked
    pub fn key_property(&self) -> Option<&Arc<MemberDescriptor>> {
        self.key_property
            .as_deref()
            .and_then(|name| self.property(name))
    }

    /// The cached partition for a qualifier, if the build discovered it
    pub fn partition(&self, qualifier: &Qualifier) -> Option<&QualifierPartition> {
        self.partitions.iter().find(|p| &p.qualifier == qualifier)
    }

    /// Qualifiers discovered during the build, in discovery order
    pub fn qualifiers(&self) -> impl Iterator<Item = &Qualifier> {
        self.partitions.iter().map(|p| &p.qualifier)
    }

    /// A view of this entity under one qualifier
    ///
    /// Total for any qualifier: unrecognized ones fall back to the base
    /// lists and detail.
    pub fn reference(self: &Arc<Self>, qualifier: impl Into<Qualifier>) -> EntityReference {
        EntityReference::new(Arc::clone(self), qualifier.into())
    }

    /// Content hash over the structural fields
    ///
    /// Build metadata (`built_at`, `session`) is excluded so two sessions
    /// building the same definitions produce the same fingerprint.
    pub(crate) fn compute_fingerprint(
        name: &str,
        key_property: Option<&str>,
        detail: &EntityDetail,
        properties: &[Arc<MemberDescriptor>],
        operations: &[Arc<OperationDescriptor>],
        layout: &MemberLayout,
        partitions: &[QualifierPartition],
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(key_property.unwrap_or_default().as_bytes());
        hasher.update(serde_json::to_string(detail).unwrap_or_default().as_bytes());
        hasher.update(
            serde_json::to_string(properties)
                .unwrap_or_default()
                .as_bytes(),
        );
        hasher.update(
            serde_json::to_string(operations)
                .unwrap_or_default()
                .as_bytes(),
        );
        hasher.update(serde_json::to_string(layout).unwrap_or_default().as_bytes());
        hasher.update(
            serde_json::to_string(partitions)
                .unwrap_or_default()
                .as_bytes(),
        );
        hex::encode(hasher.finalize())
    }
}
