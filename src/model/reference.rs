use serde::Serialize;
use std::sync::Arc;

use crate::model::{
    DescriptorKind, EntityDescriptor, EntityDetail, MemberDescriptor, MemberDetail, MemberInfo,
    MemberView, OperationDescriptor, Qualifier, RelationKind,
};

/// A base member as it appears in entity layouts: a leaf member or an
/// operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BaseMember {
    Leaf(Arc<MemberDescriptor>),
    Operation(Arc<OperationDescriptor>),
}

impl BaseMember {
    pub fn as_leaf(&self) -> Option<&Arc<MemberDescriptor>> {
        match self {
            BaseMember::Leaf(m) => Some(m),
            BaseMember::Operation(_) => None,
        }
    }

    pub fn as_operation(&self) -> Option<&Arc<OperationDescriptor>> {
        match self {
            BaseMember::Operation(op) => Some(op),
            BaseMember::Leaf(_) => None,
        }
    }
}

impl MemberInfo for BaseMember {
    fn name(&self) -> &str {
        match self {
            BaseMember::Leaf(m) => m.name(),
            BaseMember::Operation(op) => op.name(),
        }
    }

    fn descriptor_kind(&self) -> DescriptorKind {
        match self {
            BaseMember::Leaf(m) => m.descriptor_kind(),
            BaseMember::Operation(op) => op.descriptor_kind(),
        }
    }

    fn order(&self) -> Option<i32> {
        match self {
            BaseMember::Leaf(m) => m.order(),
            BaseMember::Operation(op) => op.order(),
        }
    }

    fn is_visible(&self) -> bool {
        match self {
            BaseMember::Leaf(m) => m.is_visible(),
            BaseMember::Operation(op) => op.is_visible(),
        }
    }

    fn is_inline(&self) -> bool {
        match self {
            BaseMember::Leaf(m) => m.is_inline(),
            BaseMember::Operation(op) => op.is_inline(),
        }
    }

    fn description_key(&self) -> Option<&str> {
        match self {
            BaseMember::Leaf(m) => m.description_key(),
            BaseMember::Operation(op) => op.description_key(),
        }
    }

    fn render_hint(&self) -> Option<&str> {
        match self {
            BaseMember::Leaf(m) => m.render_hint(),
            BaseMember::Operation(op) => op.render_hint(),
        }
    }

    fn relation_kind(&self) -> RelationKind {
        match self {
            BaseMember::Leaf(m) => m.relation_kind(),
            BaseMember::Operation(op) => op.relation_kind(),
        }
    }

    fn related_name(&self) -> Option<&str> {
        match self {
            BaseMember::Leaf(m) => m.related_name(),
            BaseMember::Operation(op) => op.related_name(),
        }
    }
}

/// Qualifier overlay over a base member
///
/// Overridable accessors consult the qualifier's detail first and fall back
/// to the base value when the detail field is unset. Structural attributes
/// (types, cardinality, relation info) always come from the base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberReference {
    pub qualifier: Qualifier,
    pub base: BaseMember,
    pub detail: MemberDetail,
}

impl MemberReference {
    pub fn new(qualifier: Qualifier, base: BaseMember, detail: MemberDetail) -> Self {
        Self {
            qualifier,
            base,
            detail,
        }
    }

    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    /// The wrapped base member
    pub fn base(&self) -> &BaseMember {
        &self.base
    }
}

impl MemberInfo for MemberReference {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn descriptor_kind(&self) -> DescriptorKind {
        self.base.descriptor_kind()
    }

    fn order(&self) -> Option<i32> {
        self.detail.order.or_else(|| self.base.order())
    }

    fn is_visible(&self) -> bool {
        self.detail.visible.unwrap_or_else(|| self.base.is_visible())
    }

    fn is_inline(&self) -> bool {
        self.detail.inline.unwrap_or_else(|| self.base.is_inline())
    }

    fn description_key(&self) -> Option<&str> {
        self.detail
            .description_key
            .as_deref()
            .or_else(|| self.base.description_key())
    }

    fn render_hint(&self) -> Option<&str> {
        self.detail
            .render_hint
            .as_deref()
            .or_else(|| self.base.render_hint())
    }

    fn relation_kind(&self) -> RelationKind {
        self.base.relation_kind()
    }

    fn related_name(&self) -> Option<&str> {
        self.base.related_name()
    }
}

/// Qualifier view over a built entity
///
/// A cheap handle combining the immutable entity descriptor with one
/// qualifier tag. Accessors read the qualifier's cached partition when the
/// build discovered that qualifier, and fall back to the base entity
/// otherwise (an unrecognized qualifier is never an error).
#[derive(Debug, Clone)]
pub struct EntityReference {
    base: Arc<EntityDescriptor>,
    qualifier: Qualifier,
}

impl EntityReference {
    pub fn new(base: Arc<EntityDescriptor>, qualifier: Qualifier) -> Self {
        Self { base, qualifier }
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    pub fn base(&self) -> &Arc<EntityDescriptor> {
        &self.base
    }

    /// True when the build discovered this qualifier and cached a partition
    pub fn is_recognized(&self) -> bool {
        self.base.partition(&self.qualifier).is_some()
    }

    /// Entity-level detail, resolved against the base at cache time
    pub fn detail(&self) -> &EntityDetail {
        match self.base.partition(&self.qualifier) {
            Some(partition) => &partition.detail,
            None => &self.base.detail,
        }
    }

    pub fn description_key(&self) -> Option<&str> {
        self.detail().description_key.as_deref()
    }

    pub fn render_hint(&self) -> Option<&str> {
        self.detail().render_hint.as_deref()
    }

    pub fn key_property(&self) -> Option<&Arc<MemberDescriptor>> {
        self.base.key_property()
    }

    /// Ordered, visibility-filtered property list under this qualifier
    pub fn ordered_properties(&self) -> &[MemberView] {
        match self.base.partition(&self.qualifier) {
            Some(partition) => &partition.layout.properties,
            None => &self.base.layout.properties,
        }
    }

    /// Ordered, visibility-filtered operation list under this qualifier
    pub fn ordered_operations(&self) -> &[MemberView] {
        match self.base.partition(&self.qualifier) {
            Some(partition) => &partition.layout.operations,
            None => &self.base.layout.operations,
        }
    }

    /// Ordered, visibility-filtered combined member list under this qualifier
    pub fn ordered_members(&self) -> &[MemberView] {
        match self.base.partition(&self.qualifier) {
            Some(partition) => &partition.layout.members,
            None => &self.base.layout.members,
        }
    }

    /// Look up a member by name, preferring this qualifier's overlay
    pub fn member(&self, name: &str) -> Option<MemberView> {
        if let Some(partition) = self.base.partition(&self.qualifier) {
            if let Some(reference) = partition.overlay(name) {
                return Some(MemberView::Overlay(Arc::clone(reference)));
            }
        }
        self.base.member(name).map(MemberView::Base)
    }
}
