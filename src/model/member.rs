use serde::Serialize;

use crate::model::{
    Cardinality, ContainerKind, DescriptorKind, MemberKind, Name, RelationKind, TypeRef,
};

/// Read surface shared by every member-shaped descriptor: base members,
/// qualifier overlays, and operations alike. The ordering pass and the
/// presentation layer only ever talk to this trait.
pub trait MemberInfo {
    fn name(&self) -> &str;
    fn descriptor_kind(&self) -> DescriptorKind;
    fn order(&self) -> Option<i32>;
    fn is_visible(&self) -> bool;
    fn is_inline(&self) -> bool;
    fn description_key(&self) -> Option<&str>;
    fn render_hint(&self) -> Option<&str>;
    fn relation_kind(&self) -> RelationKind;
    fn related_name(&self) -> Option<&str>;

    fn is_relation(&self) -> bool {
        self.relation_kind() != RelationKind::None
    }
}

/// Collection slot of a collection member: the declared container plus the
/// independently assigned element type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionDescriptor {
    pub container: ContainerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<TypeRef>,
}

/// Immutable descriptor of a property, parameter, or result
///
/// One struct covers all leaf roles; `kind` plus the optional collection slot
/// distinguish the six concrete descriptor kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDescriptor {
    pub name: Name,
    pub kind: MemberKind,
    /// Declared value type (None when the builder never bound a type)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<TypeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionDescriptor>,
    pub cardinality: Cardinality,
    pub relation_kind: RelationKind,
    /// Name of the related entity when this member is a relation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Name>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    pub visible: bool,
    pub inline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_hint: Option<String>,
    /// Signature position for parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// True for the property selected as the entity key
    pub key: bool,
}

impl MemberDescriptor {
    pub fn is_collection(&self) -> bool {
        self.collection.is_some()
    }

    /// Element type of a collection member
    pub fn element_type(&self) -> Option<&TypeRef> {
        self.collection.as_ref().and_then(|c| c.element.as_ref())
    }

    /// The type relation detection looks at: the element type for
    /// collections, the declared type otherwise
    pub fn effective_type(&self) -> Option<&TypeRef> {
        if self.collection.is_some() {
            self.element_type()
        } else {
            self.value_type.as_ref()
        }
    }
}

impl MemberInfo for MemberDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor_kind(&self) -> DescriptorKind {
        match (self.kind, self.collection.is_some()) {
            (MemberKind::Property, false) => DescriptorKind::Property,
            (MemberKind::Property, true) => DescriptorKind::CollectionProperty,
            (MemberKind::Parameter, false) => DescriptorKind::Parameter,
            (MemberKind::Parameter, true) => DescriptorKind::CollectionParameter,
            (MemberKind::Result, false) => DescriptorKind::Result,
            (MemberKind::Result, true) => DescriptorKind::CollectionResult,
        }
    }

    fn order(&self) -> Option<i32> {
        self.order
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn is_inline(&self) -> bool {
        self.inline
    }

    fn description_key(&self) -> Option<&str> {
        self.description_key.as_deref()
    }

    fn render_hint(&self) -> Option<&str> {
        self.render_hint.as_deref()
    }

    fn relation_kind(&self) -> RelationKind {
        self.relation_kind
    }

    fn related_name(&self) -> Option<&str> {
        self.related.as_deref()
    }
}
