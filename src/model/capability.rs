use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::model::{
    BaseMember, EntityDescriptor, EntityReference, MemberDescriptor, MemberInfo, MemberReference,
    MemberView, OperationDescriptor, Qualifier, RelationKind,
};

/// Optional capabilities a descriptor may expose beyond its core surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Relation info: relation kind and the related entity's name
    Relation,
    /// Key property of an entity
    KeyedEntity,
    /// Qualifier-specific views of an entity
    QualifierView,
    /// Presentation hints: description key and render hint
    Presentation,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Relation => "relation",
            Capability::KeyedEntity => "keyed-entity",
            Capability::QualifierView => "qualifier-view",
            Capability::Presentation => "presentation",
        };
        write!(f, "{}", s)
    }
}

/// Relation info exposed by members that point at another entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationFacet<'a> {
    pub kind: RelationKind,
    pub related: Option<&'a str>,
}

/// Key property exposed by entities that marked one
#[derive(Debug, Clone, Copy)]
pub struct KeyedEntityFacet<'a> {
    pub key: &'a Arc<MemberDescriptor>,
}

impl KeyedEntityFacet<'_> {
    pub fn key_name(&self) -> &str {
        &self.key.name
    }
}

/// Qualifier-view access to a qualifier-aware receiver
///
/// Entity-level facets can enumerate the discovered qualifiers and open
/// views; member-level facets carry the selection marker only.
#[derive(Debug, Clone)]
pub struct QualifierViewFacet {
    entity: Option<Arc<EntityDescriptor>>,
    current: Option<Qualifier>,
}

impl QualifierViewFacet {
    /// The qualifier the receiver was selected under, `None` for base views
    pub fn current(&self) -> Option<&Qualifier> {
        self.current.as_ref()
    }

    /// Qualifiers the build discovered, in discovery order
    pub fn qualifiers(&self) -> Vec<Qualifier> {
        match &self.entity {
            Some(entity) => entity.qualifiers().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// A view of the entity under the given qualifier, for entity-level
    /// facets
    pub fn view(&self, qualifier: impl Into<Qualifier>) -> Option<EntityReference> {
        self.entity.as_ref().map(|entity| entity.reference(qualifier))
    }
}

/// Presentation hints resolved for the receiver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationFacet<'a> {
    pub description_key: Option<&'a str>,
    pub render_hint: Option<&'a str>,
}

/// A capability facet produced by [`Adaptable::adapt`]
#[derive(Debug, Clone)]
pub enum Facet<'a> {
    Relation(RelationFacet<'a>),
    KeyedEntity(KeyedEntityFacet<'a>),
    QualifierView(QualifierViewFacet),
    Presentation(PresentationFacet<'a>),
}

impl<'a> Facet<'a> {
    pub fn as_relation(&self) -> Option<&RelationFacet<'a>> {
        match self {
            Facet::Relation(facet) => Some(facet),
            _ => None,
        }
    }

    pub fn as_keyed_entity(&self) -> Option<&KeyedEntityFacet<'a>> {
        match self {
            Facet::KeyedEntity(facet) => Some(facet),
            _ => None,
        }
    }

    pub fn as_qualifier_view(&self) -> Option<&QualifierViewFacet> {
        match self {
            Facet::QualifierView(facet) => Some(facet),
            _ => None,
        }
    }

    pub fn as_presentation(&self) -> Option<&PresentationFacet<'a>> {
        match self {
            Facet::Presentation(facet) => Some(facet),
            _ => None,
        }
    }
}

/// Capability adaptation
///
/// `adapt` returns a facet when the receiver supports the capability and
/// `None` otherwise. `adaptable` answers the same question without
/// constructing the facet and is always consistent with `adapt`.
pub trait Adaptable {
    fn adapt(&self, capability: Capability) -> Option<Facet<'_>>;

    fn adaptable(&self, capability: Capability) -> bool {
        self.adapt(capability).is_some()
    }
}

fn member_facet<'a, M: MemberInfo>(member: &'a M, capability: Capability) -> Option<Facet<'a>> {
    match capability {
        Capability::Relation if member.is_relation() => Some(Facet::Relation(RelationFacet {
            kind: member.relation_kind(),
            related: member.related_name(),
        })),
        Capability::Presentation
            if member.description_key().is_some() || member.render_hint().is_some() =>
        {
            Some(Facet::Presentation(PresentationFacet {
                description_key: member.description_key(),
                render_hint: member.render_hint(),
            }))
        }
        _ => None,
    }
}

impl Adaptable for MemberDescriptor {
    fn adapt(&self, capability: Capability) -> Option<Facet<'_>> {
        member_facet(self, capability)
    }
}

impl Adaptable for OperationDescriptor {
    fn adapt(&self, capability: Capability) -> Option<Facet<'_>> {
        member_facet(self, capability)
    }
}

impl Adaptable for MemberReference {
    fn adapt(&self, capability: Capability) -> Option<Facet<'_>> {
        match capability {
            Capability::QualifierView => Some(Facet::QualifierView(QualifierViewFacet {
                entity: None,
                current: Some(self.qualifier().clone()),
            })),
            _ => member_facet(self, capability),
        }
    }
}

impl Adaptable for BaseMember {
    fn adapt(&self, capability: Capability) -> Option<Facet<'_>> {
        member_facet(self, capability)
    }
}

impl Adaptable for MemberView {
    fn adapt(&self, capability: Capability) -> Option<Facet<'_>> {
        match capability {
            Capability::QualifierView => Some(Facet::QualifierView(QualifierViewFacet {
                entity: None,
                current: self.qualifier().cloned(),
            })),
            _ => member_facet(self, capability),
        }
    }
}

impl Adaptable for Arc<EntityDescriptor> {
    fn adapt(&self, capability: Capability) -> Option<Facet<'_>> {
        match capability {
            Capability::KeyedEntity => self
                .key_property()
                .map(|key| Facet::KeyedEntity(KeyedEntityFacet { key })),
            Capability::QualifierView => Some(Facet::QualifierView(QualifierViewFacet {
                entity: Some(Arc::clone(self)),
                current: None,
            })),
            Capability::Presentation if !self.detail.is_empty() => {
                Some(Facet::Presentation(PresentationFacet {
                    description_key: self.detail.description_key.as_deref(),
                    render_hint: self.detail.render_hint.as_deref(),
                }))
            }
            _ => None,
        }
    }
}

impl Adaptable for EntityReference {
    fn adapt(&self, capability: Capability) -> Option<Facet<'_>> {
        match capability {
            Capability::KeyedEntity => self
                .key_property()
                .map(|key| Facet::KeyedEntity(KeyedEntityFacet { key })),
            Capability::QualifierView => Some(Facet::QualifierView(QualifierViewFacet {
                entity: Some(Arc::clone(self.base())),
                current: Some(self.qualifier().clone()),
            })),
            Capability::Presentation if !self.detail().is_empty() => {
                Some(Facet::Presentation(PresentationFacet {
                    description_key: self.description_key(),
                    render_hint: self.render_hint(),
                }))
            }
            _ => None,
        }
    }
}
