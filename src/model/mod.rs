pub mod capability;
pub mod common;
pub mod detail;
pub mod entity;
pub mod member;
pub mod operation;
pub mod reference;
pub mod value;

pub use capability::{
    Adaptable, Capability, Facet, KeyedEntityFacet, PresentationFacet, QualifierViewFacet,
    RelationFacet,
};
pub use common::{
    Cardinality, ContainerKind, DescriptorKind, MemberKind, Name, Qualifier, RelationKind,
    ScalarType, TypeRef,
};
pub use detail::{EntityDetail, MemberDetail};
pub use entity::{EntityDescriptor, MemberLayout, MemberView, QualifierPartition};
pub use member::{CollectionDescriptor, MemberDescriptor, MemberInfo};
pub use operation::OperationDescriptor;
pub use reference::{BaseMember, EntityReference, MemberReference};
pub use value::{is_assignable, set_value, value_of, ValueError};
