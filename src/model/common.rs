use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical name of an entity, member, or operation within a model
pub type Name = String;

/// Whether a value may be absent (`Nullable`) or must be present (`Required`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    Required,
    Nullable,
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::Nullable
    }
}

/// How a member relates to another modeled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// The member does not point at a modeled entity
    None,
    /// The related entity is embedded in place
    Concrete,
    /// The related entity is referenced by its key
    Reference,
}

impl Default for RelationKind {
    fn default() -> Self {
        RelationKind::None
    }
}

/// Primitive value types a member can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ScalarType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
    Json,
}

/// Container shape of a collection member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    List,
    Set,
}

impl Default for ContainerKind {
    fn default() -> Self {
        ContainerKind::List
    }
}

/// Declared type of a member slot
///
/// An `Entity` type names another modeled entity and marks the member as a
/// relation candidate; `Container` is the declared type of a collection
/// member whose element type lives in its own slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Scalar(ScalarType),
    Entity(Name),
    Container(ContainerKind),
}

impl TypeRef {
    /// Shorthand for a reference to a named entity type
    pub fn entity(name: impl Into<Name>) -> Self {
        TypeRef::Entity(name.into())
    }

    pub fn entity_name(&self) -> Option<&str> {
        match self {
            TypeRef::Entity(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, TypeRef::Entity(_))
    }
}

impl From<ScalarType> for TypeRef {
    fn from(scalar: ScalarType) -> Self {
        TypeRef::Scalar(scalar)
    }
}

impl From<ContainerKind> for TypeRef {
    fn from(container: ContainerKind) -> Self {
        TypeRef::Container(container)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(s) => write!(f, "{:?}", s),
            TypeRef::Entity(name) => write!(f, "entity:{}", name),
            TypeRef::Container(ContainerKind::List) => write!(f, "list"),
            TypeRef::Container(ContainerKind::Set) => write!(f, "set"),
        }
    }
}

/// Role of a leaf member within its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Property,
    Parameter,
    Result,
}

/// Concrete descriptor kind, for display and serialized output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptorKind {
    Entity,
    Property,
    CollectionProperty,
    Operation,
    Parameter,
    CollectionParameter,
    Result,
    CollectionResult,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DescriptorKind::Entity => "entity",
            DescriptorKind::Property => "property",
            DescriptorKind::CollectionProperty => "collection-property",
            DescriptorKind::Operation => "operation",
            DescriptorKind::Parameter => "parameter",
            DescriptorKind::CollectionParameter => "collection-parameter",
            DescriptorKind::Result => "result",
            DescriptorKind::CollectionResult => "collection-result",
        };
        write!(f, "{}", label)
    }
}

/// Opaque tag naming a consumer-specific view of the model
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qualifier(String);

impl Qualifier {
    pub fn new(name: impl Into<String>) -> Self {
        Qualifier(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Qualifier {
    fn from(name: &str) -> Self {
        Qualifier(name.to_string())
    }
}

impl From<String> for Qualifier {
    fn from(name: String) -> Self {
        Qualifier(name)
    }
}
