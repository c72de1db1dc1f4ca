use chrono::DateTime;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::model::{
    Cardinality, ContainerKind, EntityDescriptor, MemberDescriptor, RelationKind, ScalarType,
    TypeRef,
};

/// Errors from the record value surface
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("entity '{entity}' has no member named '{member}'")]
    UnknownMember { entity: String, member: String },

    #[error("member '{member}' is an operation and holds no value")]
    OperationMember { member: String },

    #[error("member '{member}' expects {expected}, got {actual}")]
    TypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    #[error("member '{member}' is required and cannot be null")]
    NullRequired { member: String },

    #[error("set member '{member}' contains duplicate elements")]
    DuplicateElement { member: String },
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn scalar_matches(scalar: ScalarType, value: &Value) -> bool {
    match scalar {
        ScalarType::Text => value.is_string(),
        ScalarType::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
        ScalarType::Decimal => value.is_number(),
        ScalarType::Boolean => value.is_boolean(),
        ScalarType::Timestamp => value
            .as_str()
            .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
            .unwrap_or(false),
        ScalarType::Json => true,
    }
}

/// Concrete relations carry the record embedded, reference relations carry
/// the related record's key string
fn entity_value_matches(relation: RelationKind, value: &Value) -> bool {
    match relation {
        RelationKind::Concrete => value.is_object(),
        RelationKind::Reference => value.is_string(),
        RelationKind::None => value.is_object() || value.is_string(),
    }
}

fn type_matches(type_ref: &TypeRef, relation: RelationKind, value: &Value) -> bool {
    match type_ref {
        TypeRef::Scalar(scalar) => scalar_matches(*scalar, value),
        TypeRef::Entity(_) => entity_value_matches(relation, value),
        TypeRef::Container(_) => value.is_array(),
    }
}

impl MemberDescriptor {
    /// Check a candidate value against this member's declared type
    pub fn check_assignable(&self, value: &Value) -> Result<(), ValueError> {
        if value.is_null() {
            return match self.cardinality {
                Cardinality::Nullable => Ok(()),
                Cardinality::Required => Err(ValueError::NullRequired {
                    member: self.name.clone(),
                }),
            };
        }

        if let Some(collection) = &self.collection {
            let Value::Array(elements) = value else {
                return Err(ValueError::TypeMismatch {
                    member: self.name.clone(),
                    expected: TypeRef::Container(collection.container).to_string(),
                    actual: json_type_name(value).to_string(),
                });
            };
            if let Some(element_type) = &collection.element {
                for element in elements {
                    if !type_matches(element_type, self.relation_kind, element) {
                        return Err(ValueError::TypeMismatch {
                            member: self.name.clone(),
                            expected: element_type.to_string(),
                            actual: json_type_name(element).to_string(),
                        });
                    }
                }
            }
            if collection.container == ContainerKind::Set {
                // quadratic, collections validated here are small
                for (i, element) in elements.iter().enumerate() {
                    if elements.iter().skip(i + 1).any(|other| other == element) {
                        return Err(ValueError::DuplicateElement {
                            member: self.name.clone(),
                        });
                    }
                }
            }
            return Ok(());
        }

        if let Some(value_type) = &self.value_type {
            if !type_matches(value_type, self.relation_kind, value) {
                return Err(ValueError::TypeMismatch {
                    member: self.name.clone(),
                    expected: value_type.to_string(),
                    actual: json_type_name(value).to_string(),
                });
            }
        }
        // untyped members accept anything
        Ok(())
    }

    /// True when the value could be stored under this member
    pub fn is_assignable(&self, value: &Value) -> bool {
        self.check_assignable(value).is_ok()
    }

    /// Read this member's value from a record, `None` when absent
    pub fn value_of<'r>(&self, record: &'r Map<String, Value>) -> Option<&'r Value> {
        record.get(&self.name)
    }

    /// Write this member's value into a record after checking assignability
    pub fn set_value(
        &self,
        record: &mut Map<String, Value>,
        value: Value,
    ) -> Result<(), ValueError> {
        self.check_assignable(&value)?;
        record.insert(self.name.clone(), value);
        Ok(())
    }
}

fn resolve_member<'e>(
    entity: &'e EntityDescriptor,
    member: &str,
) -> Result<&'e Arc<MemberDescriptor>, ValueError> {
    if let Some(descriptor) = entity.property(member) {
        return Ok(descriptor);
    }
    if entity.operation(member).is_some() {
        return Err(ValueError::OperationMember {
            member: member.to_string(),
        });
    }
    Err(ValueError::UnknownMember {
        entity: entity.name.clone(),
        member: member.to_string(),
    })
}

/// Read a member's value from a record by entity and member name
///
/// `Ok(None)` when the member exists but the record holds no entry for it.
pub fn value_of<'r>(
    entity: &EntityDescriptor,
    record: &'r Map<String, Value>,
    member: &str,
) -> Result<Option<&'r Value>, ValueError> {
    Ok(resolve_member(entity, member)?.value_of(record))
}

/// Write a member's value into a record by entity and member name
pub fn set_value(
    entity: &EntityDescriptor,
    record: &mut Map<String, Value>,
    member: &str,
    value: Value,
) -> Result<(), ValueError> {
    resolve_member(entity, member)?.set_value(record, value)
}

/// True when the value could be stored under the named member
pub fn is_assignable(entity: &EntityDescriptor, member: &str, value: &Value) -> bool {
    resolve_member(entity, member)
        .map(|descriptor| descriptor.is_assignable(value))
        .unwrap_or(false)
}
