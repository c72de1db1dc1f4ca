use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{DescriptorKind, MemberDescriptor, MemberInfo, Name, RelationKind};

/// Immutable descriptor of an operation: a named callable with parameters
/// and exactly one result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescriptor {
    pub name: Name,
    /// Parameter descriptors in signature order
    pub parameters: Vec<Arc<MemberDescriptor>>,
    pub result: Arc<MemberDescriptor>,
    /// Extension payloads keyed by capability tag, consulted by downstream
    /// collaborators via `extension`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    pub visible: bool,
    pub inline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_hint: Option<String>,
}

impl OperationDescriptor {
    /// Find a parameter descriptor by name
    pub fn parameter(&self, name: &str) -> Option<&Arc<MemberDescriptor>> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Look up an extension payload by key
    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions.get(key)
    }
}

impl MemberInfo for OperationDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor_kind(&self) -> DescriptorKind {
        DescriptorKind::Operation
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
        RelationKind::None
    }

    fn related_name(&self) -> Option<&str> {
        None
    }
}
