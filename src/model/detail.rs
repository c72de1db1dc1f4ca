use serde::{Deserialize, Serialize};

/// Qualifier-specific override set for a member
///
/// Every field is optional: an unset field means "fall back to the base
/// descriptor's value". The same shape doubles as the base presentation
/// attributes accumulated by a builder before defaults are resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_hint: Option<String>,
}

impl MemberDetail {
    /// True when no field overrides the base descriptor
    pub fn is_empty(&self) -> bool {
        self.order.is_none()
            && self.visible.is_none()
            && self.inline.is_none()
            && self.description_key.is_none()
            && self.render_hint.is_none()
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn hidden(self) -> Self {
        self.with_visible(false)
    }

    pub fn with_inline(mut self, inline: bool) -> Self {
        self.inline = Some(inline);
        self
    }

    pub fn with_description_key(mut self, key: impl Into<String>) -> Self {
        self.description_key = Some(key.into());
        self
    }

    pub fn with_render_hint(mut self, hint: impl Into<String>) -> Self {
        self.render_hint = Some(hint.into());
        self
    }
}

/// Qualifier-specific override set for an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_hint: Option<String>,
}

impl EntityDetail {
    pub fn is_empty(&self) -> bool {
        self.description_key.is_none() && self.render_hint.is_none()
    }

    pub fn with_description_key(mut self, key: impl Into<String>) -> Self {
        self.description_key = Some(key.into());
        self
    }

    pub fn with_render_hint(mut self, hint: impl Into<String>) -> Self {
        self.render_hint = Some(hint.into());
        self
    }

    /// Resolve this detail against a base detail, field by field
    pub fn or_base(&self, base: &EntityDetail) -> EntityDetail {
        EntityDetail {
            description_key: self
                .description_key
                .clone()
                .or_else(|| base.description_key.clone()),
            render_hint: self.render_hint.clone().or_else(|| base.render_hint.clone()),
        }
    }
}
