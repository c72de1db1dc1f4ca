use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Adaptable, Capability, EntityDescriptor, Name};

/// Thread-safe registry of built entity descriptors by name
///
/// Descriptors are immutable once built, so readers share them freely; the
/// lock only guards the map itself.
#[derive(Default)]
pub struct ModelCatalog {
    entities: RwLock<HashMap<Name, Arc<EntityDescriptor>>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built entity under its name, replacing any previous build
    pub fn insert(&self, entity: Arc<EntityDescriptor>) {
        self.entities.write().insert(entity.name.clone(), entity);
    }

    pub fn entity(&self, name: &str) -> Option<Arc<EntityDescriptor>> {
        self.entities.read().get(name).cloned()
    }

    /// The named entity, only if it exposes a key property
    pub fn keyed(&self, name: &str) -> Option<Arc<EntityDescriptor>> {
        self.entity(name)
            .filter(|entity| entity.adaptable(Capability::KeyedEntity))
    }

    /// Registered entity names, sorted
    pub fn names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self.entities.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}
