//! Component directory collaborator: resolves component uuids to their
//! display data. An unknown uuid is not an error.

use super::store::StoreResult;
use crate::models::Component;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

#[async_trait]
pub trait ComponentDirectory: Send + Sync {
    /// Resolve the known components among `uuids`, keyed by uuid
    async fn find_by_uuids(&self, uuids: &[String]) -> StoreResult<HashMap<String, Component>>;

    async fn find_by_uuid(&self, uuid: &str) -> StoreResult<Option<Component>> {
        let mut found = self.find_by_uuids(&[uuid.to_string()]).await?;
        Ok(found.remove(uuid))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryComponentDirectory {
    components: DashMap<String, Component>,
}

impl InMemoryComponentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, component: Component) {
        self.components.insert(component.uuid.clone(), component);
    }
}

#[async_trait]
impl ComponentDirectory for InMemoryComponentDirectory {
    async fn find_by_uuids(&self, uuids: &[String]) -> StoreResult<HashMap<String, Component>> {
        Ok(uuids
            .iter()
            .filter_map(|uuid| {
                self.components
                    .get(uuid)
                    .map(|entry| (uuid.clone(), entry.value().clone()))
            })
            .collect())
    }
}
