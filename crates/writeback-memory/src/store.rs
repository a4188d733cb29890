use async_trait::async_trait;
use std::collections::HashMap;
use writeback_core::{Resource, WritebackConfig};
use writeback_runtime::ResourceStore;

/// Resources held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceStore {
    resources: HashMap<u64, Resource>,
}

impl MemoryResourceStore {
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self {
            resources: resources.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    pub fn from_config(config: &WritebackConfig) -> Self {
        Self::new(config.resources.iter().map(|r| r.to_resource()))
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn find_resource(&self, id: u64) -> anyhow::Result<Option<Resource>> {
        Ok(self.resources.get(&id).cloned())
    }
}
