use async_trait::async_trait;
use writeback_core::Resource;

/// Read access to the host's persisted resources.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Load a resource by id; `Ok(None)` when it does not exist.
    async fn find_resource(&self, id: u64) -> anyhow::Result<Option<Resource>>;
}
