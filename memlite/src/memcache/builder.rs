use crate::cache::cache::Cache;
use crate::memory_store::in_memory_store::{InMemoryStore, InMemoryStoreConfig};
use crate::memory_store::memory_usage::MemoryUsage;
use crate::server::timer;
use std::sync::Arc;

pub struct MemcacheStoreBuilder {}

impl MemcacheStoreBuilder {
    pub fn from_config(
        config: InMemoryStoreConfig,
        timer: Arc<dyn timer::Timer + Send + Sync>,
        memory: Arc<dyn MemoryUsage + Send + Sync>,
    ) -> Arc<dyn Cache + Send + Sync> {
        let store = Arc::new(InMemoryStore::new(timer, memory, config));
        info!("Store engine: {}", store.name());
        store
    }
}
