use crate::memcache;
use crate::memcache::cli::parser::MemliteConfig;
use crate::memcache::store::MemcStore;
use crate::memcache_server::memc_tcp::{MemcacheServerConfig, MemcacheTcpServer};
use crate::memcache_server::server_stats::ServerStats;
use crate::memory_store::in_memory_store::InMemoryStoreConfig;
use crate::memory_store::memory_usage::{MemoryUsage, ProcessMemory};
use crate::server::timer;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Builder;

fn get_worker_thread_name() -> String {
    static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
    let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
    format!("memlited-wrk-{}", id)
}

/// Single threaded event loop, every connection is a task on it
pub fn create_current_thread_runtime() -> io::Result<tokio::runtime::Runtime> {
    Builder::new_current_thread()
        .thread_name_fn(get_worker_thread_name)
        .enable_all()
        .build()
}

pub fn create_memlite_server(
    config: &MemliteConfig,
    system_timer: Arc<dyn timer::Timer + Send + Sync>,
) -> MemcacheTcpServer {
    let memory: Arc<dyn MemoryUsage + Send + Sync> = Arc::new(ProcessMemory::new());
    let store_config = InMemoryStoreConfig::new(config.max_records, config.max_size_mb);
    let store = memcache::builder::MemcacheStoreBuilder::from_config(
        store_config,
        system_timer.clone(),
        memory.clone(),
    );
    let storage = Arc::new(MemcStore::new(store, system_timer.clone()));
    let stats = Arc::new(ServerStats::new(
        system_timer,
        memory,
        store_config.max_size_mb(),
        store_config.evictions_enabled(),
    ));
    let server_config = MemcacheServerConfig::new(
        config.max_item_size as u32,
        config.listen_backlog,
        config.fast,
        !config.delay,
    );
    MemcacheTcpServer::new(server_config, storage, stats)
}
