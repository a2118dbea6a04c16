use crate::cache::cache::Cache;
use crate::memcache::store::MemcStore;
use crate::memory_store::in_memory_store::{InMemoryStore, InMemoryStoreConfig};
use crate::memory_store::memory_usage::MemoryUsage;
use crate::server::timer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// 2023-11-14T22:13:20Z
pub const MOCK_START_TIME: u64 = 1_700_000_000_000;

pub struct MockSystemTimer {
    pub current_time: AtomicU64,
}

pub trait SetableTimer: timer::Timer {
    fn set(&self, time: u64);
    fn add_millis(&self, millis: u64);
    fn add_seconds(&self, seconds: u64) {
        self.add_millis(seconds * 1000);
    }
}

impl MockSystemTimer {
    pub fn new() -> Self {
        MockSystemTimer {
            current_time: AtomicU64::new(MOCK_START_TIME),
        }
    }
}

impl Default for MockSystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl timer::Timer for MockSystemTimer {
    fn timestamp(&self) -> u64 {
        self.current_time.load(Ordering::Relaxed)
    }
}

impl SetableTimer for MockSystemTimer {
    fn set(&self, time: u64) {
        self.current_time.store(time, Ordering::Relaxed)
    }

    fn add_millis(&self, millis: u64) {
        self.current_time.fetch_add(millis, Ordering::Release);
    }
}

/// Memory probe returning a configured usage, optionally shrinking
/// by a fixed amount on every read
#[derive(Default)]
pub struct MockMemoryUsage {
    usage: AtomicU64,
    release_per_read: AtomicU64,
}

impl MockMemoryUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_usage(&self, bytes: u64) {
        self.usage.store(bytes, Ordering::Relaxed);
    }

    pub fn set_release_per_read(&self, bytes: u64) {
        self.release_per_read.store(bytes, Ordering::Relaxed);
    }
}

impl MemoryUsage for MockMemoryUsage {
    fn resident_bytes(&self) -> u64 {
        let release = self.release_per_read.load(Ordering::Relaxed);
        let current = self.usage.load(Ordering::Relaxed);
        self.usage
            .store(current.saturating_sub(release), Ordering::Relaxed);
        current
    }
}

pub struct StoreWithMocks {
    pub timer: Arc<MockSystemTimer>,
    pub memory: Arc<MockMemoryUsage>,
    pub store: Arc<InMemoryStore>,
}

impl StoreWithMocks {
    pub fn as_cache(&self) -> Arc<dyn Cache + Send + Sync> {
        self.store.clone()
    }
}

pub fn create_store(config: InMemoryStoreConfig) -> StoreWithMocks {
    let timer = Arc::new(MockSystemTimer::new());
    let memory = Arc::new(MockMemoryUsage::new());
    let store = Arc::new(InMemoryStore::new(timer.clone(), memory.clone(), config));
    StoreWithMocks {
        timer,
        memory,
        store,
    }
}

pub struct MockServer {
    pub timer: Arc<MockSystemTimer>,
    pub memory: Arc<MockMemoryUsage>,
    pub store: Arc<InMemoryStore>,
    pub storage: Arc<MemcStore>,
}

pub fn create_server(config: InMemoryStoreConfig) -> MockServer {
    let StoreWithMocks {
        timer,
        memory,
        store,
    } = create_store(config);
    let storage = Arc::new(MemcStore::new(store.clone(), timer.clone()));
    MockServer {
        timer,
        memory,
        store,
        storage,
    }
}

pub fn create_default_server() -> MockServer {
    create_server(InMemoryStoreConfig::default())
}
