use crate::cache::cache::{Cache, KeyType, Record};
use crate::cache::error::{CacheError, Result};
use crate::memory_store::memory_usage::MemoryUsage;
use crate::memory_store::ordered_records::OrderedRecords;
use crate::server::timer;
use std::sync::{Arc, Mutex, MutexGuard};

const BYTES_IN_MB: u64 = 1024 * 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InMemoryStoreConfig {
    pub(crate) max_records: Option<usize>,
    pub(crate) max_size_mb: Option<u64>,
}

impl InMemoryStoreConfig {
    pub fn new(max_records: Option<usize>, max_size_mb: Option<u64>) -> InMemoryStoreConfig {
        InMemoryStoreConfig {
            max_records,
            max_size_mb,
        }
    }

    pub fn max_records(&self) -> Option<usize> {
        self.max_records
    }

    pub fn max_size_mb(&self) -> Option<u64> {
        self.max_size_mb
    }

    /// True if purge may evict live entries
    pub fn evictions_enabled(&self) -> bool {
        self.max_records.is_some() || self.max_size_mb.is_some()
    }
}

#[derive(Default)]
struct StoreState {
    records: OrderedRecords,
    total_items: u64,
    purge_scheduled: bool,
}

/// Insertion ordered in-memory store with expiry and FIFO eviction.
///
/// Bounds are only enforced by [`InMemoryStore::purge`], between purges
/// the store may hold more entries or memory than configured.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    config: InMemoryStoreConfig,
    timer: Arc<dyn timer::Timer + Send + Sync>,
    memory: Arc<dyn MemoryUsage + Send + Sync>,
}

impl InMemoryStore {
    pub fn new(
        timer: Arc<dyn timer::Timer + Send + Sync>,
        memory: Arc<dyn MemoryUsage + Send + Sync>,
        config: InMemoryStoreConfig,
    ) -> InMemoryStore {
        info!(
            "Creating in-memory store, max records: {:?}, max size: {:?} MB",
            config.max_records, config.max_size_mb
        );
        InMemoryStore {
            state: Mutex::new(StoreState::default()),
            config,
            timer,
            memory,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_err| CacheError::ServerError(String::from("store state poisoned")))
    }

    // bookkeeping paths without a result to report
    fn lock_unchecked(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Removes expired records, then evicts the earliest inserted records
    /// until the record count and the process memory are within bounds.
    pub fn purge(&self) {
        let mut state = self.lock_unchecked();
        Self::purge_state(&mut state, &self.config, self.timer.timestamp(), &*self.memory);
    }

    fn purge_state(
        state: &mut StoreState,
        config: &InMemoryStoreConfig,
        now: u64,
        memory: &(dyn MemoryUsage + Send + Sync),
    ) {
        state.purge_scheduled = false;

        let expired = state.records.retain(|record| record.is_valid(now));
        state.total_items = state.total_items.saturating_sub(expired as u64);
        if expired > 0 {
            debug!("Purged {} expired records", expired);
        }

        if let Some(max_records) = config.max_records {
            let mut evicted: u64 = 0;
            while state.records.len() > max_records {
                if state.records.pop_oldest().is_none() {
                    break;
                }
                evicted += 1;
            }
            state.total_items = state.total_items.saturating_sub(evicted);
            if evicted > 0 {
                debug!("Evicted {} records, max records: {}", evicted, max_records);
            }
        }

        if let Some(max_size_mb) = config.max_size_mb {
            let limit = max_size_mb.saturating_mul(BYTES_IN_MB);
            let mut evicted: u64 = 0;
            while memory.resident_bytes() > limit {
                if state.records.pop_oldest().is_none() {
                    warn!("Memory usage above {} MB with an empty store", max_size_mb);
                    break;
                }
                evicted += 1;
            }
            state.total_items = state.total_items.saturating_sub(evicted);
            if evicted > 0 {
                debug!("Evicted {} records, max size: {} MB", evicted, max_size_mb);
            }
        }
    }
}

impl Cache for InMemoryStore {
    fn name(&self) -> &'static str {
        "InMemoryStore"
    }

    fn have(&self, key: &KeyType) -> Result<bool> {
        Ok(self.lock()?.records.contains_key(key))
    }

    fn get(&self, key: &KeyType) -> Result<Option<Record>> {
        let now = self.timer.timestamp();
        let state = self.lock()?;
        Ok(state
            .records
            .get(key)
            .filter(|record| record.is_valid(now))
            .cloned())
    }

    fn set(&self, key: KeyType, record: Record) -> Result<()> {
        let mut state = self.lock()?;
        state.records.insert(key, record);
        state.total_items += 1;
        state.purge_scheduled = true;
        Ok(())
    }

    fn delete(&self, key: &KeyType) -> Result<bool> {
        if key.is_empty() {
            return Err(CacheError::bad_command_line());
        }
        let mut state = self.lock()?;
        let removed = state.records.remove(key).is_some();
        if removed {
            state.total_items = state.total_items.saturating_sub(1);
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.records.clear();
        state.total_items = 0;
        Ok(())
    }

    fn run_pending_tasks(&self) {
        let mut state = self.lock_unchecked();
        if state.purge_scheduled {
            Self::purge_state(&mut state, &self.config, self.timer.timestamp(), &*self.memory);
        }
    }

    fn size(&self) -> usize {
        self.lock_unchecked().records.len()
    }

    fn total_items(&self) -> u64 {
        self.lock_unchecked().total_items
    }
}
