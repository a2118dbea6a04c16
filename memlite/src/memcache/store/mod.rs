use bytes::{Bytes, BytesMut};

use crate::cache::cache::{Cache, KeyType as CacheKeyType, Record as CacheRecord};
use crate::cache::error::{CacheError, Result};
use crate::server::timer;

use std::str;
use std::sync::Arc;

pub type Record = CacheRecord;
pub type KeyType = CacheKeyType;

/// Outcome of a conditional storage command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetStatus {
    Stored,
    NotStored,
    /// cas token mismatch
    Exists,
    NotFound,
}

pub type DeltaResultValueType = u64;

/**
 * Implements Memcache commands based
 * on the capability store
 */
pub struct MemcStore {
    store: Arc<dyn Cache + Send + Sync>,
    timer: Arc<dyn timer::Timer + Send + Sync>,
}

impl MemcStore {
    pub fn new(
        store: Arc<dyn Cache + Send + Sync>,
        timer: Arc<dyn timer::Timer + Send + Sync>,
    ) -> MemcStore {
        MemcStore { store, timer }
    }

    /// Builds a record expiring relative to the store clock
    pub fn create_record(&self, value: Bytes, exptime: i64, flags: u32) -> Record {
        Record::new(value, exptime, flags, self.timer.timestamp())
    }

    pub fn set(&self, key: KeyType, record: Record) -> Result<()> {
        self.store.set(key, record)
    }

    pub fn get(&self, key: &KeyType) -> Result<Option<Record>> {
        self.store.get(key)
    }

    /// Stores only if the key is not present, expired but not yet purged
    /// records count as present
    pub fn add(&self, key: KeyType, record: Record) -> Result<SetStatus> {
        if self.store.have(&key)? {
            return Ok(SetStatus::NotStored);
        }
        self.store.set(key, record)?;
        Ok(SetStatus::Stored)
    }

    pub fn replace(&self, key: KeyType, record: Record) -> Result<SetStatus> {
        if !self.store.have(&key)? {
            return Ok(SetStatus::NotStored);
        }
        self.store.set(key, record)?;
        Ok(SetStatus::Stored)
    }

    pub fn cas(&self, key: KeyType, record: Record, cas_unique: u64) -> Result<SetStatus> {
        match self.store.get(&key)? {
            None => Ok(SetStatus::NotFound),
            Some(current) if current.cas() != cas_unique => Ok(SetStatus::Exists),
            Some(_) => {
                self.store.set(key, record)?;
                Ok(SetStatus::Stored)
            }
        }
    }

    pub fn append(&self, key: KeyType, data: Bytes) -> Result<SetStatus> {
        self.concat(key, data, false)
    }

    pub fn prepend(&self, key: KeyType, data: Bytes) -> Result<SetStatus> {
        self.concat(key, data, true)
    }

    fn concat(&self, key: KeyType, data: Bytes, prepend: bool) -> Result<SetStatus> {
        let mut record = match self.store.get(&key)? {
            Some(record) => record,
            None => return Ok(SetStatus::NotFound),
        };
        let mut value = BytesMut::with_capacity(record.len() + data.len());
        if prepend {
            value.extend_from_slice(&data);
            value.extend_from_slice(record.value());
        } else {
            value.extend_from_slice(record.value());
            value.extend_from_slice(&data);
        }
        record.update_value(value.freeze());
        self.store.set(key, record)?;
        Ok(SetStatus::Stored)
    }

    /// Returns false if the key is missing or expired
    pub fn touch(&self, key: KeyType, exptime: i64) -> Result<bool> {
        let mut record = match self.store.get(&key)? {
            Some(record) => record,
            None => return Ok(false),
        };
        record.touch(exptime, self.timer.timestamp());
        self.store.set(key, record)?;
        Ok(true)
    }

    pub fn increment(&self, key: KeyType, delta: u64) -> Result<Option<DeltaResultValueType>> {
        self.add_delta(key, delta, true)
    }

    pub fn decrement(&self, key: KeyType, delta: u64) -> Result<Option<DeltaResultValueType>> {
        self.add_delta(key, delta, false)
    }

    fn add_delta(
        &self,
        key: KeyType,
        delta: u64,
        increment: bool,
    ) -> Result<Option<DeltaResultValueType>> {
        let mut record = match self.store.get(&key)? {
            Some(record) => record,
            None => return Ok(None),
        };
        let current = str::from_utf8(record.value())
            .map_err(|_err| CacheError::invalid_integer())
            .and_then(|value| {
                value
                    .parse::<u64>()
                    .map_err(|_err| CacheError::invalid_integer())
            })?;
        let value = if increment {
            current.wrapping_add(delta)
        } else {
            current.saturating_sub(delta)
        };
        record.update_value(Bytes::from(value.to_string()));
        self.store.set(key, record)?;
        Ok(Some(value))
    }

    pub fn delete(&self, key: &KeyType) -> Result<bool> {
        self.store.delete(key)
    }

    pub fn flush(&self) -> Result<()> {
        self.store.clear()
    }

    pub fn run_pending_tasks(&self) {
        self.store.run_pending_tasks()
    }

    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn total_items(&self) -> u64 {
        self.store.total_items()
    }
}
