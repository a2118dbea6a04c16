use super::error::Result;
use bytes::Bytes;

pub use super::record::{Record, ValueType};

/// Cache key type
pub type KeyType = Bytes;

// An abstraction over a key <=> record store
pub trait Cache {
    /// Store name reported in the logs
    fn name(&self) -> &'static str;

    /// Returns true if the key is present. Validity is not checked, a key
    /// that already expired but was not purged yet still counts.
    fn have(&self, key: &KeyType) -> Result<bool>;

    /// Returns the record associated with a key, `None` if the key is
    /// missing or its record expired. Never mutates the store.
    fn get(&self, key: &KeyType) -> Result<Option<Record>>;

    /// Inserts or overwrites a record and schedules a purge that will run
    /// on the next [`Cache::run_pending_tasks`] call.
    fn set(&self, key: KeyType, record: Record) -> Result<()>;

    /// Removes a key, returns true if it was present.
    /// An empty key is a client error.
    fn delete(&self, key: &KeyType) -> Result<bool>;

    /// Removes all records
    fn clear(&self) -> Result<()>;

    /// Runs work deferred by mutations (purge), if any was scheduled
    fn run_pending_tasks(&self);

    /// Number of entries, expired but not purged ones included
    fn size(&self) -> usize;

    fn total_items(&self) -> u64;
}
