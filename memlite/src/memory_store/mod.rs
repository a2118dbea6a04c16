pub mod in_memory_store;
pub mod memory_usage;
pub mod ordered_records;
