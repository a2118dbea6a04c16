#[macro_use]
extern crate log;

pub mod cache;
pub mod memcache;
pub mod memcache_server;
pub mod memory_store;
pub mod protocol;
pub mod server;
pub mod version;

#[cfg(test)]
mod mock;
